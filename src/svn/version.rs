use crate::error::{Result, SvnError};
use crate::svn::executor::{CommandRunner, SvnCommand};

/// Minimum required svn version
const MIN_SVN_VERSION: (u32, u32) = (1, 7);

/// Represents an svn client version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SvnVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SvnVersion {
    /// Detect the installed svn version via `svn --version --quiet`
    pub fn detect<R: CommandRunner>(runner: &R) -> Result<Self> {
        let command = SvnCommand::svn("--version").arg("--quiet");
        let output = runner
            .run(&command)
            .map_err(|e| SvnError::SvnVersionDetectionFailed(e.to_string()))?;

        if !output.success {
            return Err(SvnError::SvnVersionDetectionFailed(
                "svn --version command failed".to_string(),
            ));
        }

        Self::parse(&output.stdout_lossy())
    }

    /// Parse a version string like "1.14.2" or "1.14.2 (r1899510)"
    pub fn parse(version_str: &str) -> Result<Self> {
        let version_nums = version_str.split_whitespace().next().ok_or_else(|| {
            SvnError::MalformedOutput(format!("Unexpected svn version format: {}", version_str))
        })?;

        let nums: Vec<&str> = version_nums.split('.').collect();
        if nums.len() < 2 {
            return Err(SvnError::MalformedOutput(format!(
                "Invalid version number format: {}",
                version_nums
            )));
        }

        let major = nums[0]
            .parse::<u32>()
            .map_err(|_| SvnError::MalformedOutput(format!("Invalid major version: {}", nums[0])))?;

        let minor = nums[1]
            .parse::<u32>()
            .map_err(|_| SvnError::MalformedOutput(format!("Invalid minor version: {}", nums[1])))?;

        // Patch may carry a suffix such as "-dev"
        let patch = nums
            .get(2)
            .map(|p| {
                let digits: String = p.chars().take_while(char::is_ascii_digit).collect();
                digits.parse::<u32>().unwrap_or(0)
            })
            .unwrap_or(0);

        Ok(SvnVersion {
            major,
            minor,
            patch,
        })
    }

    /// Check if this version meets minimum requirements
    pub fn is_supported(&self) -> bool {
        (self.major, self.minor) >= MIN_SVN_VERSION
    }

    /// Detect the version and reject clients that are too old
    pub fn validate<R: CommandRunner>(runner: &R) -> Result<Self> {
        let version = Self::detect(runner)?;

        if !version.is_supported() {
            return Err(SvnError::SvnVersionTooOld(version.to_string()));
        }

        Ok(version)
    }
}

impl std::fmt::Display for SvnVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
