use crate::error::{Result, SvnError};
use crate::security::{PathValidator, ValidationError};
use crate::svn::diff::{self, Diff};
use crate::svn::executor::{CommandOutput, CommandRunner, SvnCommand, SvnExecutor};
use crate::svn::parser::{self, LogEntry};
use crate::svn::revision::Revision;
use crate::svn::types::{Author, Commit, CommitMetadata, NodeKind, TreeResult, split_message};
use std::fmt;
use std::path::Path;
use tracing::{debug, instrument};

/// Name of the implicit mainline branch
pub const TRUNK: &str = "trunk";

/// Root URI of a repository, e.g. `file:///srv/svn/project`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryLocation(String);

impl RepositoryLocation {
    /// Location of a repository stored at an absolute filesystem path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_absolute() {
            return Err(ValidationError::RelativeLocation(path.display().to_string()).into());
        }

        let display = path.to_string_lossy();
        Ok(Self(format!("file://{}", display.trim_end_matches('/'))))
    }

    /// URL of `path` inside the repository
    pub fn url(&self, path: &str) -> String {
        if path.is_empty() || path.starts_with('/') {
            format!("{}{}", self.0, path)
        } else {
            format!("{}/{}", self.0, path)
        }
    }

    /// Peg-revision target `<url>@<revision>`
    pub fn target(&self, path: &str, revision: impl fmt::Display) -> String {
        format!("{}@{}", self.url(path), revision)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only view of an svn repository
///
/// A gateway is either unloaded, in which case every operation returns
/// [`SvnError::NotLoaded`] without touching the tool, or bound once to a
/// location by [`Repository::open`]. There is no way to rebind it.
#[derive(Debug)]
pub struct Repository<R = SvnExecutor> {
    location: Option<RepositoryLocation>,
    runner: R,
    validator: PathValidator,
}

impl<R: CommandRunner> Repository<R> {
    /// A gateway with no repository bound
    pub fn unloaded(runner: R) -> Self {
        Self {
            location: None,
            runner,
            validator: PathValidator::new(),
        }
    }

    /// Bind a gateway to the repository stored at an absolute path
    pub fn open<P: AsRef<Path>>(path: P, runner: R) -> Result<Self> {
        let location = RepositoryLocation::from_path(path)?;
        Ok(Self::with_location(location, runner))
    }

    /// Bind a gateway to an already-built location
    pub fn with_location(location: RepositoryLocation, runner: R) -> Self {
        Self {
            location: Some(location),
            runner,
            validator: PathValidator::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.location.is_some()
    }

    /// The bound location, or `NotLoaded`
    pub fn location(&self) -> Result<&RepositoryLocation> {
        self.location.as_ref().ok_or(SvnError::NotLoaded)
    }

    /// Get the runner used for tool invocations
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// List branches: folders under `/branches`, then `trunk` if it exists
    #[instrument(skip(self))]
    pub fn branches(&self) -> Result<Vec<String>> {
        let location = self.location()?;

        let ls = SvnCommand::svn("ls").arg(location.target("/branches", Revision::Head));
        let output = self.runner.run(&ls)?;

        let mut branches = if output.success {
            parser::parse_branch_listing(&output.stdout_lossy())
        } else {
            debug!(exit_code = output.exit_code, "no branches folder");
            Vec::new()
        };

        let info = SvnCommand::svn("info").arg(location.target("/trunk", Revision::Head));
        if self.runner.run(&info)?.success {
            branches.retain(|name| name != TRUNK);
            branches.push(TRUNK.to_string());
        }

        Ok(branches)
    }

    /// Whether `reference` names something in the repository history
    ///
    /// `HEAD` in any letter case always exists and is answered without
    /// running the tool.
    #[instrument(skip(self))]
    pub fn has_tree(&self, reference: &str) -> Result<bool> {
        let location = self.location()?;

        if reference.eq_ignore_ascii_case("HEAD") {
            return Ok(true);
        }

        let command = SvnCommand::svn("log").arg(location.target("", reference));
        Ok(self.runner.run(&command)?.success)
    }

    /// Resolve `path` at `revision` to a file, a directory listing or nothing
    ///
    /// `branch` does not change the lookup; paths are repository-absolute.
    #[instrument(skip(self))]
    pub fn tree(&self, branch: &str, path: &str, revision: Revision) -> Result<TreeResult> {
        let location = self.location()?;
        // With a trailing separator svn reports the parent instead of the target
        let path = path.strip_suffix('/').unwrap_or(path);
        self.validator.validate(path)?;

        let info = SvnCommand::svn("info")
            .arg("--xml")
            .arg(location.target(path, revision));
        let output = self.runner.run(&info)?;
        if !output.success {
            debug!(exit_code = output.exit_code, "path does not resolve");
            return Ok(TreeResult::Invalid);
        }

        let entry = match parser::parse_info(&output.stdout_lossy())? {
            Some(entry) => entry,
            None => return Ok(TreeResult::Invalid),
        };

        match entry.kind {
            NodeKind::File => Ok(TreeResult::File {
                path: path.to_string(),
                content: self.cat(location, path, revision)?,
            }),
            NodeKind::Dir => {
                let ls = SvnCommand::svn("ls")
                    .arg("--xml")
                    .arg(location.target(path, revision));
                let output = self.checked(&ls)?;
                let entries = parser::parse_listing(&output.stdout_lossy(), path)?;

                Ok(TreeResult::Dir {
                    path: path.to_string(),
                    entries,
                })
            }
            NodeKind::Invalid => Ok(TreeResult::Invalid),
            kind => Ok(TreeResult::Other {
                path: path.to_string(),
                kind,
            }),
        }
    }

    /// Raw contents of the file at `path` and `revision`
    #[instrument(skip(self))]
    pub fn show(&self, path: &str, revision: Revision) -> Result<Vec<u8>> {
        let location = self.location()?;
        self.validator.validate(path)?;
        self.cat(location, path, revision)
    }

    /// Commits reachable from `revision`, newest first, with their diffs
    ///
    /// `revision` accepts only `HEAD` or a number; anything else means `HEAD`.
    /// The tool has no offset, so `limit + offset` entries are fetched and the
    /// first `offset` dropped. `path` restricts the history to one file or
    /// folder.
    #[instrument(skip(self))]
    pub fn log(&self, revision: &str, limit: usize, offset: usize, path: &str) -> Result<Vec<Commit>> {
        let location = self.location()?;
        self.validator.validate(path)?;
        let revision = Revision::sanitize(revision);

        if limit == 0 {
            return Ok(Vec::new());
        }

        let command = SvnCommand::svn("log")
            .arg("--xml")
            .arg("-v")
            .arg("--limit")
            .arg(limit.saturating_add(offset).to_string())
            .arg(location.target(path, revision));
        let output = self.checked(&command)?;
        let entries = parser::parse_log_entries(&output.stdout_lossy())?;

        entries
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|entry| {
                let metadata = metadata_from_entry(entry)?;
                let diff = self.diff(metadata.hash, None)?;
                Ok(Commit { metadata, diff })
            })
            .collect()
    }

    /// A single commit with its metadata and diff
    #[instrument(skip(self))]
    pub fn show_commit(&self, revision: Revision) -> Result<Commit> {
        let metadata = self.commit_metadata(revision)?;
        let diff = self.diff(metadata.hash, None)?;
        Ok(Commit { metadata, diff })
    }

    /// Metadata for a single revision, from `log --xml -v --limit 1`
    pub fn commit_metadata(&self, revision: Revision) -> Result<CommitMetadata> {
        let location = self.location()?;

        let command = SvnCommand::svn("log")
            .arg("--xml")
            .arg("-v")
            .arg("--limit")
            .arg("1")
            .arg(location.target("", revision));
        let output = self.checked(&command)?;

        let entry = parser::parse_log_entries(&output.stdout_lossy())?
            .into_iter()
            .next()
            .ok_or_else(|| SvnError::NotFound(format!("revision {}", revision)))?;

        metadata_from_entry(entry)
    }

    /// Changes made by `revision`, with per-file line counts
    ///
    /// Without `parent` this is the tool's own "change N" diff. With a parent
    /// the two revisions are compared directly.
    #[instrument(skip(self))]
    pub fn diff(&self, revision: Revision, parent: Option<Revision>) -> Result<Diff> {
        let location = self.location()?;
        let revision = match revision {
            Revision::Number(number) => number,
            Revision::Head => self.resolve_head(location)?,
        };

        let command = match parent {
            Some(parent) => SvnCommand::svn("diff")
                .arg("-r")
                .arg(format!("{}:{}", parent, revision)),
            // Revision 0 is the empty repository and changes nothing
            None if revision == 0 => return Ok(Diff::default()),
            None => SvnCommand::svn("diff").arg("-c").arg(revision.to_string()),
        };
        let command = command.arg(location.url(""));
        let output = self.checked(&command)?;

        let mut diff = diff::parse_unified_diff(&output.stdout_lossy());
        diff.compute_stats();
        Ok(diff)
    }

    /// Line-by-line authorship; not available through this gateway
    pub fn blame(&self, _branch: &str, _path: &str) -> Result<Vec<String>> {
        self.location()?;
        Err(SvnError::Unsupported("blame"))
    }

    fn cat(&self, location: &RepositoryLocation, path: &str, revision: Revision) -> Result<Vec<u8>> {
        let command = SvnCommand::svn("cat").arg(location.target(path, revision));
        Ok(self.checked(&command)?.stdout)
    }

    /// Number of the youngest revision
    fn resolve_head(&self, location: &RepositoryLocation) -> Result<u64> {
        let command = SvnCommand::svn("info")
            .arg("--xml")
            .arg(location.target("", Revision::Head));
        let output = self.checked(&command)?;

        parser::parse_info(&output.stdout_lossy())?
            .and_then(|entry| entry.revision)
            .ok_or_else(|| SvnError::MalformedOutput("info without a revision".to_string()))
    }

    /// Run a command whose failure is an error for the caller
    fn checked(&self, command: &SvnCommand) -> Result<CommandOutput> {
        self.runner.run(command)?.into_result(command)
    }
}

fn metadata_from_entry(entry: LogEntry) -> Result<CommitMetadata> {
    let number = entry
        .revision
        .ok_or_else(|| SvnError::MalformedOutput("logentry without a revision".to_string()))?;
    let hash = Revision::Number(number);
    let (subject, body) = split_message(&entry.message);

    Ok(CommitMetadata {
        hash,
        author: Author {
            name: entry.author,
            email: None,
        },
        date: entry.date,
        subject,
        body,
        parent: hash.parent().unwrap_or(hash),
        changed_paths: entry.changed_paths,
    })
}
