use crate::error::{Result, SvnError};
use crate::security;
use std::borrow::Cow;
use std::ffi::OsString;
use std::fmt;
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Timeout applied to every invocation unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// svn error codes meaning "that path or revision does not exist"
const NOT_FOUND_CODES: &[&str] = &[
    "E160013", // path not found
    "W160013",
    "E160006", // no such revision
    "E170000", // URL doesn't exist
    "E180001", // unable to open repository
    "E195012", // unable to find repository location
    "E200009", // could not display info for all targets
];

/// External programs the executor is allowed to spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    Svn,
    SvnAdmin,
}

impl Program {
    pub fn name(self) -> &'static str {
        match self {
            Program::Svn => "svn",
            Program::SvnAdmin => "svnadmin",
        }
    }
}

/// A single tool invocation as an argument vector
///
/// Arguments are handed to the process verbatim, never to a shell, so
/// caller-supplied paths and revisions need no escaping to be safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvnCommand {
    program: Program,
    args: Vec<String>,
}

impl SvnCommand {
    /// Start an `svn <subcommand>` invocation
    pub fn svn(subcommand: &str) -> Self {
        Self {
            program: Program::Svn,
            args: vec![subcommand.to_string()],
        }
    }

    /// Start an `svnadmin <subcommand>` invocation
    pub fn svnadmin(subcommand: &str) -> Self {
        Self {
            program: Program::SvnAdmin,
            args: vec![subcommand.to_string()],
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> Program {
        self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The subcommand, e.g. `info` for `svn info --xml ...`
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

impl fmt::Display for SvnCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.name())?;
        for arg in &self.args {
            write!(f, " {}", quote_arg(arg))?;
        }
        Ok(())
    }
}

/// Quote a single argument for POSIX shells
///
/// Only used to render commands for logs and error messages. Arguments made
/// of plainly safe characters are left untouched; everything else is wrapped
/// in single quotes with embedded quotes closed, escaped and reopened.
pub fn quote_arg(arg: &str) -> Cow<'_, str> {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || "_-./:=@,+%".contains(c);

    if !arg.is_empty() && arg.chars().all(is_safe) {
        return Cow::Borrowed(arg);
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('\'');
    for c in arg.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    Cow::Owned(quoted)
}

/// Result of executing a command
///
/// A non-zero exit is data, not an error: `success` is false and the caller
/// decides whether that means "absent" or "broken".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

impl CommandOutput {
    /// A successful output carrying `stdout`
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
            success: true,
        }
    }

    /// A failed output with the given exit code and stderr
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: stderr.into(),
            exit_code,
            success: false,
        }
    }

    /// stdout decoded as UTF-8, replacing invalid sequences
    pub fn stdout_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Translate a failed run into the error taxonomy
    ///
    /// The exit code alone cannot tell "missing" from "broken", so stderr is
    /// searched for the svn codes that mean a path or revision is absent.
    pub fn to_error(&self, command: &SvnCommand) -> SvnError {
        let stderr = self.stderr.trim();

        if NOT_FOUND_CODES.iter().any(|code| stderr.contains(code)) {
            return SvnError::NotFound(stderr.to_string());
        }

        warn!(command = %command, exit_code = self.exit_code, stderr, "svn failed");
        SvnError::ToolExecutionFailed {
            command: command.to_string(),
            exit_code: self.exit_code,
            stderr: stderr.to_string(),
        }
    }

    /// Pass successful output through, translate failures
    pub fn into_result(self, command: &SvnCommand) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(self.to_error(command))
        }
    }
}

/// Executes a single tool invocation
///
/// The gateway only ever talks to the tool through this trait, which lets
/// tests substitute canned responses.
pub trait CommandRunner {
    fn run(&self, command: &SvnCommand) -> Result<CommandOutput>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, command: &SvnCommand) -> Result<CommandOutput> {
        (**self).run(command)
    }
}

/// Runs svn and svnadmin as child processes
#[derive(Debug, Clone)]
pub struct SvnExecutor {
    svn_binary: OsString,
    svnadmin_binary: OsString,
    timeout: Duration,
}

impl SvnExecutor {
    /// Create an executor using `svn` and `svnadmin` from PATH
    pub fn new() -> Self {
        Self {
            svn_binary: OsString::from("svn"),
            svnadmin_binary: OsString::from("svnadmin"),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use specific binaries instead of the ones on PATH
    pub fn with_binaries(svn: impl Into<OsString>, svnadmin: impl Into<OsString>) -> Self {
        Self {
            svn_binary: svn.into(),
            svnadmin_binary: svnadmin.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-invocation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn binary(&self, program: Program) -> &OsString {
        match program {
            Program::Svn => &self.svn_binary,
            Program::SvnAdmin => &self.svnadmin_binary,
        }
    }
}

impl Default for SvnExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SvnExecutor {
    fn run(&self, command: &SvnCommand) -> Result<CommandOutput> {
        security::check_subcommand(command.program(), command.args())?;

        let started = Instant::now();
        let mut process = Command::new(self.binary(command.program()));
        process.args(command.args());
        if command.program() == Program::Svn && command.subcommand() != Some("--version") {
            process.arg("--non-interactive");
        }
        // Stable messages regardless of the caller's locale. LC_ALL would
        // override LC_MESSAGES; LC_CTYPE is kept so non-ASCII paths convert.
        process.env_remove("LC_ALL").env("LC_MESSAGES", "C");
        process
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = process.spawn().map_err(|source| SvnError::SpawnFailed {
            program: command.program().name().to_string(),
            source,
        })?;

        let stdout_handle = child.stdout.take().map(spawn_reader);
        let stderr_handle = child.stderr.take().map(spawn_reader);

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                warn!(command = %command, timeout_secs = self.timeout.as_secs(), "svn timed out");
                return Err(SvnError::Timeout {
                    command: command.to_string(),
                    seconds: self.timeout.as_secs(),
                });
            }
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SvnError::IoError(err));
            }
        };

        let stdout = join_reader(stdout_handle)?;
        let stderr = String::from_utf8_lossy(&join_reader(stderr_handle)?).to_string();
        let exit_code = status.code().unwrap_or(-1);

        debug!(
            command = %command,
            exit_code,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "svn finished"
        );

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code,
            success: status.success(),
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut stream: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer)?;
        Ok(buffer)
    })
}

fn join_reader(handle: Option<JoinHandle<io::Result<Vec<u8>>>>) -> Result<Vec<u8>> {
    match handle {
        Some(handle) => {
            let bytes = handle
                .join()
                .map_err(|_| io::Error::other("output reader thread panicked"))??;
            Ok(bytes)
        }
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display_quotes_each_argument() {
        let command = SvnCommand::svn("cat").arg("file:///repo/trunk/my file.txt@HEAD");
        assert_eq!(
            command.to_string(),
            "svn cat 'file:///repo/trunk/my file.txt@HEAD'"
        );
    }

    #[test]
    fn test_quote_arg_leaves_safe_arguments() {
        assert_eq!(quote_arg("--xml"), "--xml");
        assert_eq!(quote_arg("file:///srv/repo/trunk@42"), "file:///srv/repo/trunk@42");
    }

    #[test]
    fn test_quote_arg_injection_payloads() {
        assert_eq!(quote_arg("; rm -rf /"), "'; rm -rf /'");
        assert_eq!(quote_arg("$(whoami)"), "'$(whoami)'");
        assert_eq!(quote_arg("`id`"), "'`id`'");
        assert_eq!(quote_arg("a | sh"), "'a | sh'");
        assert_eq!(quote_arg("it's"), "'it'\\''s'");
        assert_eq!(quote_arg("x'; touch /tmp/pwned; echo '"), "'x'\\''; touch /tmp/pwned; echo '\\'''");
    }

    #[test]
    fn test_quote_arg_empty() {
        assert_eq!(quote_arg(""), "''");
    }

    #[test]
    fn test_subcommand() {
        let command = SvnCommand::svn("log").arg("--xml");
        assert_eq!(command.subcommand(), Some("log"));
        assert_eq!(command.program(), Program::Svn);
        assert_eq!(command.args(), ["log", "--xml"]);
    }

    #[test]
    fn test_failure_classified_as_not_found() {
        let command = SvnCommand::svn("cat").arg("file:///r/missing@HEAD");
        let output = CommandOutput::failure(
            1,
            "svn: E160013: File not found: revision 3, path '/missing'\n",
        );

        assert!(matches!(output.to_error(&command), SvnError::NotFound(_)));
    }

    #[test]
    fn test_failure_classified_as_tool_failure() {
        let command = SvnCommand::svn("cat").arg("file:///r/a@HEAD");
        let output = CommandOutput::failure(1, "svn: E000013: Permission denied");

        match output.to_error(&command) {
            SvnError::ToolExecutionFailed { exit_code, stderr, .. } => {
                assert_eq!(exit_code, 1);
                assert!(stderr.contains("Permission denied"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_into_result_passes_success() {
        let command = SvnCommand::svn("info");
        let output = CommandOutput::success("ok").into_result(&command).unwrap();
        assert_eq!(output.stdout_lossy(), "ok");
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let executor = SvnExecutor::with_binaries(
            "/nonexistent/svnview-test/svn",
            "/nonexistent/svnview-test/svnadmin",
        );
        let result = executor.run(&SvnCommand::svn("info").arg("file:///r"));

        assert!(matches!(result.unwrap_err(), SvnError::SpawnFailed { .. }));
    }

    #[test]
    fn test_disallowed_subcommand_never_spawns() {
        let executor = SvnExecutor::with_binaries("/nonexistent/svn", "/nonexistent/svnadmin");
        let result = executor.run(&SvnCommand::svn("propset").arg("x"));

        assert!(matches!(result.unwrap_err(), SvnError::InvalidArgument(_)));
    }

    #[cfg(unix)]
    mod fake_binary {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::path::PathBuf;
        use tempfile::TempDir;

        fn fake_svn(script: &str) -> (TempDir, PathBuf) {
            let temp_dir = TempDir::new().unwrap();
            let path = temp_dir.path().join("svn");
            fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
            let mut perms = fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&path, perms).unwrap();
            (temp_dir, path)
        }

        #[test]
        fn test_captures_stdout_with_newlines() {
            let (_temp, svn) = fake_svn("printf 'one\\ntwo\\n\\n'");
            let executor = SvnExecutor::with_binaries(&svn, "svnadmin");

            let output = executor.run(&SvnCommand::svn("cat").arg("x")).unwrap();
            assert!(output.success);
            assert_eq!(output.exit_code, 0);
            assert_eq!(output.stdout, b"one\ntwo\n\n");
        }

        #[test]
        fn test_non_zero_exit_is_data() {
            let (_temp, svn) = fake_svn("echo 'svn: E170000: URL does not exist' >&2; exit 1");
            let executor = SvnExecutor::with_binaries(&svn, "svnadmin");

            let output = executor.run(&SvnCommand::svn("info").arg("x")).unwrap();
            assert!(!output.success);
            assert_eq!(output.exit_code, 1);
            assert!(output.stderr.contains("E170000"));
        }

        #[test]
        fn test_arguments_are_not_shell_interpreted() {
            let (_temp, svn) = fake_svn("printf '%s\\n' \"$@\"");
            let executor = SvnExecutor::with_binaries(&svn, "svnadmin");

            let output = executor
                .run(&SvnCommand::svn("cat").arg("$(echo pwned); ls"))
                .unwrap();
            let stdout = output.stdout_lossy();
            let args: Vec<&str> = stdout.lines().collect();
            assert_eq!(args, ["cat", "$(echo pwned); ls", "--non-interactive"]);
        }

        #[test]
        fn test_messages_locale_forced_over_lc_all() {
            let (_temp, svn) = fake_svn("printf '%s|%s\\n' \"${LC_ALL-unset}\" \"$LC_MESSAGES\"");
            let executor = SvnExecutor::with_binaries(&svn, "svnadmin");

            let output = executor.run(&SvnCommand::svn("info").arg("x")).unwrap();
            assert_eq!(output.stdout_lossy().trim(), "unset|C");
        }

        #[test]
        fn test_timeout() {
            let (_temp, svn) = fake_svn("sleep 5");
            let executor = SvnExecutor::with_binaries(&svn, "svnadmin")
                .with_timeout(Duration::from_millis(200));

            let result = executor.run(&SvnCommand::svn("log").arg("x"));
            assert!(matches!(result.unwrap_err(), SvnError::Timeout { .. }));
        }
    }
}
