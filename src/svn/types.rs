use crate::svn::diff::Diff;
use crate::svn::revision::Revision;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Canonical timestamp layout for every record
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Node kind as reported by svn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Dir,
    Invalid,
    /// Any other kind string the tool reports
    Other(String),
}

impl NodeKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "file" => NodeKind::File,
            "dir" => NodeKind::Dir,
            "" | "invalid" | "none" => NodeKind::Invalid,
            other => NodeKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::File => "file",
            NodeKind::Dir => "dir",
            NodeKind::Invalid => "invalid",
            NodeKind::Other(kind) => kind,
        }
    }
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A UTC instant rendered as `YYYY-MM-DD HH:MM:SS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Parse an svn XML date such as `2012-06-01T10:00:00.000000Z`
    pub fn parse(value: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(value.trim())
            .ok()
            .map(|date| Timestamp(date.with_timezone(&Utc)))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One node in a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub kind: NodeKind,
    pub name: String,
    pub full_path: String,
    /// Only present for files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub updated: Option<Timestamp>,
    /// svn cannot cheaply report a per-entry message, so this is always `None`
    pub message: Option<String>,
}

/// A path resolved at a revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeResult {
    File {
        path: String,
        #[serde(serialize_with = "serialize_lossy")]
        content: Vec<u8>,
    },
    Dir {
        path: String,
        entries: Vec<TreeEntry>,
    },
    /// Resolved, but neither a file nor a directory
    Other { path: String, kind: NodeKind },
    /// The path does not exist at the requested revision
    Invalid,
}

impl TreeResult {
    pub fn kind(&self) -> NodeKind {
        match self {
            TreeResult::File { .. } => NodeKind::File,
            TreeResult::Dir { .. } => NodeKind::Dir,
            TreeResult::Other { kind, .. } => kind.clone(),
            TreeResult::Invalid => NodeKind::Invalid,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, TreeResult::Invalid)
    }
}

fn serialize_lossy<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub name: String,
    /// svn records usernames only
    pub email: Option<String>,
}

/// A path touched by a commit, from `log -v`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedPath {
    /// `A`, `M`, `D` or `R`
    pub action: String,
    pub kind: NodeKind,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copied_from: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitMetadata {
    pub hash: Revision,
    pub author: Author,
    pub date: Option<Timestamp>,
    pub subject: String,
    pub body: String,
    /// Arithmetic predecessor of `hash`; informational only
    pub parent: Revision,
    pub changed_paths: Vec<ChangedPath>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    #[serde(flatten)]
    pub metadata: CommitMetadata,
    pub diff: Diff,
}

/// Split a commit message into its first line and the trimmed remainder
pub fn split_message(message: &str) -> (String, String) {
    match message.split_once('\n') {
        Some((subject, body)) => (
            subject.trim_end_matches('\r').to_string(),
            body.trim().to_string(),
        ),
        None => (message.trim_end_matches('\r').to_string(), String::new()),
    }
}
