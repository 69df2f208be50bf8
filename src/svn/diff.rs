//! Unified diff parsing and per-file line statistics.
//!
//! Handles the output of `svn diff` (`Index:` headers, `(revision N)` /
//! `(nonexistent)` trailers, property sections) as well as git-style
//! `diff --git` headers.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// How a diff line relates to the old and new file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Context,
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub kind: LineKind,
    /// Line text without the leading marker
    pub content: String,
}

/// The ranges from a `@@ -a,b +c,d @@` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HunkRange {
    pub old_start: u64,
    pub old_lines: u64,
    pub new_start: u64,
    pub new_lines: u64,
}

impl HunkRange {
    /// Parse a hunk header line; a missing count means one line
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix("@@ -")?;
        let (ranges, _) = rest.split_once(" @@")?;
        let (old, new) = ranges.split_once(" +")?;
        let (old_start, old_lines) = parse_range(old)?;
        let (new_start, new_lines) = parse_range(new)?;

        Some(HunkRange {
            old_start,
            old_lines,
            new_start,
            new_lines,
        })
    }
}

fn parse_range(range: &str) -> Option<(u64, u64)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hunk {
    pub range: HunkRange,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    pub fn new(range: HunkRange) -> Self {
        Self {
            range,
            lines: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Added and removed line counts for one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    /// Added lines
    pub more: usize,
    /// Removed lines
    pub less: usize,
}

impl DiffStats {
    pub fn from_hunks(hunks: &[Hunk]) -> Self {
        let mut stats = DiffStats::default();
        for line in hunks.iter().flat_map(|hunk| &hunk.lines) {
            match line.kind {
                LineKind::Added => stats.more += 1,
                LineKind::Removed => stats.less += 1,
                LineKind::Context => {}
            }
        }
        stats
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDiff {
    #[serde(skip)]
    pub path: String,
    pub hunks: Vec<Hunk>,
    #[serde(flatten)]
    pub stats: DiffStats,
}

impl FileDiff {
    fn new(path: String) -> Self {
        Self {
            path,
            hunks: Vec::new(),
            stats: DiffStats::default(),
        }
    }
}

/// Per-file hunks in the order files appear in the diff
///
/// Serializes as a map from path to `{hunks, more, less}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    files: Vec<FileDiff>,
}

impl Serialize for Diff {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.files.len()))?;
        for file in &self.files {
            map.serialize_entry(&file.path, file)?;
        }
        map.end()
    }
}

impl Diff {
    pub fn get(&self, path: &str) -> Option<&FileDiff> {
        self.files.iter().find(|file| file.path == path)
    }

    pub fn files(&self) -> &[FileDiff] {
        &self.files
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|file| file.path.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Fill in `more`/`less` for every file
    pub fn compute_stats(&mut self) {
        for file in &mut self.files {
            file.stats = DiffStats::from_hunks(&file.hunks);
        }
    }

    /// Index of the entry for `path`, created at the end if new
    fn entry(&mut self, path: String) -> usize {
        match self.files.iter().position(|file| file.path == path) {
            Some(index) => index,
            None => {
                self.files.push(FileDiff::new(path));
                self.files.len() - 1
            }
        }
    }
}

/// Where the parser is within the current file section
#[derive(Debug)]
enum State {
    /// Between files or in a header
    Header,
    /// Inside a hunk with this many old/new lines still expected
    Body { old: u64, new: u64 },
    /// Inside an svn `Property changes on:` block
    Properties,
}

/// Parse unified diff text into per-file hunks
///
/// Never fails: unrecognized input is skipped, so garbage yields an empty
/// diff. Stats are left at zero; call [`Diff::compute_stats`].
pub fn parse_unified_diff(text: &str) -> Diff {
    let mut diff = Diff::default();
    let mut state = State::Header;
    let mut current: Option<usize> = None;
    // Set by `Index:` or `diff --git`, which name the file before `---`/`+++`
    let mut named_by_header = false;
    let mut old_path: Option<String> = None;

    for line in text.lines() {
        if let State::Body { old, new } = &mut state {
            if let Some(index) = current {
                let kind = match line.as_bytes().first() {
                    Some(b'+') => Some((LineKind::Added, &line[1..])),
                    Some(b'-') => Some((LineKind::Removed, &line[1..])),
                    Some(b' ') => Some((LineKind::Context, &line[1..])),
                    // Some tools strip the marker from blank context lines
                    None => Some((LineKind::Context, "")),
                    Some(b'\\') => {
                        // "\ No newline at end of file"
                        continue;
                    }
                    _ => None,
                };

                if let Some((kind, content)) = kind {
                    match kind {
                        LineKind::Added => *new = new.saturating_sub(1),
                        LineKind::Removed => *old = old.saturating_sub(1),
                        LineKind::Context => {
                            *old = old.saturating_sub(1);
                            *new = new.saturating_sub(1);
                        }
                    }

                    if let Some(hunk) = diff.files[index].hunks.last_mut() {
                        hunk.lines.push(DiffLine {
                            kind,
                            content: content.to_string(),
                        });
                    }

                    if *old == 0 && *new == 0 {
                        state = State::Header;
                    }
                    continue;
                }
            }
            state = State::Header;
        }

        if let Some(path) = line.strip_prefix("Index: ") {
            current = Some(diff.entry(path.trim().to_string()));
            named_by_header = true;
            old_path = None;
            state = State::Header;
        } else if let Some(rest) = line.strip_prefix("diff --git ") {
            let path = rest
                .rsplit_once(" b/")
                .map(|(_, new)| new)
                .unwrap_or(rest)
                .trim();
            current = Some(diff.entry(path.to_string()));
            named_by_header = true;
            old_path = None;
            state = State::Header;
        } else if line.starts_with("Property changes on:") {
            state = State::Properties;
        } else if matches!(state, State::Properties) {
            continue;
        } else if let Some(rest) = line.strip_prefix("--- ") {
            old_path = Some(header_path(rest));
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            if !named_by_header {
                let new_path = header_path(rest);
                let path = match (new_path.as_str(), old_path.take()) {
                    ("/dev/null", Some(old)) => old,
                    _ => new_path,
                };
                current = Some(diff.entry(path));
            }
            named_by_header = false;
        } else if line.starts_with("@@ ") {
            if let (Some(index), Some(range)) = (current, HunkRange::parse(line)) {
                diff.files[index].hunks.push(Hunk::new(range));
                if range.old_lines > 0 || range.new_lines > 0 {
                    state = State::Body {
                        old: range.old_lines,
                        new: range.new_lines,
                    };
                }
            }
        }
    }

    diff
}

/// Strip the `\t(revision N)` trailer and git's `a/`/`b/` prefixes
fn header_path(rest: &str) -> String {
    let path = rest.split('\t').next().unwrap_or(rest).trim_end();
    let path = path
        .strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path);
    path.to_string()
}
