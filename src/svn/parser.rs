//! Parsers for the `--xml` output of `svn info`, `svn ls` and `svn log`.
//!
//! Malformed documents are reported as [`SvnError::MalformedOutput`];
//! well-formed documents that lack the expected elements parse to an empty
//! or absent result.

use crate::error::Result;
use crate::svn::types::{ChangedPath, NodeKind, Timestamp, TreeEntry};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct InfoDocument {
    #[serde(default)]
    entry: Vec<InfoEntryXml>,
}

#[derive(Debug, Deserialize)]
struct InfoEntryXml {
    #[serde(rename = "@kind", default)]
    kind: String,
    #[serde(rename = "@path", default)]
    path: String,
    #[serde(rename = "@revision", default)]
    revision: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListsDocument {
    #[serde(default)]
    list: Vec<ListXml>,
}

#[derive(Debug, Deserialize)]
struct ListXml {
    #[serde(default)]
    entry: Vec<ListEntryXml>,
}

#[derive(Debug, Deserialize)]
struct ListEntryXml {
    #[serde(rename = "@kind", default)]
    kind: String,
    #[serde(default)]
    name: String,
    size: Option<String>,
    commit: Option<ListCommitXml>,
}

#[derive(Debug, Deserialize)]
struct ListCommitXml {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LogDocument {
    #[serde(default)]
    logentry: Vec<LogEntryXml>,
}

#[derive(Debug, Deserialize)]
struct LogEntryXml {
    #[serde(rename = "@revision", default)]
    revision: String,
    author: Option<String>,
    date: Option<String>,
    paths: Option<LogPathsXml>,
}

#[derive(Debug, Deserialize)]
struct LogPathsXml {
    #[serde(default)]
    path: Vec<LogPathXml>,
}

#[derive(Debug, Deserialize)]
struct LogPathXml {
    #[serde(rename = "@action", default)]
    action: String,
    #[serde(rename = "@kind", default)]
    kind: String,
    #[serde(rename = "@copyfrom-path")]
    copyfrom_path: Option<String>,
    #[serde(rename = "$text", default)]
    path: String,
}

/// The single entry of an `svn info --xml` document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoEntry {
    pub kind: NodeKind,
    pub path: String,
    pub url: Option<String>,
    pub revision: Option<u64>,
}

/// One `logentry` of an `svn log --xml -v` document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub revision: Option<u64>,
    pub author: String,
    pub date: Option<Timestamp>,
    pub message: String,
    pub changed_paths: Vec<ChangedPath>,
}

/// Parse `svn info --xml`; `None` when the document has no `entry`
pub fn parse_info(xml: &str) -> Result<Option<InfoEntry>> {
    let document: InfoDocument = quick_xml::de::from_str(xml)?;

    Ok(document.entry.into_iter().next().map(|entry| InfoEntry {
        kind: NodeKind::parse(&entry.kind),
        path: entry.path,
        url: entry.url,
        revision: entry.revision.and_then(|rev| rev.trim().parse().ok()),
    }))
}

/// Parse `svn ls --xml` into tree entries under `parent_path`
///
/// Entries keep the tool's listing order. Only files carry a size.
pub fn parse_listing(xml: &str, parent_path: &str) -> Result<Vec<TreeEntry>> {
    let document: ListsDocument = quick_xml::de::from_str(xml)?;

    let entries = document
        .list
        .into_iter()
        .flat_map(|list| list.entry)
        .map(|entry| {
            let kind = NodeKind::parse(&entry.kind);
            let size = match kind {
                NodeKind::File => entry.size.and_then(|size| size.trim().parse().ok()),
                _ => None,
            };

            TreeEntry {
                full_path: join_path(parent_path, &entry.name),
                kind,
                name: entry.name,
                size,
                updated: entry
                    .commit
                    .and_then(|commit| commit.date)
                    .and_then(|date| Timestamp::parse(&date)),
                message: None,
            }
        })
        .collect();

    Ok(entries)
}

/// Parse `svn log --xml [-v]` entries in document order
pub fn parse_log_entries(xml: &str) -> Result<Vec<LogEntry>> {
    let document: LogDocument = quick_xml::de::from_str(xml)?;
    let mut messages = raw_messages(xml)?.into_iter();

    let entries = document
        .logentry
        .into_iter()
        .map(|entry| LogEntry {
            revision: entry.revision.trim().parse().ok(),
            author: entry.author.unwrap_or_default(),
            date: entry.date.as_deref().and_then(Timestamp::parse),
            message: messages.next().unwrap_or_default(),
            changed_paths: entry
                .paths
                .map(|paths| {
                    paths
                        .path
                        .into_iter()
                        .map(|path| ChangedPath {
                            action: path.action,
                            kind: NodeKind::parse(&path.kind),
                            path: path.path,
                            copied_from: path.copyfrom_path,
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect();

    Ok(entries)
}

/// The `<msg>` text of each `logentry`, in document order
///
/// Read with the plain event reader because the serde deserializer trims
/// text nodes, and a message keeps its leading and trailing whitespace.
fn raw_messages(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut messages = Vec::new();
    let mut in_msg = false;

    loop {
        match reader.read_event()? {
            Event::Start(tag) => match tag.name().as_ref() {
                b"logentry" => messages.push(String::new()),
                b"msg" => in_msg = true,
                _ => {}
            },
            Event::Empty(tag) if tag.name().as_ref() == b"logentry" => {
                messages.push(String::new());
            }
            Event::End(tag) if tag.name().as_ref() == b"msg" => in_msg = false,
            Event::Text(text) if in_msg => {
                if let Some(message) = messages.last_mut() {
                    message.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) if in_msg => {
                if let Some(message) = messages.last_mut() {
                    message.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(messages)
}

/// Join a repository path and an entry name with exactly one separator
pub fn join_path(parent: &str, name: &str) -> String {
    let parent = parent.trim_end_matches('/');
    format!("{}/{}", parent, name)
}

/// Parse the plain `svn ls` output of a branches folder
///
/// Directory lines end with `/`; everything else is ignored.
pub fn parse_branch_listing(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_suffix('/'))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SvnError;

    const INFO_DIR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<info>
<entry
   kind="dir"
   path="trunk"
   revision="42">
<url>file:///srv/repo/trunk</url>
<repository>
<root>file:///srv/repo</root>
<uuid>13f79535-47bb-0310-9956-ffa450edef68</uuid>
</repository>
<commit
   revision="40">
<author>alice</author>
<date>2012-06-01T10:00:00.000000Z</date>
</commit>
</entry>
</info>
"#;

    const LISTING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<lists>
<list
   path="file:///srv/repo/trunk">
<entry
   kind="file">
<name>README</name>
<size>120</size>
<commit
   revision="3">
<author>alice</author>
<date>2012-06-01T10:00:00.000000Z</date>
</commit>
</entry>
<entry
   kind="dir">
<name>src</name>
<commit
   revision="5">
<author>bob</author>
<date>2012-06-02T23:59:59.999999Z</date>
</commit>
</entry>
</list>
</lists>
"#;

    const LOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<log>
<logentry
   revision="42">
<author>alice</author>
<date>2012-06-01T10:00:00.000000Z</date>
<paths>
<path
   text-mods="true"
   kind="file"
   action="M"
   prop-mods="false">/trunk/src/main.c</path>
<path
   kind="dir"
   action="A"
   copyfrom-path="/trunk"
   copyfrom-rev="41">/branches/feature</path>
</paths>
<msg>Fix the parser

It now handles empty hunks.</msg>
</logentry>
<logentry
   revision="41">
<date>2012-05-31T09:00:00.000000Z</date>
<msg></msg>
</logentry>
</log>
"#;

    #[test]
    fn test_parse_info_dir() {
        let entry = parse_info(INFO_DIR).unwrap().unwrap();
        assert_eq!(entry.kind, NodeKind::Dir);
        assert_eq!(entry.path, "trunk");
        assert_eq!(entry.revision, Some(42));
        assert_eq!(entry.url.as_deref(), Some("file:///srv/repo/trunk"));
    }

    #[test]
    fn test_parse_info_without_entry() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<info>\n</info>\n";
        assert_eq!(parse_info(xml).unwrap(), None);
    }

    #[test]
    fn test_parse_info_malformed() {
        let result = parse_info("<?xml version=\"1.0\"?>\n<info>\n<entry kind=");
        assert!(matches!(result, Err(SvnError::MalformedOutput(_))));
    }

    #[test]
    fn test_parse_listing() {
        let entries = parse_listing(LISTING, "/trunk").unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].kind, NodeKind::File);
        assert_eq!(entries[0].name, "README");
        assert_eq!(entries[0].full_path, "/trunk/README");
        assert_eq!(entries[0].size, Some(120));
        assert_eq!(
            entries[0].updated.unwrap().to_string(),
            "2012-06-01 10:00:00"
        );
        assert_eq!(entries[0].message, None);

        assert_eq!(entries[1].kind, NodeKind::Dir);
        assert_eq!(entries[1].size, None);
        assert_eq!(
            entries[1].updated.unwrap().to_string(),
            "2012-06-02 23:59:59"
        );
    }

    #[test]
    fn test_parse_listing_at_root() {
        let entries = parse_listing(LISTING, "").unwrap();
        assert_eq!(entries[1].full_path, "/src");
    }

    #[test]
    fn test_parse_listing_empty_directory() {
        let xml = "<?xml version=\"1.0\"?>\n<lists>\n<list path=\"file:///r/empty\">\n</list>\n</lists>\n";
        assert!(parse_listing(xml, "/empty").unwrap().is_empty());
    }

    #[test]
    fn test_parse_log_entries() {
        let entries = parse_log_entries(LOG).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.revision, Some(42));
        assert_eq!(first.author, "alice");
        assert_eq!(first.message, "Fix the parser\n\nIt now handles empty hunks.");
        assert_eq!(first.changed_paths.len(), 2);
        assert_eq!(first.changed_paths[0].action, "M");
        assert_eq!(first.changed_paths[0].path, "/trunk/src/main.c");
        assert_eq!(first.changed_paths[1].kind, NodeKind::Dir);
        assert_eq!(first.changed_paths[1].copied_from.as_deref(), Some("/trunk"));

        let second = &entries[1];
        assert_eq!(second.revision, Some(41));
        assert_eq!(second.author, "");
        assert_eq!(second.message, "");
        assert!(second.changed_paths.is_empty());
    }

    #[test]
    fn test_parse_log_keeps_message_whitespace() {
        let xml = "<?xml version=\"1.0\"?>\n<log>\n<logentry revision=\"7\">\n<msg>  a &lt; b\n\nbody\n</msg>\n</logentry>\n<logentry revision=\"6\">\n<msg><![CDATA[ raw <text>]]></msg>\n</logentry>\n</log>\n";
        let entries = parse_log_entries(xml).unwrap();

        assert_eq!(entries[0].message, "  a < b\n\nbody\n");
        assert_eq!(entries[1].message, " raw <text>");

        let (subject, body) = crate::svn::types::split_message(&entries[0].message);
        assert_eq!(subject, "  a < b");
        assert_eq!(body, "body");
    }

    #[test]
    fn test_parse_log_empty() {
        let xml = "<?xml version=\"1.0\"?>\n<log>\n</log>\n";
        assert!(parse_log_entries(xml).unwrap().is_empty());
    }

    #[test]
    fn test_parse_log_malformed() {
        assert!(parse_log_entries("").is_err());
        assert!(parse_log_entries("svn: E160013: path not found").is_err());
    }

    #[test]
    fn test_parse_branch_listing() {
        let output = "feature-x/\nrelease-1.0/\nREADME.txt\n\n";
        assert_eq!(parse_branch_listing(output), ["feature-x", "release-1.0"]);
        assert!(parse_branch_listing("").is_empty());
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/trunk", "a.txt"), "/trunk/a.txt");
        assert_eq!(join_path("/trunk/", "a.txt"), "/trunk/a.txt");
        assert_eq!(join_path("", "trunk"), "/trunk");
    }
}
