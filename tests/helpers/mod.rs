#![allow(dead_code)]

use std::cell::RefCell;
use svnview::Result;
use svnview::svn::{CommandOutput, CommandRunner, SvnCommand};

pub const REPO_PATH: &str = "/srv/svn/project";
pub const REPO_URL: &str = "file:///srv/svn/project";

/// A canned reply for commands matching a subcommand and an argument fragment
struct Rule {
    subcommand: &'static str,
    fragment: String,
    output: CommandOutput,
}

/// Runner that records every command and replays canned output
///
/// Rules are checked in order; commands matching no rule fail with exit 1
/// and a "path not found" error, like svn does for missing URLs.
#[derive(Default)]
pub struct StubRunner {
    rules: Vec<Rule>,
    calls: RefCell<Vec<SvnCommand>>,
}

impl StubRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `output` to `svn <subcommand>` when any argument contains `fragment`
    pub fn on(mut self, subcommand: &'static str, fragment: &str, output: CommandOutput) -> Self {
        self.rules.push(Rule {
            subcommand,
            fragment: fragment.to_string(),
            output,
        });
        self
    }

    pub fn calls(&self) -> Vec<SvnCommand> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Commands run with the given subcommand
    pub fn calls_to(&self, subcommand: &str) -> Vec<SvnCommand> {
        self.calls
            .borrow()
            .iter()
            .filter(|command| command.subcommand() == Some(subcommand))
            .cloned()
            .collect()
    }
}

impl CommandRunner for StubRunner {
    fn run(&self, command: &SvnCommand) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(command.clone());

        let rule = self.rules.iter().find(|rule| {
            command.subcommand() == Some(rule.subcommand)
                && command.args().iter().any(|arg| arg.contains(&rule.fragment))
        });

        Ok(match rule {
            Some(rule) => rule.output.clone(),
            None => CommandOutput::failure(1, "svn: E170000: URL does not exist"),
        })
    }
}

pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput::success(stdout)
}

pub fn info_xml(kind: &str, path: &str, revision: u64) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<info>
<entry
   kind="{kind}"
   path="{path}"
   revision="{revision}">
<url>{REPO_URL}/{path}</url>
</entry>
</info>
"#
    )
}

pub const INFO_NO_ENTRY: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<info>\n</info>\n";

pub const TRUNK_LISTING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<lists>
<list
   path="file:///srv/svn/project/trunk">
<entry
   kind="file">
<name>Makefile</name>
<size>512</size>
<commit
   revision="40">
<author>alice</author>
<date>2012-06-01T10:00:00.000000Z</date>
</commit>
</entry>
<entry
   kind="dir">
<name>src</name>
<commit
   revision="42">
<author>bob</author>
<date>2012-06-03T08:15:30.500000Z</date>
</commit>
</entry>
<entry
   kind="file">
<name>README</name>
<size>64</size>
<commit
   revision="12">
<author>alice</author>
<date>2012-05-01T00:00:00.000000Z</date>
</commit>
</entry>
</list>
</lists>
"#;

pub fn log_xml(entries: &[(u64, &str, &str)]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<log>\n");
    for (revision, author, msg) in entries {
        xml.push_str(&format!(
            "<logentry\n   revision=\"{revision}\">\n<author>{author}</author>\n<date>2012-06-01T10:00:00.000000Z</date>\n<paths>\n<path\n   kind=\"file\"\n   action=\"M\">/trunk/src/main.c</path>\n</paths>\n<msg>{msg}</msg>\n</logentry>\n"
        ));
    }
    xml.push_str("</log>\n");
    xml
}

pub const DIFF_42: &str = "Index: trunk/src/main.c
===================================================================
--- trunk/src/main.c\t(revision 41)
+++ trunk/src/main.c\t(revision 42)
@@ -1,3 +1,4 @@
 int main(void) {
-    return 1;
+    puts(\"hello\");
+    return 0;
 }
";
