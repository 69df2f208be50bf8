use serde::{Serialize, Serializer};
use std::fmt;

/// A point in repository history: the symbolic latest or a revision number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Revision {
    #[default]
    Head,
    Number(u64),
}

impl Revision {
    /// Parse a caller-supplied revision, accepting only `HEAD` or a non-negative integer
    ///
    /// Anything else is coerced to `HEAD`. The value ends up on a command line,
    /// so unexpected ref syntax is never passed through.
    pub fn sanitize(input: &str) -> Self {
        let input = input.trim();
        if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(number) = input.parse() {
                return Revision::Number(number);
            }
        }
        Revision::Head
    }

    pub fn number(self) -> Option<u64> {
        match self {
            Revision::Head => None,
            Revision::Number(number) => Some(number),
        }
    }

    /// The arithmetic predecessor, floored at zero
    ///
    /// svn revision numbers are repository-global, so this is the previous
    /// state of the whole repository, not necessarily the previous change to
    /// any particular branch. `HEAD` has no parent until it is resolved.
    pub fn parent(self) -> Option<Revision> {
        self.number()
            .map(|number| Revision::Number(number.saturating_sub(1)))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Head => write!(f, "HEAD"),
            Revision::Number(number) => write!(f, "{}", number),
        }
    }
}

impl From<u64> for Revision {
    fn from(number: u64) -> Self {
        Revision::Number(number)
    }
}

impl Serialize for Revision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
