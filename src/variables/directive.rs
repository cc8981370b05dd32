//! Save directives
//!
//! A directive tells the validator which response keys to copy into the
//! variable store: `source->destination`, a bare `name`, or `.` to match
//! every expected key.

use std::fmt;

const ARROW: &str = "->";
const ANY_KEY: &str = ".";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Source {
    AnyKey,
    Key(String),
}

/// Parsed form of one `variables_to_save` entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveDirective {
    source: Source,
    destination: Option<String>,
}

impl SaveDirective {
    /// Parse a raw directive. Returns `None` when there is no usable source.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (source, destination) = match raw.split_once(ARROW) {
            Some((source, destination)) => (source.trim(), destination.trim()),
            None => (raw, ""),
        };

        if source.is_empty() {
            return None;
        }

        let source = if source == ANY_KEY {
            Source::AnyKey
        } else {
            Source::Key(source.to_string())
        };
        let destination = (!destination.is_empty()).then(|| destination.to_string());

        Some(Self {
            source,
            destination,
        })
    }

    /// Variable name to write when the response key `key` matches this
    /// directive
    pub fn target_for<'a>(&'a self, key: &'a str) -> Option<&'a str> {
        let matches = match &self.source {
            Source::AnyKey => true,
            Source::Key(source) => source == key,
        };

        matches.then(|| self.destination.as_deref().unwrap_or(key))
    }
}

impl fmt::Display for SaveDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::AnyKey => write!(f, "{ANY_KEY}")?,
            Source::Key(key) => write!(f, "{key}")?,
        }
        if let Some(destination) = &self.destination {
            write!(f, "{ARROW}{destination}")?;
        }
        Ok(())
    }
}
