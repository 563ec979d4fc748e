use std::fmt;

/// Opaque identifier of the stored version of a file (the blob SHA on GitHub)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevisionToken(pub String);

impl RevisionToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RevisionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RevisionToken {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A fetched file with its decoded text and the revision it was read at.
///
/// A missing file is never represented by a blob: fetchers return `None` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    /// Decoded text of the file
    pub content: String,
    /// Revision the content was read at, required to overwrite it
    pub revision: RevisionToken,
}

impl FileBlob {
    #[must_use]
    pub fn new(content: String, revision: RevisionToken) -> Self {
        Self { content, revision }
    }
}
