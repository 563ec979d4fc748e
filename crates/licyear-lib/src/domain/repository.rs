use std::fmt;

/// A repository owned by the account being processed (e.g., "octocat/hello-world")
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    /// Login of the owning account
    pub owner: String,
    /// Repository name without the owner
    pub name: String,
    /// `owner/name`, the unique key on the platform
    pub full_name: String,
    /// HTTPS URL the local sync clones from and pushes to
    pub clone_url: String,
}

impl RepositoryRef {
    /// Create a repository reference, deriving the full name from owner and name.
    #[must_use]
    pub fn new(owner: &str, name: &str, clone_url: &str) -> Self {
        Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
            full_name: format!("{owner}/{name}"),
            clone_url: clone_url.to_owned(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.full_name
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)
    }
}
