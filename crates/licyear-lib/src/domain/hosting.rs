use std::error::Error;

use super::{FileBlob, RepositoryRef, RevisionToken};

/// Trait for the repository hosting platform's REST surface
pub trait HostingApi {
    type Error: Error + Send + Sync + 'static;

    /// List every repository owned by `account`, in the order the platform returns them
    ///
    /// # Errors
    ///
    /// Returns an error if the platform answers with a non-success status
    fn list_repositories(&self, account: &str) -> Result<Vec<RepositoryRef>, Self::Error>;

    /// Fetch a file and its revision token, or `None` if the file does not exist
    ///
    /// # Errors
    ///
    /// Returns an error for any non-success status other than not-found
    fn fetch_file(&self, repo: &RepositoryRef, path: &str)
    -> Result<Option<FileBlob>, Self::Error>;

    /// Overwrite a file, creating one commit with `message` on the hosted history
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejects the write, e.g. because `revision` is stale
    fn update_file(
        &self,
        repo: &RepositoryRef,
        path: &str,
        content: &str,
        revision: &RevisionToken,
        message: &str,
    ) -> Result<(), Self::Error>;
}

/// Trait for committing a path through a short-lived local clone
pub trait LocalSync {
    type Error: Error + Send + Sync + 'static;

    /// Clone `repo`, stage `path`, commit with `message` and push to the default remote.
    /// The working copy must be gone when this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if cloning, staging, committing or pushing fails
    fn sync(&self, repo: &RepositoryRef, path: &str, message: &str) -> Result<(), Self::Error>;
}
