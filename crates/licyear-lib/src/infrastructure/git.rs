//! Local clone, commit and push built on top of libgit2.

use git2::build::RepoBuilder;
use git2::{Commit, Cred, FetchOptions, PushOptions, RemoteCallbacks, Repository, Signature};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

use crate::domain::{LocalSync, RepositoryRef};

const REMOTE_NAME: &str = "origin";
const TOKEN_USERNAME: &str = "x-access-token";
const FALLBACK_NAME: &str = "licyear";
const FALLBACK_EMAIL: &str = "licyear@users.noreply.github.com";

/// Errors that can occur while syncing through a local clone
#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to prepare clone directory under {}", .root.display())]
    CloneRoot {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to clone {url}")]
    Clone {
        url: String,
        #[source]
        source: git2::Error,
    },

    #[error("failed to stage {path}")]
    Stage {
        path: String,
        #[source]
        source: git2::Error,
    },

    #[error("failed to commit {path}")]
    Commit {
        path: String,
        #[source]
        source: git2::Error,
    },

    #[error("failed to push {refname} to origin")]
    Push {
        refname: String,
        #[source]
        source: git2::Error,
    },

    #[error("origin rejected {refname}: {reason}")]
    PushRejected { refname: String, reason: String },
}

/// Callbacks answering HTTPS credential prompts with the token, once.
fn remote_callbacks(token: Option<&str>) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();
    if let Some(token) = token {
        let mut attempted = false;
        callbacks.credentials(move |_url, _username, _allowed| {
            // libgit2 keeps asking while the server refuses
            if attempted {
                return Err(git2::Error::from_str("credentials rejected"));
            }
            attempted = true;
            Cred::userpass_plaintext(TOKEN_USERNAME, token)
        });
    }
    callbacks
}

/// A transient working copy. The directory is deleted when the clone is dropped.
pub struct LocalClone {
    // Declared before `dir` so the repository handle closes first
    repo: Repository,
    dir: TempDir,
}

impl LocalClone {
    /// Root of the working copy
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn stage(&self, path: &str) -> Result<(), GitError> {
        let stage_err = |source| GitError::Stage {
            path: path.to_owned(),
            source,
        };
        let mut index = self.repo.index().map_err(stage_err)?;
        index.add_path(Path::new(path)).map_err(stage_err)?;
        index.write().map_err(stage_err)
    }

    /// Commit the index on top of HEAD. The commit is created even if the tree is unchanged.
    fn commit(&self, path: &str, message: &str) -> Result<git2::Oid, GitError> {
        let commit_err = |source| GitError::Commit {
            path: path.to_owned(),
            source,
        };
        let tree_id = self
            .repo
            .index()
            .and_then(|mut index| index.write_tree())
            .map_err(commit_err)?;
        let tree = self.repo.find_tree(tree_id).map_err(commit_err)?;
        let signature = self
            .repo
            .signature()
            .or_else(|_| Signature::now(FALLBACK_NAME, FALLBACK_EMAIL))
            .map_err(commit_err)?;
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&Commit<'_>> = parent.iter().collect();

        self.repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                message,
                &tree,
                &parents,
            )
            .map_err(commit_err)
    }

    fn push(&self, token: Option<&str>) -> Result<(), GitError> {
        let refname = self
            .repo
            .head()
            .ok()
            .and_then(|h| h.name().map(str::to_owned))
            .unwrap_or_else(|| "HEAD".to_owned());
        let push_err = |source| GitError::Push {
            refname: refname.clone(),
            source,
        };

        let mut remote = self.repo.find_remote(REMOTE_NAME).map_err(push_err)?;
        let refspec = format!("{refname}:{refname}");

        let mut rejection: Option<String> = None;
        {
            let mut callbacks = remote_callbacks(token);
            callbacks.push_update_reference(|_reference, status| {
                if let Some(reason) = status {
                    rejection = Some(reason.to_owned());
                }
                Ok(())
            });
            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);
            remote
                .push(&[refspec.as_str()], Some(&mut options))
                .map_err(push_err)?;
        }

        match rejection {
            Some(reason) => Err(GitError::PushRejected { refname, reason }),
            None => Ok(()),
        }
    }
}

/// Syncs changes by cloning each repository into a fresh directory under `clone_root`
#[derive(Debug, Clone)]
pub struct GitSync {
    clone_root: PathBuf,
    token: Option<String>,
}

impl GitSync {
    #[must_use]
    pub fn new(clone_root: PathBuf, token: Option<String>) -> Self {
        Self { clone_root, token }
    }

    #[must_use]
    pub fn clone_root(&self) -> &Path {
        &self.clone_root
    }

    /// Clone `repo` into a new, uniquely named directory under the clone root.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::CloneRoot`] if the directory cannot be created, or
    /// [`GitError::Clone`] if the clone fails. No directory is left behind on error.
    pub fn clone_repository(&self, repo: &RepositoryRef) -> Result<LocalClone, GitError> {
        let root_err = |source| GitError::CloneRoot {
            root: self.clone_root.clone(),
            source,
        };
        fs::create_dir_all(&self.clone_root).map_err(root_err)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", repo.name))
            .tempdir_in(&self.clone_root)
            .map_err(root_err)?;

        debug!("Cloning {repo} into {}", dir.path().display());

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks(self.token.as_deref()));

        let git_repo = RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(&repo.clone_url, dir.path())
            .map_err(|source| GitError::Clone {
                url: repo.clone_url.clone(),
                source,
            })?;

        Ok(LocalClone {
            repo: git_repo,
            dir,
        })
    }
}

impl LocalSync for GitSync {
    type Error = GitError;

    fn sync(&self, repo: &RepositoryRef, path: &str, message: &str) -> Result<(), GitError> {
        let clone = self.clone_repository(repo)?;

        debug!("Staging {path} in {}", clone.path().display());
        clone.stage(path)?;

        let oid = clone.commit(path, message)?;
        debug!("Committed {oid} in {repo}");

        clone.push(self.token.as_deref())?;
        debug!("Pushed {repo} to {REMOTE_NAME}");

        Ok(())
    }
}
