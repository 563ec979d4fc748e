use log::{debug, error, info};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

use crate::domain::{
    HostingApi, LocalSync, RepositoryRef, Year, has_copyright_notice, rewrite_year,
};

type BoxError = Box<dyn StdError + Send + Sync>;

/// Errors that stop the processing of a single repository
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The license file could not be fetched.
    #[error("failed to fetch {path}")]
    Fetch {
        path: String,
        #[source]
        source: BoxError,
    },

    /// The hosting API rejected the rewritten file.
    #[error("failed to update {path} through the API")]
    Update {
        path: String,
        #[source]
        source: BoxError,
    },

    /// Clone, stage, commit or push failed.
    #[error("failed to sync {path} through a local clone")]
    Sync {
        path: String,
        #[source]
        source: BoxError,
    },
}

impl RefreshError {
    /// Name of the pipeline stage that failed
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::Update { .. } => "update",
            Self::Sync { .. } => "sync",
        }
    }
}

/// What happened to one repository
#[derive(Debug)]
pub enum Outcome {
    /// The file was rewritten, written through the API and pushed from a local clone
    Updated,
    /// The repository has no license file at the configured path
    NoLicense,
    /// One of the stages failed; later stages were skipped
    Failed(RefreshError),
}

/// Outcome of the pipeline for one listed repository
#[derive(Debug)]
pub struct RepoReport {
    /// Repository the outcome belongs to
    pub repository: RepositoryRef,
    /// What happened to it
    pub outcome: Outcome,
}

/// Outcome counts across all processed repositories
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub updated: usize,
    pub missing: usize,
    pub failed: usize,
}

impl Summary {
    #[must_use]
    pub fn from_reports(reports: &[RepoReport]) -> Self {
        reports
            .iter()
            .fold(Self::default(), |mut summary, report| {
                let count = match report.outcome {
                    Outcome::Updated => &mut summary.updated,
                    Outcome::NoLicense => &mut summary.missing,
                    Outcome::Failed(_) => &mut summary.failed,
                };
                *count = count.saturating_add(1);
                summary
            })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} updated, {} without license, {} failed",
            self.updated, self.missing, self.failed
        )
    }
}

/// Path of the file relative to the repository root, as both the contents API and the
/// local index expect it.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// Commit message used for both the API write and the local commit.
#[must_use]
pub fn commit_message(path: &str, year: Year) -> String {
    format!("Update {path} to {year}")
}

/// Refresh the copyright year of `path` in every repository of `account`.
///
/// Repositories are processed one at a time, in listing order. A failure in one
/// repository is reported and processing moves on to the next.
///
/// # Errors
///
/// Returns the hosting error if the repositories cannot be listed.
pub fn run<H, S>(
    hosting: &H,
    sync: &S,
    account: &str,
    path: &str,
    year: Year,
) -> Result<Vec<RepoReport>, H::Error>
where
    H: HostingApi,
    S: LocalSync,
{
    let path = normalize_path(path);
    let repositories = hosting.list_repositories(account)?;
    info!("Found {} repositories for {account}", repositories.len());

    let reports: Vec<RepoReport> = repositories
        .into_iter()
        .map(|repository| {
            let outcome = match refresh_repository(hosting, sync, &repository, path, year) {
                Ok(outcome) => outcome,
                Err(e) => Outcome::Failed(e),
            };
            log_outcome(&repository, path, &outcome);
            RepoReport {
                repository,
                outcome,
            }
        })
        .collect();

    info!("{}", Summary::from_reports(&reports));
    Ok(reports)
}

/// Run the whole pipeline for one repository.
///
/// # Errors
///
/// Returns a [`RefreshError`] tagged with the stage that failed.
pub fn refresh_repository<H, S>(
    hosting: &H,
    sync: &S,
    repository: &RepositoryRef,
    path: &str,
    year: Year,
) -> Result<Outcome, RefreshError>
where
    H: HostingApi,
    S: LocalSync,
{
    let path = normalize_path(path);
    debug!("Fetching {path} from {repository}");
    let Some(blob) = hosting
        .fetch_file(repository, path)
        .map_err(|source| RefreshError::Fetch {
            path: path.to_owned(),
            source: Box::new(source),
        })?
    else {
        return Ok(Outcome::NoLicense);
    };

    if !has_copyright_notice(&blob.content) {
        debug!("{path} in {repository} has no copyright notice");
    }
    let content = rewrite_year(&blob.content, year);
    let message = commit_message(path, year);

    debug!("Writing {path} to {repository} at revision {}", blob.revision);
    hosting
        .update_file(repository, path, &content, &blob.revision, &message)
        .map_err(|source| RefreshError::Update {
            path: path.to_owned(),
            source: Box::new(source),
        })?;

    sync.sync(repository, path, &message)
        .map_err(|source| RefreshError::Sync {
            path: path.to_owned(),
            source: Box::new(source),
        })?;

    Ok(Outcome::Updated)
}

fn log_outcome(repository: &RepositoryRef, path: &str, outcome: &Outcome) {
    match outcome {
        Outcome::Updated => info!("Updated {path} in {repository}"),
        Outcome::NoLicense => info!("No {path} file found in {repository}"),
        Outcome::Failed(e) => error!("{repository} [{}]: {}", e.stage(), error_chain(e)),
    }
}

/// Render an error followed by each of its sources, separated by `: `.
#[must_use]
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
