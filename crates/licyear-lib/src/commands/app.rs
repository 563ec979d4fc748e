use thiserror::Error;

use crate::config::Config;
use crate::domain::{Year, YearError};
use crate::infrastructure::{GitSync, GithubClient, GithubError};

use super::refresh::{self, Summary};

/// Errors that can occur during command orchestration
#[derive(Debug, Error)]
pub enum AppError {
    /// No account name was given.
    #[error("account name must not be empty")]
    EmptyAccount,

    /// The system clock does not report a usable year.
    #[error(transparent)]
    Year(#[from] YearError),

    /// The Github client could not be created or the repositories could not be listed.
    #[error(transparent)]
    Github(#[from] GithubError),
}

/// Run the refresh command for the configured account with the current year.
///
/// # Errors
///
/// Returns [`AppError::EmptyAccount`] if the account name is blank.
/// Returns [`AppError::Year`] if the current year cannot be determined.
/// Returns [`AppError::Github`] if the client cannot be created or listing fails.
pub fn refresh(config: &Config) -> Result<Summary, AppError> {
    let account = config.account.trim();
    if account.is_empty() {
        return Err(AppError::EmptyAccount);
    }

    let year = Year::current()?;
    let token = config.settings.github_token.clone();
    let hosting = GithubClient::with_api_base(token.clone(), &config.api_base)?;
    let sync = GitSync::new(config.clone_root.clone(), token);

    log::info!(
        "Refreshing {} in repositories of {account} to {year}",
        config.license_path
    );
    let reports = refresh::run(&hosting, &sync, account, &config.license_path, year)?;

    Ok(Summary::from_reports(&reports))
}
