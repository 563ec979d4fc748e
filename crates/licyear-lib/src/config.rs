use std::env;
use std::path::PathBuf;

use crate::infrastructure::GITHUB_API_BASE;

/// File refreshed in every repository unless overridden.
pub const DEFAULT_LICENSE_PATH: &str = "LICENSE";

/// Directory name used under the system temp dir for transient clones.
const CLONE_DIR_NAME: &str = "licyear";

/// Runtime settings loaded from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Github API token for authenticated requests and pushes
    pub github_token: Option<String>,
}

impl Settings {
    /// Load settings from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            github_token: env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }
}

/// All application configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Settings read from the environment
    pub settings: Settings,
    /// Account whose repositories are processed
    pub account: String,
    /// Path of the license file inside each repository
    pub license_path: String,
    /// Directory under which transient clones are created
    pub clone_root: PathBuf,
    /// Root URL of the Github REST API
    pub api_base: String,
}

impl Config {
    /// Configuration for `account` with the default path, clone root and API root
    #[must_use]
    pub fn new(account: &str, settings: Settings) -> Self {
        Self {
            settings,
            account: account.to_owned(),
            license_path: DEFAULT_LICENSE_PATH.to_owned(),
            clone_root: env::temp_dir().join(CLONE_DIR_NAME),
            api_base: GITHUB_API_BASE.to_owned(),
        }
    }

    #[must_use]
    pub fn with_license_path(mut self, path: &str) -> Self {
        self.license_path = path.to_owned();
        self
    }

    #[must_use]
    pub fn with_clone_root(mut self, root: PathBuf) -> Self {
        self.clone_root = root;
        self
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.to_owned();
        self
    }
}
