pub mod encoding;
pub mod git;
pub mod github;

pub use encoding::{DecodeError, decode_content, encode_content};
pub use git::{GitError, GitSync, LocalClone};
pub use github::{GITHUB_API_BASE, GithubClient, GithubError};
