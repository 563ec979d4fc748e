//! Refresh the copyright year of license files across a Github account.
//!
//! Each repository goes through the same pipeline: fetch the license file, rewrite
//! its `Copyright (c) YYYY` notice to the current year, write it back through the
//! contents API, then commit and push the same path from a transient local clone.

pub mod commands;
pub mod config;
pub mod domain;
pub mod infrastructure;
