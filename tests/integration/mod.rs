//! Integration test suite for ccsettings
//!
//! End-to-end tests over real files in temporary directories: the
//! filesystem store, preset capture and application, and the `ccsettings`
//! binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **common**: `TestEnv`, an isolated home, project and config file
//! - **cli**: the `ccsettings` binary through `assert_cmd`
//! - **presets**: capture and apply against the filesystem store
//! - **store**: file locations, shared-file editing and parse failures

mod cli;
mod common;
mod presets;
mod store;
