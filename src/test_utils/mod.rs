//! Test utilities for ccsettings
//!
//! Logging setup plus small builders for the documents the engine consumes.
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration tests.
//!
//! ```rust,no_run
//! use ccsettings_cli::settings::Scope;
//! use ccsettings_cli::test_utils::{documents, permissions};
//!
//! let docs = documents(&[(Scope::User, permissions(&["Read"], &[], &[]))]);
//! ```

use serde_json::Value;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::mcp::{McpServerConfig, ServerMap};
use crate::settings::{PermissionsConfig, Scope, ScopeDocuments, SettingsDocument};

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests, once per process.
///
/// Uses `level` if given, otherwise `RUST_LOG`. With neither, nothing is
/// installed.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A settings document from JSON. Panics on invalid input.
#[must_use]
pub fn document(value: Value) -> SettingsDocument {
    serde_json::from_value(value).expect("test document must deserialize")
}

/// A document holding only a permissions block.
#[must_use]
pub fn permissions(allow: &[&str], deny: &[&str], ask: &[&str]) -> SettingsDocument {
    let owned = |rules: &[&str]| rules.iter().map(|r| (*r).to_string()).collect();
    SettingsDocument {
        permissions: Some(PermissionsConfig {
            allow: owned(allow),
            deny: owned(deny),
            ask: owned(ask),
            ..PermissionsConfig::default()
        }),
        ..SettingsDocument::default()
    }
}

/// Scope documents from `(scope, document)` pairs.
#[must_use]
pub fn documents(entries: &[(Scope, SettingsDocument)]) -> ScopeDocuments {
    entries
        .iter()
        .fold(ScopeDocuments::default(), |docs, (scope, doc)| docs.with(*scope, doc.clone()))
}

/// A server map of process servers, one per name, each running `npx <name>`.
#[must_use]
pub fn servers(names: &[&str]) -> ServerMap {
    names
        .iter()
        .map(|name| ((*name).to_string(), McpServerConfig::process("npx", vec![(*name).to_string()])))
        .collect()
}
