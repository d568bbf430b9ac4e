//! Shared types, error model, and configuration for Prospector.
//!
//! This crate is the foundation depended on by all other Prospector crates.
//! It provides:
//! - [`ProspectorError`] — the unified error type
//! - Domain types ([`CandidateRecord`], [`Score`], [`Status`], [`PersistedProspect`])
//! - Configuration ([`AppConfig`], [`AcquisitionConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AcquisitionConfig, AppConfig, DefaultsConfig, DirectoryConfig, OracleConfig, SourceKind,
    StoreConfig, apply_env_overrides, config_dir, config_file_path, init_config, load_config,
    load_config_from, resolve_secret,
};
pub use error::{ProspectorError, Result};
pub use types::{
    CandidateRecord, FALLBACK_RATIONALE, FALLBACK_SCORE_VALUE, MAX_ISSUES, PersistedProspect,
    ProspectId, Score, Status,
};
