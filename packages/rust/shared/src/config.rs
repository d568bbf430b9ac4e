//! Application configuration for Prospector.
//!
//! User config lives at `~/.prospector/prospector.toml`.
//! Environment overrides are applied on top of the file, and CLI flags
//! override both.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProspectorError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "prospector.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".prospector";

// ---------------------------------------------------------------------------
// Config structs (matching prospector.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pipeline defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Judgment oracle endpoint.
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Prospect store connection.
    #[serde(default)]
    pub store: StoreConfig,

    /// Candidate acquisition.
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Maximum candidates processed per discovery batch.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Minimum composite for drafting outreach during batch discovery.
    #[serde(default = "default_batch_draft_threshold")]
    pub batch_draft_threshold: u8,

    /// Minimum composite for drafting outreach for a single analysis.
    #[serde(default = "default_single_draft_threshold")]
    pub single_draft_threshold: u8,

    /// Minimum composite for a prospect to be reported as qualified.
    #[serde(default = "default_report_threshold")]
    pub report_threshold: u8,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            batch_draft_threshold: default_batch_draft_threshold(),
            single_draft_threshold: default_single_draft_threshold(),
            report_threshold: default_report_threshold(),
        }
    }
}

fn default_max_results() -> usize {
    10
}
fn default_batch_draft_threshold() -> u8 {
    70
}
fn default_single_draft_threshold() -> u8 {
    60
}
fn default_report_threshold() -> u8 {
    60
}

/// `[oracle]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    #[serde(default = "default_oracle_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout.
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: default_oracle_endpoint(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            timeout_secs: default_oracle_timeout(),
        }
    }
}

fn default_oracle_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_model() -> String {
    "gpt-4".into()
}
fn default_oracle_timeout() -> u64 {
    60
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Local database path, or a `libsql://` / `https://` URL for a remote database.
    #[serde(default = "default_database")]
    pub database: String,

    /// Name of the env var holding the remote auth token.
    #[serde(default = "default_auth_token_env")]
    pub auth_token_env: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            auth_token_env: default_auth_token_env(),
        }
    }
}

fn default_database() -> String {
    "~/.prospector/prospects.db".into()
}
fn default_auth_token_env() -> String {
    "PROSPECTOR_DB_TOKEN".into()
}

impl StoreConfig {
    /// Whether `database` names a remote database rather than a local file.
    pub fn is_remote(&self) -> bool {
        self.database.starts_with("libsql://") || self.database.starts_with("https://")
    }

    /// Resolve the local database path, expanding a leading `~/`.
    pub fn local_path(&self) -> Result<PathBuf> {
        match self.database.strip_prefix("~/") {
            Some(rest) => {
                let home = dirs::home_dir().ok_or_else(|| {
                    ProspectorError::config("could not determine home directory")
                })?;
                Ok(home.join(rest))
            }
            None => Ok(PathBuf::from(&self.database)),
        }
    }
}

/// Which source adapter a discovery batch uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Built-in deterministic catalog, no network.
    Sample,
    /// Live web directory search.
    Web,
}

impl std::str::FromStr for SourceKind {
    type Err = ProspectorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sample" => Ok(Self::Sample),
            "web" => Ok(Self::Web),
            other => Err(ProspectorError::config(format!(
                "unknown source '{other}': expected 'sample' or 'web'"
            ))),
        }
    }
}

/// `[acquisition]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Source adapter used by `discover`.
    #[serde(default = "default_source")]
    pub source: SourceKind,

    /// Lower bound of the randomized delay between network requests.
    #[serde(default = "default_delay_min")]
    pub delay_min_ms: u64,

    /// Upper bound of the randomized delay between network requests.
    #[serde(default = "default_delay_max")]
    pub delay_max_ms: u64,

    /// User-Agent header for acquisition requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout.
    #[serde(default = "default_acquisition_timeout")]
    pub timeout_secs: u64,

    /// Fetch each candidate's website to fill description and tech indicators.
    #[serde(default = "default_true")]
    pub profile_websites: bool,

    /// Web directory search settings.
    #[serde(default)]
    pub directory: DirectoryConfig,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            delay_min_ms: default_delay_min(),
            delay_max_ms: default_delay_max(),
            user_agent: default_user_agent(),
            timeout_secs: default_acquisition_timeout(),
            profile_websites: true,
            directory: DirectoryConfig::default(),
        }
    }
}

fn default_source() -> SourceKind {
    SourceKind::Sample
}
fn default_delay_min() -> u64 {
    2000
}
fn default_delay_max() -> u64 {
    4000
}
fn default_user_agent() -> String {
    concat!("Prospector/", env!("CARGO_PKG_VERSION")).into()
}
fn default_acquisition_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

/// `[acquisition.directory]`: where and how to read a company directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Search URL template; `{term}` is replaced by the URL-encoded term.
    #[serde(default)]
    pub search_url: String,

    /// Selector matching one listing entry.
    #[serde(default = "default_entry_selector")]
    pub entry_selector: String,
    #[serde(default = "default_company_selector")]
    pub company_selector: String,
    #[serde(default = "default_industry_selector")]
    pub industry_selector: String,
    #[serde(default = "default_size_selector")]
    pub size_selector: String,
    #[serde(default = "default_description_selector")]
    pub description_selector: String,
    /// Anchor whose `href` is the company website.
    #[serde(default = "default_website_selector")]
    pub website_selector: String,
    /// Elements holding job-posting excerpts.
    #[serde(default = "default_posting_selector")]
    pub posting_selector: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            search_url: String::new(),
            entry_selector: default_entry_selector(),
            company_selector: default_company_selector(),
            industry_selector: default_industry_selector(),
            size_selector: default_size_selector(),
            description_selector: default_description_selector(),
            website_selector: default_website_selector(),
            posting_selector: default_posting_selector(),
        }
    }
}

fn default_entry_selector() -> String {
    ".company-card".into()
}
fn default_company_selector() -> String {
    ".company-name".into()
}
fn default_industry_selector() -> String {
    ".company-industry".into()
}
fn default_size_selector() -> String {
    ".company-size".into()
}
fn default_description_selector() -> String {
    ".company-description".into()
}
fn default_website_selector() -> String {
    "a.company-website".into()
}
fn default_posting_selector() -> String {
    ".job-posting".into()
}

impl AppConfig {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("batch_draft_threshold", self.defaults.batch_draft_threshold),
            ("single_draft_threshold", self.defaults.single_draft_threshold),
            ("report_threshold", self.defaults.report_threshold),
        ] {
            if value > 100 {
                return Err(ProspectorError::config(format!(
                    "{name} must be between 0 and 100, got {value}"
                )));
            }
        }

        if self.acquisition.delay_min_ms > self.acquisition.delay_max_ms {
            return Err(ProspectorError::config(format!(
                "delay_min_ms ({}) must not exceed delay_max_ms ({})",
                self.acquisition.delay_min_ms, self.acquisition.delay_max_ms
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.prospector/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ProspectorError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.prospector/prospector.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk and apply environment overrides.
/// Uses defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    let mut config = if path.exists() {
        load_config_from(&path)?
    } else {
        tracing::debug!(?path, "config file not found, using defaults");
        AppConfig::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ProspectorError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ProspectorError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Apply `PROSPECTOR_*` overrides using `lookup` to read variables.
pub fn apply_env_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(endpoint) = lookup("PROSPECTOR_ORACLE_ENDPOINT") {
        config.oracle.endpoint = endpoint;
    }
    if let Some(model) = lookup("PROSPECTOR_ORACLE_MODEL") {
        config.oracle.model = model;
    }
    if let Some(database) = lookup("PROSPECTOR_DATABASE") {
        config.store.database = database;
    }
    if let Some(value) = lookup("PROSPECTOR_DELAY_MIN_MS") {
        config.acquisition.delay_min_ms = parse_millis("PROSPECTOR_DELAY_MIN_MS", &value)?;
    }
    if let Some(value) = lookup("PROSPECTOR_DELAY_MAX_MS") {
        config.acquisition.delay_max_ms = parse_millis("PROSPECTOR_DELAY_MAX_MS", &value)?;
    }
    Ok(())
}

fn parse_millis(var: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| ProspectorError::config(format!("{var} must be a number of milliseconds, got '{value}'")))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ProspectorError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ProspectorError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ProspectorError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a credential from the env var named `var_name`.
pub fn resolve_secret(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(ProspectorError::config(format!(
            "credential not found. Set the {var_name} environment variable."
        ))),
    }
}
