use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::assistant::prompt::PromptVariant;
use crate::sheets::normalize::clean_column_name;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub columns: ColumnsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Remote spreadsheet holding the Plans, Included Features and Extras sheets
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SheetsConfig {
    #[serde(default = "default_sheets_base_url")]
    pub base_url: String,
    pub spreadsheet_id: String,
    #[serde(default = "default_plans_sheet")]
    pub plans_sheet: String,
    #[serde(default = "default_included_sheet")]
    pub included_sheet: String,
    #[serde(default = "default_extras_sheet")]
    pub extras_sheet: String,

    /// How long a loaded snapshot is served without refetching
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,

    /// Extra time a stale snapshot may be served while refreshes keep failing
    #[serde(default = "default_max_stale")]
    pub max_stale_seconds: u64,

    #[serde(default = "default_sheets_timeout")]
    pub timeout_seconds: u64,
}

impl SheetsConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn max_stale(&self) -> Duration {
        Duration::from_secs(self.max_stale_seconds)
    }
}

/// Column names used to read the sheets. Matched case-insensitively.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub title: String,
    pub price: String,
    pub description: String,
    pub responsible: String,
    pub category: String,
    pub authority: String,
    pub multiplier: String,
    pub range: String,
    pub notes: String,

    /// Feature-name column of the Plans sheet
    pub plan_feature: String,
    /// Columns containing this stem are not plan columns
    pub plan_feature_stem: String,
    /// Substring marking a feature as included in a plan
    pub presence_marker: String,

    pub included_category: String,
    pub included_detail: String,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            title: "TITOLO".to_string(),
            price: "PREZZO".to_string(),
            description: "DESCRIZIONE".to_string(),
            responsible: "RESPONSABILE".to_string(),
            category: "CATEGORIA".to_string(),
            authority: "ENTE".to_string(),
            multiplier: "MOLTIPLICATORE".to_string(),
            range: "RANGE".to_string(),
            notes: "NOTE".to_string(),
            plan_feature: "FUNZIONALITA'".to_string(),
            plan_feature_stem: "FUNZIONALITA".to_string(),
            presence_marker: "✅".to_string(),
            included_category: "CATEGORIA".to_string(),
            included_detail: "DETTAGLIO".to_string(),
        }
    }
}

impl ColumnsConfig {
    /// Name of the derived column holding the title without emphasis markup
    pub fn title_clean(&self) -> String {
        clean_column_name(&self.title)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_tabs")]
    pub tabs: Vec<TabConfig>,
    #[serde(default = "default_feature_details")]
    pub feature_details: Vec<FeatureDetailRule>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            tabs: default_tabs(),
            feature_details: default_feature_details(),
        }
    }
}

/// A catalog tab restricting extras by responsible party.
/// An empty `responsible` list shows every extra.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TabConfig {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub responsible: Vec<String>,
}

/// Plan features whose name contains `feature` (case-sensitive) list the included-feature
/// details whose category contains any of `categories`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureDetailRule {
    pub feature: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantConfig {
    /// Off unless configured; the catalog works without an API key
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_assistant_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_assistant_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub prompt_variant: PromptVariant,

    /// Chat sessions idle for longer than this are dropped
    #[serde(default = "default_session_idle")]
    pub session_idle_seconds: u64,
}

impl AssistantConfig {
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_seconds)
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_assistant_base_url(),
            api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_seconds: default_assistant_timeout(),
            prompt_variant: PromptVariant::default(),
            session_idle_seconds: default_session_idle(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_sheets_base_url() -> String {
    "https://docs.google.com/spreadsheets/d".to_string()
}

fn default_plans_sheet() -> String {
    "Piani".to_string()
}

fn default_included_sheet() -> String {
    "Funzionalità incluse".to_string()
}

fn default_extras_sheet() -> String {
    "Extra".to_string()
}

fn default_cache_ttl() -> u64 {
    60
}

fn default_max_stale() -> u64 {
    300
}

fn default_sheets_timeout() -> u64 {
    30
}

fn default_tabs() -> Vec<TabConfig> {
    vec![
        TabConfig {
            id: "all".to_string(),
            label: "All".to_string(),
            responsible: vec![],
        },
        TabConfig {
            id: "hr-jet".to_string(),
            label: "HR Jet".to_string(),
            responsible: vec!["SERVICE".to_string(), "SPECIALIST".to_string()],
        },
        TabConfig {
            id: "consultant".to_string(),
            label: "Consulente".to_string(),
            responsible: vec!["CONSULENTE".to_string()],
        },
    ]
}

fn default_feature_details() -> Vec<FeatureDetailRule> {
    vec![
        FeatureDetailRule {
            feature: "Payroll all-inclusive".to_string(),
            categories: vec![
                "ADEMPIMENTI".to_string(),
                "PAGHE".to_string(),
                "CONTABILE".to_string(),
            ],
        },
        FeatureDetailRule {
            feature: "Consulente del Lavoro dedicato".to_string(),
            categories: vec!["CONSULENZA".to_string()],
        },
    ]
}

fn default_assistant_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_assistant_timeout() -> u64 {
    60
}

fn default_session_idle() -> u64 {
    7200
}

/// Load configuration from `path`, with `PRICING_DESK__*` environment overrides
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(config::Environment::with_prefix("PRICING_DESK").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.sheets.spreadsheet_id.trim().is_empty() {
        anyhow::bail!("sheets.spreadsheet_id cannot be empty");
    }

    if cfg.sheets.cache_ttl_seconds == 0 {
        anyhow::bail!("sheets.cache_ttl_seconds must be greater than zero");
    }

    let sheet_names = [
        &cfg.sheets.plans_sheet,
        &cfg.sheets.included_sheet,
        &cfg.sheets.extras_sheet,
    ];
    if sheet_names.iter().any(|name| name.trim().is_empty()) {
        anyhow::bail!("Sheet names cannot be empty");
    }

    match cfg.server.log_format.as_str() {
        "json" | "text" => {}
        other => anyhow::bail!("Invalid log format '{}': expected 'json' or 'text'", other),
    }

    let mut tab_ids = HashSet::new();
    for tab in &cfg.catalog.tabs {
        if tab.id.trim().is_empty() {
            anyhow::bail!("Catalog tab id cannot be empty");
        }
        if !tab_ids.insert(tab.id.as_str()) {
            anyhow::bail!("Duplicate catalog tab id: {}", tab.id);
        }
    }

    if cfg.assistant.enabled {
        if cfg.assistant.api_key.trim().is_empty() {
            anyhow::bail!("assistant.api_key is required when the assistant is enabled");
        }
        if !(0.0..=2.0).contains(&cfg.assistant.temperature) {
            anyhow::bail!(
                "assistant.temperature must be between 0.0 and 2.0, got {}",
                cfg.assistant.temperature
            );
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) fn create_test_config() -> Config {
    Config {
        server: ServerConfig::default(),
        sheets: SheetsConfig {
            base_url: default_sheets_base_url(),
            spreadsheet_id: "sheet-123".to_string(),
            plans_sheet: default_plans_sheet(),
            included_sheet: default_included_sheet(),
            extras_sheet: default_extras_sheet(),
            cache_ttl_seconds: 60,
            max_stale_seconds: 300,
            timeout_seconds: 30,
        },
        columns: ColumnsConfig::default(),
        catalog: CatalogConfig::default(),
        assistant: AssistantConfig {
            enabled: true,
            api_key: "gsk-test-key-1234567890".to_string(),
            ..AssistantConfig::default()
        },
    }
}
