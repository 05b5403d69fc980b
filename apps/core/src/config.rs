//! Engine configuration.
//!
//! Everything the engine decides with (keyword tiers, knowledge base, roster, timing
//! table, cache and assistant settings) is data loaded once at startup. The built-in
//! defaults reproduce the reference service desk.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use validator::Validate;

use crate::assignment::Handler;
use crate::classify::PriorityKeywords;
use crate::error::{DeskError, Result};
use crate::estimate::{EstimatorSettings, ResolutionTimeEntry};
use crate::models::Category;
use crate::resolve::KnowledgeEntry;

/// Path of the JSON configuration file.
pub const CONFIG_PATH_VAR: &str = "DESK_CONFIG";
pub const ASSISTANT_URL_VAR: &str = "DESK_ASSISTANT_URL";
pub const ASSISTANT_TOKEN_VAR: &str = "DESK_ASSISTANT_TOKEN";
pub const ASSISTANT_TIMEOUT_VAR: &str = "DESK_ASSISTANT_TIMEOUT_MS";
pub const CACHE_TTL_VAR: &str = "DESK_CACHE_TTL_SECS";

/// Resolution cache tuning.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CacheSettings {
    /// Lifetime of a cached resolution, at most one year.
    #[validate(range(min = 1, max = 31_536_000))]
    pub ttl_secs: u64,
    /// Maximum number of live entries; least recently used entries are dropped first.
    #[validate(range(min = 1))]
    pub capacity: usize,
    /// How many characters of the normalized title go into the cache key.
    #[validate(range(min = 1))]
    pub title_prefix_chars: usize,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            capacity: 1024,
            title_prefix_chars: 50,
        }
    }
}

/// Settings for the generative resolution assistant.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AssistantSettings {
    /// Base URL of an OpenAI-compatible server. `None` disables the assistant.
    pub endpoint: Option<String>,
    pub auth_token: Option<String>,
    #[validate(length(min = 1))]
    pub model: String,
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    pub max_tokens: u32,
    /// Hard deadline for a single suggestion, enforced by the pipeline.
    #[validate(range(min = 1))]
    pub timeout_ms: u64,
    /// Phrases marking a reply as "needs a human" rather than a usable resolution.
    pub escalation_phrases: Vec<String>,
}

impl AssistantSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            auth_token: None,
            model: "gpt-4".to_string(),
            temperature: 0.3,
            max_tokens: 300,
            timeout_ms: 10_000,
            escalation_phrases: vec!["contact it".to_string(), "admin required".to_string()],
        }
    }
}

/// Top-level configuration for the intake engine.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DeskConfig {
    pub priority_keywords: PriorityKeywords,
    pub knowledge_base: Vec<KnowledgeEntry>,
    #[validate(length(min = 1))]
    pub roster: Vec<Handler>,
    pub resolution_times: Vec<ResolutionTimeEntry>,
    #[validate(nested)]
    pub estimator: EstimatorSettings,
    #[validate(nested)]
    pub cache: CacheSettings,
    #[validate(nested)]
    pub assistant: AssistantSettings,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            priority_keywords: PriorityKeywords::default(),
            knowledge_base: KnowledgeEntry::defaults(),
            roster: default_roster(),
            resolution_times: ResolutionTimeEntry::defaults(),
            estimator: EstimatorSettings::default(),
            cache: CacheSettings::default(),
            assistant: AssistantSettings::default(),
        }
    }
}

fn default_roster() -> Vec<Handler> {
    vec![
        Handler::new(
            "john.doe@company.com",
            [Category::Hardware, Category::Network],
            10,
            5,
        ),
        Handler::new(
            "jane.smith@company.com",
            [Category::Software, Category::Email],
            12,
            3,
        ),
        Handler::new(
            "bob.wilson@company.com",
            [Category::Access, Category::Network],
            8,
            7,
        ),
    ]
}

impl DeskConfig {
    /// Loads configuration the way the binary does at startup.
    ///
    /// Reads `.env` if present, then the JSON file named by `DESK_CONFIG` (built-in
    /// defaults otherwise), then applies environment overrides and validates.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => {
                info!("{} not set, using built-in configuration", CONFIG_PATH_VAR);
                Self::default()
            }
        };
        config.apply_env_overrides();
        config.check()?;
        Ok(config)
    }

    /// Parses a JSON configuration file. Missing sections fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DeskError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: DeskConfig = serde_json::from_str(&raw)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var(ASSISTANT_URL_VAR) {
            self.assistant.endpoint = Some(url);
        }
        if let Ok(token) = env::var(ASSISTANT_TOKEN_VAR) {
            self.assistant.auth_token = Some(token);
        }
        if let Some(ms) = parse_var::<u64>(ASSISTANT_TIMEOUT_VAR) {
            self.assistant.timeout_ms = ms;
        }
        if let Some(secs) = parse_var::<u64>(CACHE_TTL_VAR) {
            self.cache.ttl_secs = secs;
        }
    }

    /// Field-level validation plus the roster rules `validator` cannot express.
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        let mut seen = HashSet::new();
        for handler in &self.roster {
            if handler.max_load == 0 {
                return Err(DeskError::Config(format!(
                    "handler {} has a max load of zero",
                    handler.id
                )));
            }
            if !seen.insert(handler.id.as_str()) {
                return Err(DeskError::Config(format!(
                    "handler {} is listed twice",
                    handler.id
                )));
            }
        }
        for entry in &self.knowledge_base {
            if entry.keywords.is_empty() {
                return Err(DeskError::Config(format!(
                    "knowledge base entry {} has no keywords",
                    entry.issue_type
                )));
            }
            if entry.resolution.trim().is_empty() {
                return Err(DeskError::Config(format!(
                    "knowledge base entry {} has an empty resolution",
                    entry.issue_type
                )));
            }
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid number", name, raw);
            None
        }
    }
}
