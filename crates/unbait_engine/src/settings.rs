use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use unbait_logging::{unbait_info, unbait_warn};

use crate::{write_atomically, PersistError};

/// Used when the default prompt resource cannot be read.
pub const FALLBACK_PROMPT: &str = "This page has a clickbait title. You have been provided the content of the page in order to succinctly answer the clickbait title. Provide an answer that is at most one sentence long.";

/// Default prompt resource shipped with the engine.
pub const BUNDLED_DEFAULT_PROMPT: &str = include_str!("../assets/default_prompt.txt");

const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Provider {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
}

impl Provider {
    /// Example model id shown when editing settings.
    pub fn model_hint(self) -> &'static str {
        match self {
            Provider::OpenAi => "Enter model ID (e.g., gpt-4o-mini)",
            Provider::Anthropic => "Enter model ID (e.g., claude-3-5-haiku-20241022)",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Anthropic => write!(f, "anthropic"),
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            other => Err(format!(
                "unknown provider '{other}' (expected openai or anthropic)"
            )),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// Flat settings record. Absent fields take their defaults on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub system_prompt: String,
}

impl Settings {
    pub fn with_default_prompt(prompt: impl Into<String>) -> Self {
        Self {
            provider: Provider::default(),
            model: default_model(),
            api_key: String::new(),
            system_prompt: prompt.into(),
        }
    }

    /// API key with everything but the last four characters hidden.
    pub fn masked_api_key(&self) -> String {
        let count = self.api_key.chars().count();
        if count == 0 {
            return "(not set)".to_string();
        }
        let visible: String = self.api_key.chars().skip(count.saturating_sub(4)).collect();
        format!("{}{}", "*".repeat(count.saturating_sub(4)), visible)
    }

    fn fill_prompt(mut self, default_prompt: &str) -> Self {
        if self.system_prompt.trim().is_empty() {
            self.system_prompt = default_prompt.to_string();
        }
        self
    }
}

/// Partial edit applied by the settings command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub system_prompt: Option<String>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self == &SettingsUpdate::default()
    }

    pub fn apply(self, mut settings: Settings) -> Settings {
        if let Some(provider) = self.provider {
            settings.provider = provider;
        }
        if let Some(model) = self.model {
            settings.model = model;
        }
        if let Some(api_key) = self.api_key {
            settings.api_key = api_key;
        }
        if let Some(prompt) = self.system_prompt {
            settings.system_prompt = prompt;
        }
        settings
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings: {0}")]
    Io(#[from] io::Error),
    #[error("cannot parse settings: {0}")]
    Parse(String),
    #[error("cannot encode settings: {0}")]
    Encode(String),
    #[error("cannot write settings: {0}")]
    Persist(#[from] PersistError),
}

pub trait SettingsStore: Send + Sync {
    /// Settings used when nothing is stored or the store is unreadable.
    fn defaults(&self) -> Settings;

    /// Current settings with defaults applied to absent fields.
    fn load(&self) -> Result<Settings, SettingsError>;

    /// Persist `settings`; an empty system prompt is stored as the default prompt.
    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Settings kept in a RON file.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
    default_prompt: String,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>, default_prompt: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            default_prompt: default_prompt.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn default_prompt(&self) -> &str {
        &self.default_prompt
    }
}

impl SettingsStore for FileSettingsStore {
    fn defaults(&self) -> Settings {
        Settings::with_default_prompt(self.default_prompt.clone())
    }

    fn load(&self) -> Result<Settings, SettingsError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(self.defaults()),
            Err(err) => return Err(err.into()),
        };
        let settings: Settings =
            ron::from_str(&text).map_err(|err| SettingsError::Parse(err.to_string()))?;
        Ok(settings.fill_prompt(&self.default_prompt))
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let settings = settings.clone().fill_prompt(&self.default_prompt);
        let text = ron::ser::to_string_pretty(&settings, ron::ser::PrettyConfig::new())
            .map_err(|err| SettingsError::Encode(err.to_string()))?;
        write_atomically(&self.path, &text)?;
        unbait_info!("Saved settings to {:?}", self.path);
        Ok(())
    }
}

/// In-process settings, for embedding and tests.
#[derive(Debug)]
pub struct MemorySettingsStore {
    current: Mutex<Option<Settings>>,
    default_prompt: String,
}

impl MemorySettingsStore {
    pub fn new(default_prompt: impl Into<String>) -> Self {
        Self {
            current: Mutex::new(None),
            default_prompt: default_prompt.into(),
        }
    }

    pub fn with_settings(settings: Settings) -> Self {
        let store = Self::new(FALLBACK_PROMPT);
        *store.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(settings);
        store
    }
}

impl SettingsStore for MemorySettingsStore {
    fn defaults(&self) -> Settings {
        Settings::with_default_prompt(self.default_prompt.clone())
    }

    fn load(&self) -> Result<Settings, SettingsError> {
        let current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Ok(current.map_or_else(|| self.defaults(), |s| s.fill_prompt(&self.default_prompt)))
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let settings = settings.clone().fill_prompt(&self.default_prompt);
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(settings);
        Ok(())
    }
}

/// Read the default prompt resource.
///
/// `None` selects the bundled prompt; an unreadable or empty file yields [`FALLBACK_PROMPT`].
pub fn load_default_prompt(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return BUNDLED_DEFAULT_PROMPT.trim_end().to_string();
    };
    match fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => text.trim_end().to_string(),
        Ok(_) => {
            unbait_warn!("Default prompt file {:?} is empty; using fallback", path);
            FALLBACK_PROMPT.to_string()
        }
        Err(err) => {
            unbait_warn!("Error loading default prompt from {:?}: {}", path, err);
            FALLBACK_PROMPT.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = FileSettingsStore::new(temp.path().join("settings.ron"), "prompt");
        let settings = store.load().unwrap();
        assert_eq!(settings, Settings::with_default_prompt("prompt"));
        assert_eq!(settings.provider, Provider::OpenAi);
        assert_eq!(settings.model, "gpt-4o-mini");
        assert!(settings.api_key.is_empty());
    }

    #[test]
    fn partial_file_is_merged_with_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("settings.ron");
        fs::write(&path, r#"(provider: anthropic, api_key: "sk-test")"#).unwrap();

        let settings = FileSettingsStore::new(&path, "prompt").load().unwrap();
        assert_eq!(settings.provider, Provider::Anthropic);
        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.system_prompt, "prompt");
    }

    #[test]
    fn save_then_load_restores_and_fills_empty_prompt() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = FileSettingsStore::new(temp.path().join("settings.ron"), "default");
        let mut settings = store.defaults();
        settings.api_key = "key".into();
        settings.system_prompt = "   ".into();

        store.save(&settings).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.api_key, "key");
        assert_eq!(loaded.system_prompt, "default");
    }

    #[test]
    fn garbage_file_is_a_parse_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("settings.ron");
        fs::write(&path, "not ron at all {").unwrap();
        let err = FileSettingsStore::new(&path, "p").load().unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("OpenAI".parse::<Provider>(), Ok(Provider::OpenAi));
        assert_eq!("anthropic".parse::<Provider>(), Ok(Provider::Anthropic));
        assert!("gemini".parse::<Provider>().is_err());
    }

    #[test]
    fn api_key_is_masked() {
        let mut settings = Settings::with_default_prompt("p");
        assert_eq!(settings.masked_api_key(), "(not set)");
        settings.api_key = "sk-abcdef1234".into();
        assert_eq!(settings.masked_api_key(), "*********1234");
    }

    #[test]
    fn update_only_touches_given_fields() {
        let base = Settings::with_default_prompt("p");
        let updated = SettingsUpdate {
            model: Some("gpt-4o".into()),
            ..SettingsUpdate::default()
        }
        .apply(base.clone());
        assert_eq!(updated.model, "gpt-4o");
        assert_eq!(updated.provider, base.provider);
        assert_eq!(updated.system_prompt, base.system_prompt);
    }

    #[test]
    fn unreadable_prompt_file_uses_fallback() {
        let temp = tempfile::TempDir::new().unwrap();
        let prompt = load_default_prompt(Some(&temp.path().join("missing.txt")));
        assert_eq!(prompt, FALLBACK_PROMPT);
        assert!(load_default_prompt(None).contains("clickbait"));
    }
}
