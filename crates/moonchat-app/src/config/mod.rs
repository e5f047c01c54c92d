pub mod credentials;

use anyhow::{bail, Context, Result};
use moonchat_llm_api::{normalize_api_base, DEFAULT_MODELS, DEFAULT_TEMPERATURE, MOONSHOT_API_URL};
use moonchat_types::MAX_RETRIES;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Optional settings file inside the data directory
pub const CONFIG_FILE_NAME: &str = "moonchat.toml";
pub const KEY_FILE_NAME: &str = "key.txt";
pub const BACKGROUND_FILE_NAME: &str = "background.txt";

/// One source of configuration; unset fields defer to lower layers
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub models: Option<Vec<String>>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub api_url: Option<String>,
    pub max_attempts: Option<u32>,
    pub background: Option<bool>,
    pub log: Option<bool>,
    pub background_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
}

impl ConfigLayer {
    /// Read a TOML settings file. A missing file is an empty layer.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Read `MOONCHAT_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let temperature = match get("MOONCHAT_TEMPERATURE") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<f32>()
                    .with_context(|| format!("MOONCHAT_TEMPERATURE is not a number: '{}'", raw))?,
            ),
            None => None,
        };
        let max_attempts = match get("MOONCHAT_MAX_ATTEMPTS") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u32>()
                    .with_context(|| format!("MOONCHAT_MAX_ATTEMPTS is not a number: '{}'", raw))?,
            ),
            None => None,
        };

        Ok(Self {
            models: get("MOONCHAT_MODELS").map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(ToString::to_string)
                    .collect()
            }),
            model: get("MOONCHAT_MODEL"),
            temperature,
            api_url: get("MOONCHAT_API_URL"),
            max_attempts,
            background: get("MOONCHAT_BACKGROUND").map(|raw| parse_flag("MOONCHAT_BACKGROUND", &raw)).transpose()?,
            log: get("MOONCHAT_LOG").map(|raw| parse_flag("MOONCHAT_LOG", &raw)).transpose()?,
            background_file: get("MOONCHAT_BACKGROUND_FILE").map(PathBuf::from),
            key_file: get("MOONCHAT_KEY_FILE").map(PathBuf::from),
        })
    }

    /// Settings given as command-line flags
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            models: None,
            model: cli.model.clone(),
            temperature: cli.temperature,
            api_url: cli.api_url.clone(),
            max_attempts: None,
            background: cli.no_background.then_some(false),
            log: cli.no_log.then_some(false),
            background_file: None,
            key_file: cli.key_file.clone(),
        }
    }

    /// Fields set in `higher` win over the ones in `self`
    pub fn overlay(self, higher: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            models: higher.models.or(self.models),
            model: higher.model.or(self.model),
            temperature: higher.temperature.or(self.temperature),
            api_url: higher.api_url.or(self.api_url),
            max_attempts: higher.max_attempts.or(self.max_attempts),
            background: higher.background.or(self.background),
            log: higher.log.or(self.log),
            background_file: higher.background_file.or(self.background_file),
            key_file: higher.key_file.or(self.key_file),
        }
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{} must be true or false, got '{}'", name, other),
    }
}

/// Effective configuration, fixed at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub models: Vec<String>,
    /// 0-based index into `models`
    pub active_model: usize,
    pub temperature: f32,
    pub api_url: String,
    pub max_attempts: u32,
    pub background_enabled: bool,
    pub log_enabled: bool,
    pub background_file: PathBuf,
    pub key_file: PathBuf,
    pub verbose: bool,
}

impl Settings {
    /// Precedence: CLI flags > `MOONCHAT_*` environment > `moonchat.toml` > defaults
    pub fn load(cli: &Cli, data_dir: &Path) -> Result<Self> {
        let layers = ConfigLayer::from_toml_file(&data_dir.join(CONFIG_FILE_NAME))?
            .overlay(ConfigLayer::from_env()?)
            .overlay(ConfigLayer::from_cli(cli));
        Self::resolve(data_dir, layers, cli.verbose)
    }

    /// Fill defaults and validate a merged configuration
    pub fn resolve(data_dir: &Path, layer: ConfigLayer, verbose: bool) -> Result<Self> {
        let mut models = layer
            .models
            .unwrap_or_else(|| DEFAULT_MODELS.iter().map(|m| m.to_string()).collect());
        if models.is_empty() {
            bail!("The model list is empty");
        }

        let active_model = match layer.model.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(choice) => select_model(&mut models, choice)?,
        };

        let temperature = layer.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            bail!("Temperature must be between 0 and 2, got {}", temperature);
        }

        let max_attempts = layer.max_attempts.unwrap_or(MAX_RETRIES);
        if max_attempts == 0 {
            bail!("max_attempts must be at least 1");
        }

        let resolve_path = |path: Option<PathBuf>, default: &str| match path {
            Some(path) if path.is_relative() => data_dir.join(path),
            Some(path) => path,
            None => data_dir.join(default),
        };

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            models,
            active_model,
            temperature,
            api_url: normalize_api_base(layer.api_url.as_deref().unwrap_or(MOONSHOT_API_URL)),
            max_attempts,
            background_enabled: layer.background.unwrap_or(true),
            log_enabled: layer.log.unwrap_or(true),
            background_file: resolve_path(layer.background_file, BACKGROUND_FILE_NAME),
            key_file: resolve_path(layer.key_file, KEY_FILE_NAME),
            verbose,
        })
    }

    pub fn current_model(&self) -> &str {
        &self.models[self.active_model]
    }
}

/// Index of `choice` in `models`, by name or 1-based position. Unknown names
/// are appended to the list.
fn select_model(models: &mut Vec<String>, choice: &str) -> Result<usize> {
    if let Some(index) = models.iter().position(|m| m == choice) {
        return Ok(index);
    }
    if let Ok(number) = choice.parse::<usize>() {
        if number == 0 || number > models.len() {
            bail!("Model number {} is out of range 1-{}", number, models.len());
        }
        return Ok(number - 1);
    }
    models.push(choice.to_string());
    Ok(models.len() - 1)
}
