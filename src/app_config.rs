//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use workshop_core::WorkshopId;
use workshop_core::download::{MAX_CONCURRENCY, MIN_CONCURRENCY};

/// Highest accepted `max_retries`.
pub const MAX_RETRIES_LIMIT: u8 = 10;

/// File configuration for workshop-dl defaults.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// Default destination for downloaded items.
    pub output_dir: Option<PathBuf>,
    /// Steam app id of the game whose items are downloaded.
    pub app_id: Option<String>,
    /// Path to steamcmd, or a directory containing it.
    pub steamcmd: Option<PathBuf>,
    /// Items downloaded at once.
    pub concurrency: Option<u8>,
    /// Extra attempts per item after the first.
    pub max_retries: Option<u8>,
    /// Limit for one download attempt, in seconds.
    pub attempt_timeout_secs: Option<u64>,
    /// Limit for one page request, in seconds.
    pub page_timeout_secs: Option<u64>,
    /// Ask steamcmd to validate files.
    pub validate: Option<bool>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
    /// Item ids never downloaded.
    pub exclude: Option<Vec<WorkshopId>>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrency
            && !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&usize::from(concurrency))
        {
            bail!(
                "Invalid config value for `concurrency`: {concurrency}. Expected range: {MIN_CONCURRENCY}..={MAX_CONCURRENCY}"
            );
        }

        if let Some(max_retries) = self.max_retries
            && max_retries > MAX_RETRIES_LIMIT
        {
            bail!(
                "Invalid config value for `max_retries`: {max_retries}. Expected range: 0..={MAX_RETRIES_LIMIT}"
            );
        }

        validate_range("attempt_timeout_secs", self.attempt_timeout_secs, 86_400)?;
        validate_range("page_timeout_secs", self.page_timeout_secs, 3600)?;

        if let Some(app_id) = &self.app_id
            && !is_app_id(app_id)
        {
            bail!("Invalid config value for `app_id`: '{app_id}'. Expected a numeric Steam app id");
        }

        Ok(())
    }
}

fn validate_range(field: &str, value: Option<u64>, max: u64) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=max).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..={max}");
    }
    Ok(())
}

/// True for a plausible Steam app id (digits only, no leading zero).
pub fn is_app_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 10
        && value.bytes().all(|b| b.is_ascii_digit())
        && !value.starts_with('0')
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/workshop-dl/config.toml`
/// 2. `$HOME/.config/workshop-dl/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("workshop-dl")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("workshop-dl")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig { path, config: None });
    };

    if !path_ref.exists() {
        return Ok(LoadedConfig { path, config: None });
    }

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_no = line_index + 1;
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "output_dir" => {
                cfg.output_dir = Some(PathBuf::from(
                    parse_string_literal(value).with_context(invalid)?,
                ));
            }
            "app_id" => {
                // Accept both `app_id = 108600` and `app_id = "108600"`.
                let parsed = if value.starts_with('"') {
                    parse_string_literal(value).with_context(invalid)?
                } else {
                    parse_integer_u64(value).with_context(invalid)?.to_string()
                };
                cfg.app_id = Some(parsed);
            }
            "steamcmd" => {
                cfg.steamcmd = Some(PathBuf::from(
                    parse_string_literal(value).with_context(invalid)?,
                ));
            }
            "concurrency" => {
                cfg.concurrency = Some(parse_integer_u8(value).with_context(invalid)?);
            }
            "max_retries" => {
                cfg.max_retries = Some(parse_integer_u8(value).with_context(invalid)?);
            }
            "attempt_timeout_secs" => {
                cfg.attempt_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "page_timeout_secs" => {
                cfg.page_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "validate" => {
                cfg.validate = Some(parse_boolean(value).with_context(invalid)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            "exclude" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.exclude = Some(parse_id_list(&parsed).with_context(invalid)?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u8(raw_value: &str) -> Result<u8> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<u16>()?;
    u8::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u8"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}

/// Parses a comma-separated list of item ids; empty entries are ignored.
pub fn parse_id_list(raw: &str) -> Result<Vec<WorkshopId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            WorkshopId::parse(entry).ok_or_else(|| anyhow::anyhow!("'{entry}' is not a Workshop id"))
        })
        .collect()
}
