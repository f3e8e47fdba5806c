use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-level file name looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "trackit.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackitConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Knobs of the replay engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Length of a testing window, anchored at its first command.
    #[serde(default = "default_testing_phase_days")]
    pub testing_phase_days: i64,
    /// Length of a development window; commands past it end the run.
    #[serde(default = "default_development_phase_days")]
    pub development_phase_days: i64,
    #[serde(default = "default_min_comment_length")]
    pub min_comment_length: usize,
    /// Escalate unresolved milestone tickets one tier every `n` days.
    #[serde(default)]
    pub priority_escalation_days: Option<i64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            testing_phase_days: default_testing_phase_days(),
            development_phase_days: default_development_phase_days(),
            min_comment_length: default_min_comment_length(),
            priority_escalation_days: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Write acknowledgement outcomes too, not only listings and rejections.
    #[serde(default)]
    pub include_acks: bool,
    /// `pretty`, `text`, or `json`.
    #[serde(default)]
    pub format: Option<String>,
}

/// A loaded configuration and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TrackitConfig,
    /// `None` when defaults were used.
    pub source: Option<PathBuf>,
}

/// Load and validate one TOML config file.
///
/// # Errors
///
/// Fails when the file is unreadable, is not valid TOML, or holds
/// out-of-range values.
pub fn load_config_file(path: &Path) -> Result<TrackitConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<TrackitConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    validate(&config).with_context(|| format!("Invalid config in {}", path.display()))?;
    Ok(config)
}

fn validate(config: &TrackitConfig) -> Result<()> {
    if config.engine.testing_phase_days < 1 {
        bail!("engine.testing_phase_days must be at least 1");
    }
    if config.engine.development_phase_days < 1 {
        bail!("engine.development_phase_days must be at least 1");
    }
    if config.engine.priority_escalation_days.is_some_and(|n| n < 1) {
        bail!("engine.priority_escalation_days must be at least 1 when set");
    }
    Ok(())
}

#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("trackit/config.toml"))
}

/// Resolve the effective configuration.
///
/// An explicit path must exist. Otherwise `<project_root>/trackit.toml` is
/// tried, then the user config file, then built-in defaults.
///
/// # Errors
///
/// Fails when the explicit path is missing or a discovered file does not
/// load.
pub fn discover_config(project_root: &Path, explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("Config file {} does not exist", path.display());
        }
        return Ok(LoadedConfig {
            config: load_config_file(path)?,
            source: Some(path.to_path_buf()),
        });
    }

    let candidates =
        std::iter::once(project_root.join(PROJECT_CONFIG_FILE)).chain(user_config_path());
    for path in candidates {
        if path.exists() {
            return Ok(LoadedConfig {
                config: load_config_file(&path)?,
                source: Some(path),
            });
        }
    }

    Ok(LoadedConfig {
        config: TrackitConfig::default(),
        source: None,
    })
}

/// Pick the output mode: `--json`, then the `FORMAT` env var, then the
/// config file, then `pretty` on a terminal and `text` elsewhere.
#[must_use]
pub fn resolve_output(
    cli_json: bool,
    configured: Option<&str>,
    env_format: Option<&str>,
    is_terminal: bool,
) -> &'static str {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json";
    }
    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return mode;
    }
    if let Some(mode) = configured.and_then(normalize_output_mode) {
        return mode;
    }
    if is_terminal { "pretty" } else { "text" }
}

const fn default_testing_phase_days() -> i64 {
    12
}

const fn default_development_phase_days() -> i64 {
    1000
}

const fn default_min_comment_length() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_constants() {
        let cfg = TrackitConfig::default();
        assert_eq!(cfg.engine.testing_phase_days, 12);
        assert_eq!(cfg.engine.development_phase_days, 1000);
        assert_eq!(cfg.engine.min_comment_length, 10);
        assert_eq!(cfg.engine.priority_escalation_days, None);
        assert!(!cfg.output.include_acks);
    }

    #[test]
    fn missing_project_file_falls_through() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = discover_config(dir.path(), None).expect("discover");
        // The user config may or may not exist on the host; the project file does not.
        assert_ne!(loaded.source, Some(dir.path().join(PROJECT_CONFIG_FILE)));
    }

    #[test]
    fn project_file_is_preferred() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[engine]\ntesting_phase_days = 5\n\n[output]\ninclude_acks = true\n",
        )
        .expect("write");

        let loaded = discover_config(dir.path(), None).expect("discover");
        assert_eq!(loaded.source, Some(dir.path().join(PROJECT_CONFIG_FILE)));
        assert_eq!(loaded.config.engine.testing_phase_days, 5);
        assert_eq!(loaded.config.engine.min_comment_length, 10);
        assert!(loaded.config.output.include_acks);
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        assert!(discover_config(dir.path(), Some(&missing)).is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[engine]\npriority_escalation_days = 0\n").expect("write");
        let err = load_config_file(&path).expect_err("invalid");
        assert!(format!("{err:#}").contains("priority_escalation_days"));

        std::fs::write(&path, "[engine\n").expect("write");
        assert!(load_config_file(&path).is_err());
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        assert_eq!(resolve_output(true, Some("pretty"), Some("text"), true), "json");
    }

    #[test]
    fn env_beats_config_and_aliases_normalize() {
        assert_eq!(resolve_output(false, Some("table"), Some("human"), false), "pretty");
        assert_eq!(resolve_output(false, Some("table"), None, true), "text");
        assert_eq!(resolve_output(false, None, Some("bogus"), false), "text");
        assert_eq!(resolve_output(false, None, None, true), "pretty");
    }
}
