use crate::error::{OrchestratorError, OrchestratorResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SNAPSHOT_DELAY_DEFAULT: Duration = Duration::from_secs(2);
pub const TERMINATION_DELAY_DEFAULT: Duration = Duration::from_secs(3);
pub const REPORT_INTERVAL_DEFAULT: Duration = Duration::from_secs(1);

pub const SNAPSHOT_DELAY_ENV: &str = "FORKGROUP_SNAPSHOT_DELAY_MS";
pub const TERMINATION_DELAY_ENV: &str = "FORKGROUP_TERMINATION_DELAY_MS";
pub const REPORT_INTERVAL_ENV: &str = "FORKGROUP_REPORT_INTERVAL_MS";
pub const SNAPSHOT_TOOL_ENV: &str = "FORKGROUP_SNAPSHOT_TOOL";

pub const DEFAULT_SNAPSHOT_TOOL: &str = "scrot";
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Interactive command lines split into at most this many tokens
pub const MAX_COMMAND_TOKENS: usize = 10;

/// Interactive input that would run `time` with nothing to time. `time` is
/// neither a binary nor a builtin everywhere, so the substitute is a bare no-op.
pub const TIME_TOKEN: &str = "time";
pub const TIME_SUBSTITUTE: &str = "true";

/// Fixed delays that drive the parent between spawning and termination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeline {
    pub snapshot_delay: Duration,
    pub termination_delay: Duration,
    pub report_interval: Duration,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            snapshot_delay: SNAPSHOT_DELAY_DEFAULT,
            termination_delay: TERMINATION_DELAY_DEFAULT,
            report_interval: REPORT_INTERVAL_DEFAULT,
        }
    }
}

impl Timeline {
    /// Time from spawn completion until the group is signalled
    pub fn run_window(&self) -> Duration {
        self.snapshot_delay + self.termination_delay
    }
}

/// Layered runtime settings: defaults, then TOML file, then environment.
/// CLI flags are applied on top by the binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub snapshot_delay_ms: u64,
    pub termination_delay_ms: u64,
    pub report_interval_ms: u64,
    pub snapshot: SnapshotSettings,
    pub shell: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnapshotSettings {
    pub enabled: bool,
    pub tool: String,
    pub directory: Option<PathBuf>,
    /// One literal file name for both captures instead of `<label>_<program>.png`
    pub fixed_name: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snapshot_delay_ms: SNAPSHOT_DELAY_DEFAULT.as_millis() as u64,
            termination_delay_ms: TERMINATION_DELAY_DEFAULT.as_millis() as u64,
            report_interval_ms: REPORT_INTERVAL_DEFAULT.as_millis() as u64,
            snapshot: SnapshotSettings::default(),
            shell: DEFAULT_SHELL.to_string(),
        }
    }
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            tool: DEFAULT_SNAPSHOT_TOOL.to_string(),
            directory: None,
            fixed_name: None,
        }
    }
}

impl Settings {
    /// Load settings from an optional file and the process environment
    pub fn load(path: Option<&Path>) -> OrchestratorResult<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> OrchestratorResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| OrchestratorError::Settings {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_toml(&raw).map_err(|message| OrchestratorError::Settings {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|err| err.to_string())
    }

    /// Override fields from environment variables, looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> OrchestratorResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let millis = |key: &str| -> OrchestratorResult<Option<u64>> {
            match lookup(key) {
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .map(Some)
                    .map_err(|err| OrchestratorError::Settings {
                        path: PathBuf::from(format!("${key}")),
                        message: format!("'{value}': {err}"),
                    }),
                None => Ok(None),
            }
        };

        if let Some(ms) = millis(SNAPSHOT_DELAY_ENV)? {
            self.snapshot_delay_ms = ms;
        }
        if let Some(ms) = millis(TERMINATION_DELAY_ENV)? {
            self.termination_delay_ms = ms;
        }
        if let Some(ms) = millis(REPORT_INTERVAL_ENV)? {
            self.report_interval_ms = ms;
        }
        if let Some(tool) = lookup(SNAPSHOT_TOOL_ENV).filter(|t| !t.trim().is_empty()) {
            self.snapshot.tool = tool.trim().to_string();
        }
        Ok(())
    }

    pub fn timeline(&self) -> Timeline {
        Timeline {
            snapshot_delay: Duration::from_millis(self.snapshot_delay_ms),
            termination_delay: Duration::from_millis(self.termination_delay_ms),
            report_interval: Duration::from_millis(self.report_interval_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_follow_the_two_plus_three_second_timeline() {
        let timeline = Settings::default().timeline();
        assert_eq!(timeline, Timeline::default());
        assert_eq!(timeline.run_window(), Duration::from_secs(5));
    }

    #[test]
    fn toml_overrides_defaults_partially() {
        let settings = Settings::from_toml(
            r#"
            snapshot_delay_ms = 100

            [snapshot]
            enabled = false
            fixed_name = "screenshot.png"
            "#,
        )
        .unwrap();

        assert_eq!(settings.snapshot_delay_ms, 100);
        assert_eq!(settings.termination_delay_ms, 3000);
        assert!(!settings.snapshot.enabled);
        assert_eq!(settings.snapshot.tool, DEFAULT_SNAPSHOT_TOOL);
        assert_eq!(settings.snapshot.fixed_name.as_deref(), Some("screenshot.png"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_toml("snapshot_delay = 1").is_err());
    }

    #[test]
    fn env_wins_over_file() {
        let mut settings = Settings::from_toml("termination_delay_ms = 9000").unwrap();
        settings
            .apply_env(env_of(&[
                (TERMINATION_DELAY_ENV, "250"),
                (SNAPSHOT_TOOL_ENV, "import"),
            ]))
            .unwrap();

        assert_eq!(settings.termination_delay_ms, 250);
        assert_eq!(settings.snapshot.tool, "import");
    }

    #[test]
    fn malformed_env_value_is_a_settings_error() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(env_of(&[(REPORT_INTERVAL_ENV, "soon")]))
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Settings { .. }));
        assert!(err.to_string().contains(REPORT_INTERVAL_ENV));
    }

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let err = Settings::from_file(Path::new("/nonexistent/forkgroup.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/forkgroup.toml"));
    }
}
