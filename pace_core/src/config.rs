use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    error::{PaceError, PaceResult},
    scheduler::interval_for,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaceConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl PaceConfig {
    pub fn validate(&self) -> PaceResult<()> {
        interval_for(self.pacing.target_hz)?;
        let refresh = self.runtime.headless_refresh_hz;
        if !refresh.is_finite() || refresh <= 0.0 {
            return Err(PaceError::Config(format!(
                "runtime.headless_refresh_hz must be positive, got {refresh}"
            )));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(PaceError::Config("window size must be non-zero".to_string()));
        }
        Ok(())
    }
}

pub fn parse_config_toml(text: &str) -> Result<PaceConfig> {
    let cfg: PaceConfig = toml::from_str(text)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_config_toml(path: impl AsRef<Path>) -> Result<PaceConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config '{}'", path.display()))?;
    parse_config_toml(&text).with_context(|| format!("invalid config '{}'", path.display()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_title() -> String { "lifepace".to_string() }
fn default_width() -> u32 { 512 }
fn default_height() -> u32 { 512 }

impl Default for WindowConfig {
    fn default() -> Self {
        Self { title: default_title(), width: default_width(), height: default_height() }
    }
}

/// What the frame loop does when the callback fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop re-arming frames and return the error.
    #[default]
    Halt,
    /// Log the error and keep ticking.
    Continue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_target_hz")]
    pub target_hz: f64,
    #[serde(default)]
    pub on_error: ErrorPolicy,
    #[serde(default = "default_log_stats")]
    pub log_stats: bool,
    #[serde(default = "default_stats_period_ms")]
    pub stats_period_ms: u32,
}

fn default_target_hz() -> f64 { 5.0 }
fn default_log_stats() -> bool { true }
fn default_stats_period_ms() -> u32 { 1000 }

impl PacingConfig {
    #[inline]
    pub fn stats_period(&self) -> Duration {
        Duration::from_millis(self.stats_period_ms as u64)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            target_hz: default_target_hz(),
            on_error: ErrorPolicy::default(),
            log_stats: default_log_stats(),
            stats_period_ms: default_stats_period_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostKind {
    #[default]
    Window,
    Headless,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub host: HostKind,
    /// "poll" or "wait"
    #[serde(default = "default_control_flow")]
    pub control_flow: String,
    #[serde(default = "default_headless_refresh_hz")]
    pub headless_refresh_hz: f64,
    /// Host frames before the loop stops on its own. Unbounded when unset.
    #[serde(default)]
    pub max_frames: Option<u64>,
}

fn default_control_flow() -> String { "wait".to_string() }
fn default_headless_refresh_hz() -> f64 { 60.0 }

impl RuntimeConfig {
    pub fn control_flow_poll(&self) -> bool {
        self.control_flow.trim().eq_ignore_ascii_case("poll")
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            host: HostKind::default(),
            control_flow: default_control_flow(),
            headless_refresh_hz: default_headless_refresh_hz(),
            max_frames: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = parse_config_toml("").unwrap();
        assert_eq!(cfg.pacing.target_hz, 5.0);
        assert_eq!(cfg.pacing.on_error, ErrorPolicy::Halt);
        assert_eq!(cfg.pacing.stats_period(), Duration::from_secs(1));
        assert_eq!(cfg.runtime.host, HostKind::Window);
        assert_eq!(cfg.runtime.max_frames, None);
        assert!(!cfg.runtime.control_flow_poll());
        assert_eq!(cfg.window.title, "lifepace");
    }

    #[test]
    fn parses_partial_sections() {
        let cfg = parse_config_toml(
            r#"
            [pacing]
            target_hz = 30.0
            on_error = "continue"

            [runtime]
            host = "headless"
            control_flow = " Poll "
            max_frames = 600
            "#,
        )
        .unwrap();

        assert_eq!(cfg.pacing.target_hz, 30.0);
        assert_eq!(cfg.pacing.on_error, ErrorPolicy::Continue);
        assert!(cfg.pacing.log_stats);
        assert_eq!(cfg.runtime.host, HostKind::Headless);
        assert!(cfg.runtime.control_flow_poll());
        assert_eq!(cfg.runtime.max_frames, Some(600));
        assert_eq!(cfg.runtime.headless_refresh_hz, 60.0);
    }

    #[test]
    fn rejects_non_positive_rate() {
        let err = parse_config_toml("[pacing]\ntarget_hz = 0.0\n").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PaceError>(),
            Some(PaceError::InvalidRate { .. })
        ));
    }

    #[test]
    fn rate_check_matches_scheduler_construction() {
        for text in ["[pacing]\ntarget_hz = 1e-320\n", "[pacing]\ntarget_hz = 1e12\n"] {
            let err = parse_config_toml(text).unwrap_err();
            assert!(
                matches!(err.downcast_ref::<PaceError>(), Some(PaceError::InvalidRate { .. })),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_bad_refresh_and_unknown_policy() {
        let err = parse_config_toml("[runtime]\nheadless_refresh_hz = -60.0\n").unwrap_err();
        assert!(matches!(err.downcast_ref::<PaceError>(), Some(PaceError::Config(_))));

        assert!(parse_config_toml("[pacing]\non_error = \"retry\"\n").is_err());
    }

    #[test]
    fn missing_file_mentions_path() {
        let err = load_config_toml("/nonexistent/lifepace.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/lifepace.toml"));
    }
}
