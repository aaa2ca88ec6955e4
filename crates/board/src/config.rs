use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use crate::types::FlagKind;

/// Overrides `backend.base_url` when set (hosting environments inject it).
pub const BASE_URL_ENV: &str = "LEADERBOARD_BASE_URL";
/// One week.
pub const MAX_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub general: General,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub sync: SyncSchedule,
    pub web: Option<Web>,
    #[serde(default)]
    pub badges: Badges,
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Backend {
    pub base_url: Option<String>,
    #[serde(default = "default_tunnel_bypass_header")]
    pub tunnel_bypass_header: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            base_url: None,
            tunnel_bypass_header: default_tunnel_bypass_header(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncSchedule {
    pub interval_secs: u64,
    #[serde(default = "default_true")]
    pub run_immediately: bool,
}

impl Default for SyncSchedule {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            run_immediately: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Web {
    pub port: u16,
    pub host: String,
}

/// Flag badge lookup table. Each entry is optional and falls back to the
/// built-in mapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Badges {
    pub large_deposit: BadgeSpec,
    pub has_withdrawals: BadgeSpec,
    pub non_fresh: BadgeSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BadgeSpec {
    pub label: String,
    pub tooltip: String,
    pub css_class: String,
}

impl Default for Badges {
    fn default() -> Self {
        Self {
            large_deposit: BadgeSpec {
                label: "D".to_string(),
                tooltip: "Total Polymarket deposits exceed 110 USDC.e".to_string(),
                css_class: "flag-deposit".to_string(),
            },
            has_withdrawals: BadgeSpec {
                label: "W".to_string(),
                tooltip: "Wallet has withdrawals".to_string(),
                css_class: "flag-withdraw".to_string(),
            },
            non_fresh: BadgeSpec {
                label: "F".to_string(),
                tooltip: "Non-fresh wallet: more than 5 deposit/withdrawal transactions"
                    .to_string(),
                css_class: "flag-nonfresh".to_string(),
            },
        }
    }
}

impl Badges {
    pub fn get(&self, kind: FlagKind) -> &BadgeSpec {
        match kind {
            FlagKind::LargeDeposit => &self.large_deposit,
            FlagKind::HasWithdrawals => &self.has_withdrawals,
            FlagKind::NonFresh => &self.non_fresh,
        }
    }
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_tunnel_bypass_header() -> Option<String> {
    Some("ngrok-skip-browser-warning".to_string())
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides(std::env::var(BASE_URL_ENV).ok());
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("failed to parse leaderboard config")?;
        config.validate()?;
        Ok(config)
    }

    /// A non-blank env value replaces the configured base URL.
    pub fn apply_env_overrides(&mut self, base_url: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.backend.base_url = Some(url);
        }
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.sync.interval_secs > 0, "sync.interval_secs must be > 0");
        anyhow::ensure!(
            self.sync.interval_secs <= MAX_INTERVAL_SECS,
            "sync.interval_secs must be <= {MAX_INTERVAL_SECS}"
        );
        anyhow::ensure!(
            matches!(self.general.log_format.as_str(), "json" | "pretty"),
            "general.log_format must be \"json\" or \"pretty\""
        );
        if let Some(web) = &self.web {
            anyhow::ensure!(web.port > 0, "web.port must be > 0");
        }
        for kind in FlagKind::ALL {
            let spec = self.badges.get(kind);
            anyhow::ensure!(
                spec.label.chars().count() == 1,
                "badges.{}.label must be a single character",
                kind.as_str()
            );
        }
        Ok(())
    }

    pub fn default_config_path() -> String {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf));

        if let Some(dir) = &exe_dir {
            let candidate = dir.join("leaderboard.toml");
            if candidate.exists() {
                return candidate.to_string_lossy().to_string();
            }
        }

        let candidate = Path::new("config/leaderboard.toml");
        if candidate.exists() {
            return candidate.to_string_lossy().to_string();
        }

        "config/default.toml".to_string()
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}
