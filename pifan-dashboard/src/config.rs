use crate::alerts::DEFAULT_ALERT_LIFETIME;
use crate::history::DEFAULT_MAX_HISTORY_POINTS;
use crate::poller::DEFAULT_REQUEST_TIMEOUT;
use crate::refresh::DEFAULT_REFRESH_INTERVAL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

pub const CONFIG_ENV: &str = "PIFAN_DASHBOARD_CONFIG";
pub const MANAGER_HOST_ENV: &str = "PIFAN_MANAGER_HOST";
pub const MANAGER_PORT_ENV: &str = "PIFAN_MANAGER_PORT";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ManagerConf {
    pub host: String,
    pub port: u16,
}

impl Default for ManagerConf {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 5000 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub manager: ManagerConf,
    pub refresh_interval_secs: u64,
    pub request_timeout_ms: u64,
    pub max_history_points: usize,
    pub alert_lifetime_secs: u64,
    pub preferences_file: Option<PathBuf>, // ex: "/home/pi/.config/pifan-dashboard/preferences.json"
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            manager: ManagerConf::default(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL.as_secs(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            max_history_points: DEFAULT_MAX_HISTORY_POINTS,
            alert_lifetime_secs: DEFAULT_ALERT_LIFETIME.as_secs(),
            preferences_file: None,
        }
    }
}

impl DashboardConfig {
    /// Contenu vide ou invalide -> configuration par défaut
    pub fn from_yaml_str(txt: &str) -> Self {
        if txt.trim().is_empty() {
            return Self::default();
        }
        serde_yaml::from_str(txt).unwrap_or_else(|e| {
            warn!("Invalid dashboard config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Surcharges par variables d'environnement (hôte et port du service de gestion)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(MANAGER_HOST_ENV).filter(|h| !h.trim().is_empty()) {
            self.manager.host = host.trim().to_string();
        }
        if let Some(port) = lookup(MANAGER_PORT_ENV) {
            match port.trim().parse::<u16>() {
                Ok(port) => self.manager.port = port,
                Err(_) => warn!("Ignoring {}={:?}: not a port number", MANAGER_PORT_ENV, port),
            }
        }
    }

    pub fn manager_base_url(&self) -> String {
        format!("http://{}:{}", self.manager.host, self.manager.port)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    pub fn alert_lifetime(&self) -> Duration {
        Duration::from_secs(self.alert_lifetime_secs)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.preferences_file.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("pifan-dashboard")
                .join("preferences.json")
        })
    }
}

pub async fn load_config() -> DashboardConfig {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "dashboard.yaml".into());
    let mut cfg = if Path::new(&path).exists() {
        match fs::read_to_string(&path).await {
            Ok(txt) => DashboardConfig::from_yaml_str(&txt),
            Err(e) => {
                warn!("Failed to read {}: {}", path, e);
                DashboardConfig::default()
            }
        }
    } else {
        info!("No {} found, using default config", path);
        DashboardConfig::default()
    };
    cfg.apply_overrides(|name| std::env::var(name).ok());
    cfg
}
