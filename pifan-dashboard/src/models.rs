use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Message affiché sur une carte quand l'appareil ne répond pas.
pub const UNAVAILABLE: &str = "Unavailable";

/// Clé stable dérivée de l'adresse (192.168.1.10 -> 192-168-1-10).
/// Une adresse = une carte = un historique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceKey(String);

impl DeviceKey {
    pub fn from_address(address: &str) -> Self {
        Self(address.trim().replace('.', "-"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub key: DeviceKey,
    pub name: String,
    pub address: String,
    pub port: u16,
}

impl Device {
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        let address = address.into();
        Self {
            key: DeviceKey::from_address(&address),
            name: name.into(),
            address,
            port,
        }
    }

    /// "ip:port", tel qu'affiché dans l'en-tête de la carte
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn status_url(&self) -> String {
        status_url(&self.address, self.port)
    }
}

pub fn status_url(address: &str, port: u16) -> String {
    format!("http://{}:{}/status", address, port)
}

// Structures basées sur le contrat de l'API de gestion (get_pi_list / add_pi / edit_pi / delete_pi)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub name: String,
    pub ip: String,
    pub port: u16,
}

impl From<DeviceRecord> for Device {
    fn from(record: DeviceRecord) -> Self {
        Device::new(record.name, record.ip, record.port)
    }
}

impl From<&Device> for DeviceRecord {
    fn from(device: &Device) -> Self {
        Self {
            name: device.name.clone(),
            ip: device.address.clone(),
            port: device.port,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRecord {
    pub original_ip: String,
    #[serde(flatten)]
    pub device: DeviceRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteRecord {
    pub ip: String,
}

/// Réponse brute de GET /status. Les Pi renvoient parfois des nombres sous forme de chaîne.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReading {
    #[serde(deserialize_with = "lenient_number")]
    pub temperature: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub speed: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub cpu: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub memory: f64,
}

impl StatusReading {
    pub fn new(temperature: f64, speed: f64, cpu: f64, memory: f64) -> Self {
        Self { temperature, speed, cpu, memory }
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("not a number: {s:?}"))),
    }
}

/// Un relevé horodaté d'un appareil
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSample {
    pub timestamp: DateTime<Local>,
    pub temperature: f64,
    pub fan_speed_percent: i64,
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

impl StatusSample {
    pub fn from_reading(reading: &StatusReading, timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            temperature: reading.temperature,
            // la vitesse du ventilateur est un pourcentage entier
            fan_speed_percent: reading.speed.trunc() as i64,
            cpu_percent: reading.cpu,
            memory_percent: reading.memory,
        }
    }

    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusResult {
    Online(StatusSample),
    Offline { error: String },
}

impl StatusResult {
    pub fn unavailable() -> Self {
        StatusResult::Offline { error: UNAVAILABLE.to_string() }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, StatusResult::Online(_))
    }

    pub fn sample(&self) -> Option<&StatusSample> {
        match self {
            StatusResult::Online(sample) => Some(sample),
            StatusResult::Offline { .. } => None,
        }
    }
}
