/*!
Stubs des collaborateurs réseau et du stockage de préférences

- MockFleet : service de gestion en mémoire, mêmes règles que le vrai (409 sur doublon)
- ScriptedStatus : réponse /status programmée par adresse, hors ligne par défaut,
  latence optionnelle pour simuler des appareils lents
- MemoryPreferences : clé/valeur partagé, survit à un "rechargement" du tableau de bord
*/

use async_trait::async_trait;
use chrono::Local;
use pifan_dashboard::error::{FleetError, PreferenceError};
use pifan_dashboard::layout::PreferenceStore;
use pifan_dashboard::models::{DeviceRecord, StatusReading};
use pifan_dashboard::poller::StatusSource;
use pifan_dashboard::registry::FleetApi;
use pifan_dashboard::state::Shared;
use pifan_dashboard::{Device, StatusResult, StatusSample};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::debug;

#[derive(Clone, Default)]
pub struct MockFleet {
    records: Shared<Vec<DeviceRecord>>,
    calls: Shared<Vec<String>>,
    fail_next: Shared<Option<u16>>,
}

impl MockFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(devices: &[(&str, &str, u16)]) -> Self {
        let fleet = Self::new();
        fleet.records.lock().extend(devices.iter().map(|(name, ip, port)| DeviceRecord {
            name: name.to_string(),
            ip: ip.to_string(),
            port: *port,
        }));
        fleet
    }

    pub fn records(&self) -> Vec<DeviceRecord> {
        self.records.lock().clone()
    }

    /// Routes appelées, dans l'ordre ("get_pi_list", "add_pi", ...)
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// La prochaine mutation échoue avec ce code HTTP
    pub fn fail_next(&self, status: u16) {
        *self.fail_next.lock() = Some(status);
    }

    fn enter(&self, route: &str) -> Result<(), FleetError> {
        self.calls.lock().push(route.to_string());
        match self.fail_next.lock().take() {
            Some(status) => Err(FleetError::Status(status)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl FleetApi for MockFleet {
    async fn list(&self) -> Result<Vec<DeviceRecord>, FleetError> {
        self.calls.lock().push("get_pi_list".to_string());
        Ok(self.records())
    }

    async fn add(&self, record: &DeviceRecord) -> Result<(), FleetError> {
        self.enter("add_pi")?;
        let mut records = self.records.lock();
        if records.iter().any(|r| r.ip == record.ip) {
            return Err(FleetError::Conflict);
        }
        records.push(record.clone());
        Ok(())
    }

    async fn edit(&self, original_ip: &str, record: &DeviceRecord) -> Result<(), FleetError> {
        self.enter("edit_pi")?;
        let mut records = self.records.lock();
        match records.iter_mut().find(|r| r.ip == original_ip) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(FleetError::Status(404)),
        }
    }

    async fn delete(&self, ip: &str) -> Result<(), FleetError> {
        self.enter("delete_pi")?;
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|r| r.ip != ip);
        if records.len() == before {
            return Err(FleetError::Status(404));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct ScriptedStatus {
    readings: Shared<HashMap<String, StatusReading>>,
    fetches: Shared<Vec<String>>,
    latency: Shared<Option<Duration>>,
}

impl ScriptedStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_online(&self, address: &str, reading: StatusReading) {
        self.readings.lock().insert(address.to_string(), reading);
    }

    pub fn set_offline(&self, address: &str) {
        self.readings.lock().remove(address);
    }

    /// fetch_status et probe attendent ce délai avant de répondre
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// Adresses interrogées via fetch_status, dans l'ordre d'appel
    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().clone()
    }

    async fn wait(&self) {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl StatusSource for ScriptedStatus {
    async fn fetch_status(&self, device: &Device) -> StatusResult {
        self.fetches.lock().push(device.address.clone());
        self.wait().await;
        let reading = self.readings.lock().get(&device.address).cloned();
        match reading {
            Some(reading) => StatusResult::Online(StatusSample::from_reading(&reading, Local::now())),
            None => {
                debug!("Scripted offline for {}", device.address);
                StatusResult::unavailable()
            }
        }
    }

    async fn probe(&self, address: &str, _port: u16) -> bool {
        self.wait().await;
        self.readings.lock().contains_key(address)
    }
}

#[derive(Clone, Default)]
pub struct MemoryPreferences {
    values: Shared<BTreeMap<String, String>>,
    read_only: Shared<bool>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }

    /// Simule un stockage plein ou interdit en écriture
    pub fn make_read_only(&self) {
        *self.read_only.lock() = true;
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.value(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        if *self.read_only.lock() {
            return Err(PreferenceError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "preference storage is read-only",
            )));
        }
        self.insert(key, value);
        Ok(())
    }
}
