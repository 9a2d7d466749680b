/**
 * DEVICE REGISTRY - Liste des appareils surveillés, synchronisée avec l'API de gestion
 *
 * RÔLE : Source de vérité locale de la flotte (nom, adresse, port), chargée depuis
 * le service de gestion. Ajout / édition / suppression passent toujours par
 * le service distant AVANT de toucher à l'état local.
 *
 * FONCTIONNEMENT :
 * - FleetApi = contrat HTTP du service de gestion (get_pi_list, add_pi, edit_pi, delete_pi)
 * - submit_* : sonde + appel distant + rechargement, sur des données possédées,
 *   lancés hors de la boucle principale; replace() applique ensuite la liste
 * - Sonde de joignabilité (2s) purement informative : elle ne bloque jamais l'envoi
 * - Après chaque mutation réussie, la liste est rechargée depuis le service
 */

use crate::error::{FleetError, RegistryError};
use crate::models::{DeleteRecord, Device, DeviceKey, DeviceRecord, EditRecord};
use crate::poller::StatusSource;
use crate::validation::ValidDevice;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use tracing::{info, warn};

/// Contrat du service de gestion de flotte
#[async_trait]
pub trait FleetApi: Send + Sync {
    async fn list(&self) -> Result<Vec<DeviceRecord>, FleetError>;
    async fn add(&self, record: &DeviceRecord) -> Result<(), FleetError>;
    async fn edit(&self, original_ip: &str, record: &DeviceRecord) -> Result<(), FleetError>;
    async fn delete(&self, ip: &str) -> Result<(), FleetError>;
}

pub struct HttpFleetClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFleetClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route)
    }

    async fn post<T: serde::Serialize + Sync>(&self, route: &str, body: &T) -> Result<(), FleetError> {
        let response = self.client.post(self.url(route)).json(body).send().await?;
        match response.status() {
            StatusCode::CONFLICT => Err(FleetError::Conflict),
            status if status.is_success() => Ok(()),
            status => Err(FleetError::Status(status.as_u16())),
        }
    }
}

#[async_trait]
impl FleetApi for HttpFleetClient {
    async fn list(&self) -> Result<Vec<DeviceRecord>, FleetError> {
        let response = self.client.get(self.url("get_pi_list")).send().await?;
        if !response.status().is_success() {
            return Err(FleetError::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }

    async fn add(&self, record: &DeviceRecord) -> Result<(), FleetError> {
        self.post("add_pi", record).await
    }

    async fn edit(&self, original_ip: &str, record: &DeviceRecord) -> Result<(), FleetError> {
        let body = EditRecord {
            original_ip: original_ip.to_string(),
            device: record.clone(),
        };
        self.post("edit_pi", &body).await
    }

    async fn delete(&self, ip: &str) -> Result<(), FleetError> {
        self.post("delete_pi", &DeleteRecord { ip: ip.to_string() }).await
    }
}

/// Résultat d'un ajout ou d'une édition réussi
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub device: Device,
    /// Résultat de la sonde : ne sert qu'à choisir le message affiché
    pub reachable: bool,
}

pub struct DeviceRegistry {
    devices: Vec<Device>,
    api: Arc<dyn FleetApi>,
}

impl DeviceRegistry {
    pub fn new(api: Arc<dyn FleetApi>) -> Self {
        Self { devices: Vec::new(), api }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn find(&self, address: &str) -> Option<&Device> {
        let key = DeviceKey::from_address(address);
        self.devices.iter().find(|d| d.key == key)
    }

    pub fn index_of(&self, key: &DeviceKey) -> Option<usize> {
        self.devices.iter().position(|d| &d.key == key)
    }

    pub fn api(&self) -> Arc<dyn FleetApi> {
        Arc::clone(&self.api)
    }

    /// Remplace la liste locale par celle du service
    pub async fn load(&mut self) -> Result<usize, FleetError> {
        let records = self.api.list().await?;
        self.replace(records.into_iter().map(Device::from).collect());
        info!("Loaded {} devices from fleet manager", self.devices.len());
        Ok(self.devices.len())
    }

    /// Installe une liste rechargée par une mutation
    pub fn replace(&mut self, devices: Vec<Device>) {
        self.devices = devices;
    }
}

/// Ajout ou édition accepté par le service de gestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub outcome: MutationOutcome,
    /// Liste rechargée après la mutation; None si le rechargement a échoué
    pub devices: Option<Vec<Device>>,
}

/// Le rechargement après mutation ne doit pas faire échouer la mutation elle-même
async fn reload_after(api: &dyn FleetApi, action: &str) -> Option<Vec<Device>> {
    match api.list().await {
        Ok(records) => Some(records.into_iter().map(Device::from).collect()),
        Err(e) => {
            warn!("Device list reload after {} failed: {}", action, e);
            None
        }
    }
}

// Les soumissions possèdent leurs arguments : elles tournent hors de la boucle
// principale, l'état local n'est touché qu'à l'application du résultat.

pub async fn submit_add(
    api: Arc<dyn FleetApi>,
    prober: Arc<dyn StatusSource>,
    device: ValidDevice,
) -> Result<Submission, RegistryError> {
    let reachable = prober.probe(&device.address, device.port).await;
    if !reachable {
        warn!("Device {}:{} not reachable, registering anyway", device.address, device.port);
    }

    let record = DeviceRecord {
        name: device.name,
        ip: device.address,
        port: device.port,
    };
    api.add(&record).await?;
    info!("Device {} ({}) added", record.name, record.ip);

    Ok(Submission {
        devices: reload_after(api.as_ref(), "add").await,
        outcome: MutationOutcome { device: Device::from(record), reachable },
    })
}

pub async fn submit_edit(
    api: Arc<dyn FleetApi>,
    prober: Arc<dyn StatusSource>,
    original_address: String,
    device: ValidDevice,
) -> Result<Submission, RegistryError> {
    let reachable = prober.probe(&device.address, device.port).await;

    let record = DeviceRecord {
        name: device.name,
        ip: device.address,
        port: device.port,
    };
    api.edit(&original_address, &record).await?;
    info!("Device {} updated ({} -> {})", record.name, original_address, record.ip);

    Ok(Submission {
        devices: reload_after(api.as_ref(), "edit").await,
        outcome: MutationOutcome { device: Device::from(record), reachable },
    })
}

pub async fn submit_remove(api: Arc<dyn FleetApi>, address: String) -> Result<Option<Vec<Device>>, RegistryError> {
    api.delete(&address).await?;
    info!("Device {} deleted", address);
    Ok(reload_after(api.as_ref(), "delete").await)
}
