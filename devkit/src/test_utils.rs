/*!
Test Harness pour le tableau de bord

Assemble un Dashboard complet autour des stubs du devkit :
- Vue d'enregistrement partagée avec le test
- Flotte, statuts et préférences manipulables pendant le test
- reload() simule un rechargement de page (même stockage, état d'affichage neuf)
*/

use crate::fleet_stub::{MemoryPreferences, MockFleet, ScriptedStatus};
use crate::view_stub::RecordingView;
use pifan_dashboard::models::StatusReading;
use pifan_dashboard::{Dashboard, DashboardParts, DashboardSettings};
use std::sync::Arc;

/// Relevé /status compact pour les tests : (température, vitesse, cpu, mémoire)
pub fn reading(temperature: f64, speed: f64, cpu: f64, memory: f64) -> StatusReading {
    StatusReading::new(temperature, speed, cpu, memory)
}

pub struct TestHarness {
    pub dashboard: Dashboard,
    pub view: RecordingView,
    pub fleet: MockFleet,
    pub status: ScriptedStatus,
    pub preferences: MemoryPreferences,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_devices(&[])
    }

    /// Flotte initiale (nom, ip, port), tous les appareils hors ligne tant qu'on ne les script pas
    pub fn with_devices(devices: &[(&str, &str, u16)]) -> Self {
        Self::build(
            MockFleet::with_devices(devices),
            ScriptedStatus::new(),
            MemoryPreferences::new(),
            DashboardSettings::default(),
        )
    }

    pub fn build(
        fleet: MockFleet,
        status: ScriptedStatus,
        preferences: MemoryPreferences,
        settings: DashboardSettings,
    ) -> Self {
        // Init logging pour tests
        tracing_subscriber::fmt().with_test_writer().try_init().ok();

        let view = RecordingView::new();
        let parts = DashboardParts {
            fleet: Arc::new(fleet.clone()),
            status: Arc::new(status.clone()),
            preferences: Box::new(preferences.clone()),
            view: Box::new(view.clone()),
        };
        Self {
            dashboard: Dashboard::new(parts, settings),
            view,
            fleet,
            status,
            preferences,
        }
    }

    /// Nouveau Dashboard sur les mêmes collaborateurs, comme après un rechargement
    pub fn reload(&self) -> Self {
        Self::build(
            self.fleet.clone(),
            self.status.clone(),
            self.preferences.clone(),
            DashboardSettings::default(),
        )
    }

    pub fn set_online(&self, address: &str, temperature: f64, speed: f64, cpu: f64, memory: f64) {
        self.status.set_online(address, reading(temperature, speed, cpu, memory));
    }

    pub fn set_offline(&self, address: &str) {
        self.status.set_offline(address);
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
