/**
 * VIEW - Collaborateur de rendu (cartes, graphiques, compteurs, alertes)
 *
 * RÔLE : Le tableau de bord ne manipule jamais le rendu directement : toutes
 * les mutations passent par le trait View. Le réconciliateur décide QUOI
 * changer, la vue décide COMMENT l'afficher.
 *
 * IMPLÉMENTATIONS :
 * - TracingView : journalise chaque mutation (binaire headless)
 * - RecordingView (devkit) : enregistre les opérations pour les tests
 */

use crate::alerts::Alert;
use crate::layout::{Layout, LayoutControl};
use crate::models::{Device, DeviceKey, StatusSample};
use crate::theme::{
    CpuAccent, FanSpeedLevel, TemperatureLevel, MEMORY_SLICE_COLOR, OFFLINE_DOT_COLOR, ONLINE_DOT_COLOR,
    REMAINDER_SLICE_COLOR,
};
use crate::validation::DeviceForm;
use tracing::info;
use uuid::Uuid;

/// Les deux sous-vues mutuellement exclusives d'une carte en ligne
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubView {
    #[default]
    Overview,
    History,
}

impl SubView {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "overview" => Some(SubView::Overview),
            "history" => Some(SubView::History),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardHeader {
    pub name: String,
    pub endpoint: String,
    pub online: bool,
    pub dot_color: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GaugeReadings {
    pub temperature: f64,
    pub temperature_class: &'static str,
    pub temperature_label: String,
    pub fan_speed: i64,
    pub fan_speed_class: &'static str,
    pub fan_speed_label: String,
}

impl GaugeReadings {
    pub fn from_sample(sample: &StatusSample) -> Self {
        Self {
            temperature: sample.temperature,
            temperature_class: TemperatureLevel::classify(sample.temperature).css_class(),
            temperature_label: format!("{}°C", sample.temperature),
            fan_speed: sample.fan_speed_percent,
            fan_speed_class: FanSpeedLevel::classify(sample.fan_speed_percent).css_class(),
            fan_speed_label: format!("{}%", sample.fan_speed_percent),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CardBody {
    Gauges(GaugeReadings),
    Error(String),
}

/// Structure complète d'une carte à créer
#[derive(Debug, Clone, PartialEq)]
pub struct CardSpec {
    pub key: DeviceKey,
    pub header: CardHeader,
    pub body: CardBody,
    pub layout: Layout,
}

impl CardSpec {
    pub fn online(device: &Device, sample: &StatusSample, layout: Layout) -> Self {
        Self {
            key: device.key.clone(),
            header: CardHeader {
                name: device.name.clone(),
                endpoint: device.endpoint(),
                online: true,
                dot_color: ONLINE_DOT_COLOR,
            },
            body: CardBody::Gauges(GaugeReadings::from_sample(sample)),
            layout,
        }
    }

    pub fn offline(device: &Device, error: &str, layout: Layout) -> Self {
        Self {
            key: device.key.clone(),
            header: CardHeader {
                name: device.name.clone(),
                endpoint: device.endpoint(),
                online: false,
                dot_color: OFFLINE_DOT_COLOR,
            },
            body: CardBody::Error(error.to_string()),
            layout,
        }
    }
}

/// Camembert CPU / mémoire de la vue d'ensemble
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadPie {
    pub cpu: f64,
    pub memory: f64,
    pub cpu_color: &'static str,
    pub memory_color: &'static str,
    pub remainder_color: &'static str,
}

impl LoadPie {
    pub fn from_sample(sample: &StatusSample) -> Self {
        Self {
            cpu: sample.cpu_percent,
            memory: sample.memory_percent,
            cpu_color: CpuAccent::classify(sample.cpu_percent).color(),
            memory_color: MEMORY_SLICE_COLOR,
            remainder_color: REMAINDER_SLICE_COLOR,
        }
    }

    /// Anneau CPU : `[cpu, 100 - cpu]`
    pub fn cpu_remainder(&self) -> f64 {
        (100.0 - self.cpu).max(0.0)
    }

    /// Anneau mémoire : `[memory, 100 - memory]`, indépendant de l'anneau CPU
    pub fn memory_remainder(&self) -> f64 {
        (100.0 - self.memory).max(0.0)
    }
}

/// Séries parallèles du graphique d'historique (toutes de même longueur)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendSeries {
    pub labels: Vec<String>,
    pub temperature: Vec<f64>,
    pub speed: Vec<i64>,
    pub cpu: Vec<f64>,
    pub memory: Vec<f64>,
}

impl TrendSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Identité d'un graphique vivant, liée au canvas de la carte qui l'a créé
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartHandle(Uuid);

impl ChartHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChartHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counters {
    pub online: usize,
    pub offline: usize,
    pub last_updated: String,
}

/// Ligne du panneau de gestion des appareils
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceListEntry {
    pub key: DeviceKey,
    pub name: String,
    pub endpoint: String,
    /// true -> style "avertissement" (hors ligne ou ajouté injoignable)
    pub flagged: bool,
}

pub trait View {
    fn insert_card(&mut self, card: &CardSpec, position: usize);
    fn remove_card(&mut self, key: &DeviceKey);
    fn patch_gauges(&mut self, key: &DeviceKey, gauges: &GaugeReadings);
    fn set_error(&mut self, key: &DeviceKey, message: &str);
    fn show_subview(&mut self, key: &DeviceKey, subview: SubView);
    fn draw_load_pie(&mut self, key: &DeviceKey, pie: &LoadPie);
    fn create_trend_chart(&mut self, key: &DeviceKey, series: &TrendSeries) -> ChartHandle;
    fn update_trend_chart(&mut self, chart: ChartHandle, series: &TrendSeries);
    fn destroy_chart(&mut self, chart: ChartHandle);
    fn set_card_width(&mut self, key: &DeviceKey, layout: Layout);
    fn set_layout_control(&mut self, control: &LayoutControl);
    fn set_counters(&mut self, counters: &Counters);
    fn set_countdown(&mut self, remaining_secs: u32);
    fn show_alert(&mut self, alert: &Alert);
    fn clear_alert(&mut self);
    fn render_device_list(&mut self, entries: &[DeviceListEntry]);
    fn open_editor(&mut self, key: &DeviceKey, draft: &DeviceForm);
    fn close_editor(&mut self, key: &DeviceKey);
}

/// Vue headless : chaque mutation devient un événement tracing
#[derive(Debug, Default)]
pub struct TracingView;

impl View for TracingView {
    fn insert_card(&mut self, card: &CardSpec, position: usize) {
        match &card.body {
            CardBody::Gauges(g) => info!(
                card = %card.key, position, name = %card.header.name, endpoint = %card.header.endpoint,
                "online card: {} / {}", g.temperature_label, g.fan_speed_label
            ),
            CardBody::Error(e) => info!(
                card = %card.key, position, name = %card.header.name, endpoint = %card.header.endpoint,
                "offline card: {}", e
            ),
        }
    }

    fn remove_card(&mut self, key: &DeviceKey) {
        info!(card = %key, "card removed");
    }

    fn patch_gauges(&mut self, key: &DeviceKey, gauges: &GaugeReadings) {
        info!(
            card = %key,
            temperature = %gauges.temperature_label,
            temperature_class = gauges.temperature_class,
            fan = %gauges.fan_speed_label,
            fan_class = gauges.fan_speed_class,
            "gauges updated"
        );
    }

    fn set_error(&mut self, key: &DeviceKey, message: &str) {
        info!(card = %key, "error indicator: {}", message);
    }

    fn show_subview(&mut self, key: &DeviceKey, subview: SubView) {
        info!(card = %key, ?subview, "sub-view switched");
    }

    fn draw_load_pie(&mut self, key: &DeviceKey, pie: &LoadPie) {
        info!(
            card = %key,
            cpu = pie.cpu,
            memory = pie.memory,
            cpu_free = pie.cpu_remainder(),
            memory_free = pie.memory_remainder(),
            accent = pie.cpu_color,
            "load pie drawn"
        );
    }

    fn create_trend_chart(&mut self, key: &DeviceKey, series: &TrendSeries) -> ChartHandle {
        let handle = ChartHandle::new();
        info!(card = %key, points = series.len(), "trend chart created");
        handle
    }

    fn update_trend_chart(&mut self, _chart: ChartHandle, series: &TrendSeries) {
        tracing::debug!(points = series.len(), "trend chart updated");
    }

    fn destroy_chart(&mut self, _chart: ChartHandle) {
        tracing::debug!("trend chart destroyed");
    }

    fn set_card_width(&mut self, key: &DeviceKey, layout: Layout) {
        tracing::debug!(card = %key, class = layout.column_class(), "card width applied");
    }

    fn set_layout_control(&mut self, control: &LayoutControl) {
        info!("layout control: {}", control.label);
    }

    fn set_counters(&mut self, counters: &Counters) {
        info!(
            "Online: {} | Offline: {} | Last update: {}",
            counters.online, counters.offline, counters.last_updated
        );
    }

    fn set_countdown(&mut self, remaining_secs: u32) {
        tracing::trace!(remaining_secs, "countdown");
    }

    fn show_alert(&mut self, alert: &Alert) {
        info!(level = alert.level.as_str(), persistent = alert.persistent, "{}", alert.message);
    }

    fn clear_alert(&mut self) {
        tracing::debug!("alert cleared");
    }

    fn render_device_list(&mut self, entries: &[DeviceListEntry]) {
        for entry in entries {
            let marker = if entry.flagged { "!" } else { " " };
            info!("{} {} ({})", marker, entry.name, entry.endpoint);
        }
    }

    fn open_editor(&mut self, key: &DeviceKey, draft: &DeviceForm) {
        info!(card = %key, "editing {} ({}:{})", draft.name, draft.address, draft.port);
    }

    fn close_editor(&mut self, key: &DeviceKey) {
        info!(card = %key, "edit closed");
    }
}
