/*!
Vue d'enregistrement pour les tests

Chaque appel au trait View devient un ViewOp. Les clones partagent le même
journal : le test garde une copie, le Dashboard possède l'autre.
*/

use pifan_dashboard::alerts::Alert;
use pifan_dashboard::layout::{Layout, LayoutControl};
use pifan_dashboard::state::{new_state, Shared};
use pifan_dashboard::view::{
    CardBody, CardSpec, ChartHandle, Counters, DeviceListEntry, GaugeReadings, LoadPie, SubView, TrendSeries, View,
};
use pifan_dashboard::{DeviceForm, DeviceKey};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewOp {
    InsertCard { key: DeviceKey, position: usize, online: bool, layout: Layout },
    RemoveCard(DeviceKey),
    PatchGauges(DeviceKey, GaugeReadings),
    SetError(DeviceKey, String),
    ShowSubview(DeviceKey, SubView),
    DrawLoadPie(DeviceKey, LoadPie),
    CreateChart { key: DeviceKey, chart: ChartHandle, points: usize },
    UpdateChart { chart: ChartHandle, points: usize },
    DestroyChart(ChartHandle),
    SetCardWidth(DeviceKey, Layout),
    SetLayoutControl(LayoutControl),
    SetCounters(Counters),
    SetCountdown(u32),
    ShowAlert(Alert),
    ClearAlert,
    RenderDeviceList(Vec<DeviceListEntry>),
    OpenEditor(DeviceKey, DeviceForm),
    CloseEditor(DeviceKey),
}

#[derive(Clone, Default)]
pub struct RecordingView {
    ops: Shared<Vec<ViewOp>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self { ops: new_state(Vec::new()) }
    }

    fn push(&self, op: ViewOp) {
        self.ops.lock().push(op);
    }

    pub fn ops(&self) -> Vec<ViewOp> {
        self.ops.lock().clone()
    }

    /// Vide le journal (utile pour n'observer qu'une passe)
    pub fn take(&self) -> Vec<ViewOp> {
        std::mem::take(&mut *self.ops.lock())
    }

    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&ViewOp) -> bool,
    {
        self.ops.lock().iter().filter(|op| predicate(op)).count()
    }

    pub fn last_counters(&self) -> Option<Counters> {
        self.ops.lock().iter().rev().find_map(|op| match op {
            ViewOp::SetCounters(counters) => Some(counters.clone()),
            _ => None,
        })
    }

    pub fn last_alert(&self) -> Option<Alert> {
        self.ops.lock().iter().rev().find_map(|op| match op {
            ViewOp::ShowAlert(alert) => Some(alert.clone()),
            _ => None,
        })
    }

    pub fn last_device_list(&self) -> Option<Vec<DeviceListEntry>> {
        self.ops.lock().iter().rev().find_map(|op| match op {
            ViewOp::RenderDeviceList(entries) => Some(entries.clone()),
            _ => None,
        })
    }

    /// Ordre des cartes affichées, rejoué à partir des insertions/suppressions
    pub fn card_order(&self) -> Vec<DeviceKey> {
        let mut order: Vec<DeviceKey> = Vec::new();
        for op in self.ops.lock().iter() {
            match op {
                ViewOp::InsertCard { key, position, .. } => {
                    let position = (*position).min(order.len());
                    order.insert(position, key.clone());
                }
                ViewOp::RemoveCard(key) => order.retain(|k| k != key),
                _ => {}
            }
        }
        order
    }
}

impl View for RecordingView {
    fn insert_card(&mut self, card: &CardSpec, position: usize) {
        self.push(ViewOp::InsertCard {
            key: card.key.clone(),
            position,
            online: matches!(card.body, CardBody::Gauges(_)),
            layout: card.layout,
        });
    }

    fn remove_card(&mut self, key: &DeviceKey) {
        self.push(ViewOp::RemoveCard(key.clone()));
    }

    fn patch_gauges(&mut self, key: &DeviceKey, gauges: &GaugeReadings) {
        self.push(ViewOp::PatchGauges(key.clone(), gauges.clone()));
    }

    fn set_error(&mut self, key: &DeviceKey, message: &str) {
        self.push(ViewOp::SetError(key.clone(), message.to_string()));
    }

    fn show_subview(&mut self, key: &DeviceKey, subview: SubView) {
        self.push(ViewOp::ShowSubview(key.clone(), subview));
    }

    fn draw_load_pie(&mut self, key: &DeviceKey, pie: &LoadPie) {
        self.push(ViewOp::DrawLoadPie(key.clone(), *pie));
    }

    fn create_trend_chart(&mut self, key: &DeviceKey, series: &TrendSeries) -> ChartHandle {
        let chart = ChartHandle::new();
        self.push(ViewOp::CreateChart { key: key.clone(), chart, points: series.len() });
        chart
    }

    fn update_trend_chart(&mut self, chart: ChartHandle, series: &TrendSeries) {
        self.push(ViewOp::UpdateChart { chart, points: series.len() });
    }

    fn destroy_chart(&mut self, chart: ChartHandle) {
        self.push(ViewOp::DestroyChart(chart));
    }

    fn set_card_width(&mut self, key: &DeviceKey, layout: Layout) {
        self.push(ViewOp::SetCardWidth(key.clone(), layout));
    }

    fn set_layout_control(&mut self, control: &LayoutControl) {
        self.push(ViewOp::SetLayoutControl(*control));
    }

    fn set_counters(&mut self, counters: &Counters) {
        self.push(ViewOp::SetCounters(counters.clone()));
    }

    fn set_countdown(&mut self, remaining_secs: u32) {
        self.push(ViewOp::SetCountdown(remaining_secs));
    }

    fn show_alert(&mut self, alert: &Alert) {
        self.push(ViewOp::ShowAlert(alert.clone()));
    }

    fn clear_alert(&mut self) {
        self.push(ViewOp::ClearAlert);
    }

    fn render_device_list(&mut self, entries: &[DeviceListEntry]) {
        self.push(ViewOp::RenderDeviceList(entries.to_vec()));
    }

    fn open_editor(&mut self, key: &DeviceKey, draft: &DeviceForm) {
        self.push(ViewOp::OpenEditor(key.clone(), draft.clone()));
    }

    fn close_editor(&mut self, key: &DeviceKey) {
        self.push(ViewOp::CloseEditor(key.clone()));
    }
}
