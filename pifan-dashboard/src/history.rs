//! Rolling per-device telemetry history feeding the trend chart.
//!
//! Buffers outlive cards: a card rebuilt across an online/offline boundary
//! gets a fresh chart drawn from the same buffer. Chart handles, on the other
//! hand, belong to the card that created them and are detached when it goes.

use crate::models::{DeviceKey, StatusSample};
use crate::view::{ChartHandle, TrendSeries, View};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

pub const DEFAULT_MAX_HISTORY_POINTS: usize = 120;

#[derive(Debug, Clone, PartialEq)]
struct HistoryPoint {
    label: String,
    temperature: f64,
    speed: i64,
    cpu: f64,
    memory: f64,
}

/// FIFO bounded buffer; one point per successful poll
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    points: VecDeque<HistoryPoint>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: &StatusSample) {
        self.points.push_back(HistoryPoint {
            label: sample.time_label(),
            temperature: sample.temperature,
            speed: sample.fan_speed_percent,
            cpu: sample.cpu_percent,
            memory: sample.memory_percent,
        });
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn series(&self) -> TrendSeries {
        let mut series = TrendSeries::default();
        for point in &self.points {
            series.labels.push(point.label.clone());
            series.temperature.push(point.temperature);
            series.speed.push(point.speed);
            series.cpu.push(point.cpu);
            series.memory.push(point.memory);
        }
        series
    }
}

pub struct HistoryStore {
    buffers: HashMap<DeviceKey, HistoryBuffer>,
    charts: HashMap<DeviceKey, ChartHandle>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: HashMap::new(),
            charts: HashMap::new(),
            capacity,
        }
    }

    pub fn record(&mut self, key: &DeviceKey, sample: &StatusSample) {
        let capacity = self.capacity;
        self.buffers
            .entry(key.clone())
            .or_insert_with(|| HistoryBuffer::new(capacity))
            .push(sample);
    }

    pub fn buffer(&self, key: &DeviceKey) -> Option<&HistoryBuffer> {
        self.buffers.get(key)
    }

    pub fn chart(&self, key: &DeviceKey) -> Option<ChartHandle> {
        self.charts.get(key).copied()
    }

    /// Pousse le buffer complet vers le graphique : création au premier appel, mise à jour ensuite
    pub fn render(&mut self, key: &DeviceKey, view: &mut dyn View) {
        let Some(buffer) = self.buffers.get(key) else {
            return;
        };
        let series = buffer.series();
        match self.charts.get(key) {
            Some(chart) => view.update_trend_chart(*chart, &series),
            None => {
                let chart = view.create_trend_chart(key, &series);
                self.charts.insert(key.clone(), chart);
            }
        }
    }

    /// Le canvas va disparaître avec sa carte : on libère le graphique, pas les données
    pub fn detach_chart(&mut self, key: &DeviceKey, view: &mut dyn View) {
        if let Some(chart) = self.charts.remove(key) {
            view.destroy_chart(chart);
        }
    }

    pub fn remove(&mut self, key: &DeviceKey, view: &mut dyn View) {
        self.detach_chart(key, view);
        if self.buffers.remove(key).is_some() {
            debug!("History discarded for {}", key);
        }
    }

    /// Déplace l'historique quand l'adresse d'un appareil change
    pub fn rekey(&mut self, from: &DeviceKey, to: &DeviceKey, view: &mut dyn View) {
        if from == to {
            return;
        }
        self.detach_chart(from, view);
        if let Some(buffer) = self.buffers.remove(from) {
            self.buffers.insert(to.clone(), buffer);
        }
    }

    /// Oublie les appareils qui ne sont plus dans le registre
    pub fn retain(&mut self, keep: &[DeviceKey], view: &mut dyn View) {
        let stale: Vec<DeviceKey> = self
            .buffers
            .keys()
            .chain(self.charts.keys())
            .filter(|key| !keep.contains(key))
            .cloned()
            .collect();
        for key in stale {
            self.remove(&key, view);
        }
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY_POINTS)
    }
}
