//! Periodic refresh: a one-second countdown and the pass it triggers.
//!
//! A pass fans out one status request per registered device and waits for all
//! of them to settle, off the main loop. The loop then applies the results one
//! by one in registry order, so the countdown keeps ticking while requests are
//! in flight.

use crate::history::HistoryStore;
use crate::layout::Layout;
use crate::models::{Device, DeviceKey, StatusResult};
use crate::poller::StatusSource;
use crate::reconciler::CardReconciler;
use crate::view::{Counters, View};
use chrono::Local;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Compte à rebours en secondes entières, décrémenté une fois par seconde
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    period: u32,
    remaining: u32,
}

impl Countdown {
    pub fn new(period: Duration) -> Self {
        let period = u32::try_from(period.as_secs()).unwrap_or(u32::MAX).max(1);
        Self { period, remaining: period }
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Retourne true quand le compte atteint zéro (il repart alors de la période)
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.remaining = self.period;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.remaining = self.period;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub online: usize,
    pub offline: usize,
    pub last_updated: String,
}

impl RefreshSummary {
    pub fn total(&self) -> usize {
        self.online + self.offline
    }

    pub fn counters(&self) -> Counters {
        Counters {
            online: self.online,
            offline: self.offline,
            last_updated: self.last_updated.clone(),
        }
    }
}

/// Résultats d'une passe, avec l'instantané des appareils interrogés
#[derive(Debug, Clone)]
pub struct PassResults {
    pub pass: u64,
    pub devices: Vec<Device>,
    pub results: Vec<StatusResult>,
}

pub type PassJob = BoxFuture<'static, PassResults>;

/// Interroge tous les appareils en parallèle; l'ordre des résultats suit celui des appareils
pub async fn poll_all(source: &dyn StatusSource, devices: &[Device]) -> Vec<StatusResult> {
    join_all(devices.iter().map(|device| source.fetch_status(device))).await
}

pub struct RefreshCycle {
    countdown: Countdown,
    passes: u64,
    completed: u64,
}

impl RefreshCycle {
    pub fn new(period: Duration) -> Self {
        Self {
            countdown: Countdown::new(period),
            passes: 0,
            completed: 0,
        }
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    /// Passes démarrées
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Passes appliquées
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Un tick d'une seconde : publie le compte à rebours, retourne true si une passe est due
    pub fn tick(&mut self, view: &mut dyn View) -> bool {
        let due = self.countdown.tick();
        view.set_countdown(self.countdown.remaining());
        due
    }

    /// Démarre une passe sur un instantané du registre. Le futur retourné ne touche
    /// à aucun état local : la boucle principale le confie à sa propre tâche.
    pub fn begin(&mut self, source: Arc<dyn StatusSource>, devices: Vec<Device>) -> PassJob {
        self.passes += 1;
        let pass = self.passes;
        debug!("Refresh pass #{} over {} devices", pass, devices.len());
        async move {
            let results = poll_all(source.as_ref(), &devices).await;
            PassResults { pass, devices, results }
        }
        .boxed()
    }

    /// Applique une passe terminée dans l'ordre du registre courant.
    ///
    /// Un appareil retiré pendant la passe est ignoré; un appareil apparu depuis
    /// l'instantané attend la passe suivante.
    pub fn apply(
        &mut self,
        batch: PassResults,
        registered: &[Device],
        cards: &mut CardReconciler,
        history: &mut HistoryStore,
        layout: Layout,
        view: &mut dyn View,
    ) -> RefreshSummary {
        self.completed += 1;
        let keys: Vec<DeviceKey> = registered.iter().map(|d| d.key.clone()).collect();
        cards.retain(&keys, history, view);
        history.retain(&keys, view);

        let mut results: HashMap<DeviceKey, StatusResult> = batch
            .devices
            .into_iter()
            .map(|device| device.key)
            .zip(batch.results)
            .collect();

        let (mut online, mut offline) = (0, 0);
        for (index, device) in registered.iter().enumerate() {
            let Some(result) = results.remove(&device.key) else {
                continue;
            };
            match &result {
                StatusResult::Online(sample) => {
                    online += 1;
                    history.record(&device.key, sample);
                }
                StatusResult::Offline { .. } => offline += 1,
            }
            cards.reconcile(device, index, &result, layout, history, view);
        }

        let summary = RefreshSummary {
            online,
            offline,
            last_updated: Local::now().format("%H:%M:%S").to_string(),
        };
        view.set_counters(&summary.counters());
        info!(
            "Refresh #{} complete: {} online, {} offline at {}",
            batch.pass, summary.online, summary.offline, summary.last_updated
        );
        summary
    }
}

impl Default for RefreshCycle {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_wraps_to_period() {
        let mut countdown = Countdown::new(Duration::from_secs(3));
        assert!(!countdown.tick());
        assert_eq!(countdown.remaining(), 2);
        assert!(!countdown.tick());
        assert!(countdown.tick());
        assert_eq!(countdown.remaining(), 3);
    }

    #[test]
    fn test_countdown_period_is_at_least_one_second() {
        let mut countdown = Countdown::new(Duration::from_millis(200));
        assert_eq!(countdown.period(), 1);
        assert!(countdown.tick());
        assert!(countdown.tick());
    }

    #[test]
    fn test_reset_restores_period() {
        let mut countdown = Countdown::new(DEFAULT_REFRESH_INTERVAL);
        countdown.tick();
        countdown.tick();
        countdown.reset();
        assert_eq!(countdown.remaining(), 10);
    }
}
