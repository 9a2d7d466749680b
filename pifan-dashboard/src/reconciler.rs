/**
 * CARD RECONCILER - Machine à états par appareil pour les cartes du tableau de bord
 *
 * RÔLE : Décide, pour chaque nouveau relevé, s'il faut créer, patcher ou
 * reconstruire la carte d'un appareil. L'état rendu est gardé ici de façon
 * explicite, on ne relit jamais le rendu pour deviner l'état précédent.
 *
 * TRANSITIONS :
 * - (absente)        -> Online | Offline : création à la position du registre
 * - Online <-> Offline                   : reconstruction complète (nouveau canvas)
 * - Online -> Online                     : patch en place, sous-vue conservée
 * - Offline -> Offline                   : texte d'erreur uniquement
 *
 * PROTOCOLE EN DEUX PHASES :
 * create() pose la structure de la carte, attach() y branche les graphiques.
 * Le graphique n'est jamais attaché à un canvas qui n'existe pas encore.
 */

use crate::history::HistoryStore;
use crate::layout::Layout;
use crate::models::{Device, DeviceKey, StatusResult, StatusSample};
use crate::view::{CardSpec, GaugeReadings, LoadPie, SubView, View};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardState {
    Online { subview: SubView },
    Offline { error: String },
}

impl CardState {
    pub fn is_online(&self) -> bool {
        matches!(self, CardState::Online { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Created,
    Rebuilt,
    Patched,
    Unchanged,
}

#[derive(Debug, Default)]
pub struct CardReconciler {
    cards: HashMap<DeviceKey, CardState>,
    /// Ordre des cartes tel que rendu
    order: Vec<DeviceKey>,
}

impl CardReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, key: &DeviceKey) -> Option<&CardState> {
        self.cards.get(key)
    }

    pub fn rendered(&self) -> &[DeviceKey] {
        &self.order
    }

    pub fn is_offline(&self, key: &DeviceKey) -> bool {
        matches!(self.cards.get(key), Some(CardState::Offline { .. }))
    }

    /// Applique un relevé à la carte de l'appareil.
    /// `index` est la position de l'appareil dans l'ordre du registre.
    pub fn reconcile(
        &mut self,
        device: &Device,
        index: usize,
        result: &StatusResult,
        layout: Layout,
        history: &mut HistoryStore,
        view: &mut dyn View,
    ) -> Reconciliation {
        let key = &device.key;
        let previous = self.cards.get(key).cloned();

        match (previous, result) {
            (None, _) => {
                self.create(device, index, result, layout, view);
                self.attach(key, result, history, view);
                Reconciliation::Created
            }
            (Some(CardState::Online { .. }), StatusResult::Offline { .. })
            | (Some(CardState::Offline { .. }), StatusResult::Online(_)) => {
                debug!("Card {} crossed the online/offline boundary, rebuilding", key);
                self.destroy(key, history, view);
                self.create(device, index, result, layout, view);
                self.attach(key, result, history, view);
                Reconciliation::Rebuilt
            }
            (Some(CardState::Online { .. }), StatusResult::Online(sample)) => {
                self.patch(key, sample, history, view);
                Reconciliation::Patched
            }
            (Some(CardState::Offline { error: shown }), StatusResult::Offline { error }) => {
                if &shown == error {
                    Reconciliation::Unchanged
                } else {
                    view.set_error(key, error);
                    self.cards.insert(key.clone(), CardState::Offline { error: error.clone() });
                    Reconciliation::Patched
                }
            }
        }
    }

    /// Phase 1 : structure de la carte, insérée à la position du registre
    pub fn create(
        &mut self,
        device: &Device,
        index: usize,
        result: &StatusResult,
        layout: Layout,
        view: &mut dyn View,
    ) {
        let (spec, state) = match result {
            StatusResult::Online(sample) => (
                CardSpec::online(device, sample, layout),
                CardState::Online { subview: SubView::Overview },
            ),
            StatusResult::Offline { error } => (
                CardSpec::offline(device, error, layout),
                CardState::Offline { error: error.clone() },
            ),
        };

        let position = index.min(self.order.len());
        view.insert_card(&spec, position);
        self.order.insert(position, device.key.clone());
        self.cards.insert(device.key.clone(), state);
    }

    /// Phase 2 : branche les graphiques sur le canvas fraîchement inséré
    pub fn attach(
        &mut self,
        key: &DeviceKey,
        result: &StatusResult,
        history: &mut HistoryStore,
        view: &mut dyn View,
    ) {
        if let (Some(CardState::Online { .. }), StatusResult::Online(sample)) = (self.cards.get(key), result) {
            view.draw_load_pie(key, &LoadPie::from_sample(sample));
            history.render(key, view);
        }
    }

    fn patch(&mut self, key: &DeviceKey, sample: &StatusSample, history: &mut HistoryStore, view: &mut dyn View) {
        view.patch_gauges(key, &GaugeReadings::from_sample(sample));
        view.draw_load_pie(key, &LoadPie::from_sample(sample));
        // mis à jour à chaque tick, même si la sous-vue historique est masquée
        history.render(key, view);
    }

    fn destroy(&mut self, key: &DeviceKey, history: &mut HistoryStore, view: &mut dyn View) {
        history.detach_chart(key, view);
        view.remove_card(key);
        self.order.retain(|k| k != key);
        self.cards.remove(key);
    }

    /// Bascule vue d'ensemble / historique. Sans effet sur une carte hors ligne ou absente.
    pub fn toggle_subview(&mut self, key: &DeviceKey, subview: SubView, view: &mut dyn View) -> bool {
        match self.cards.get_mut(key) {
            Some(CardState::Online { subview: current }) => {
                *current = subview;
                view.show_subview(key, subview);
                true
            }
            _ => false,
        }
    }

    /// Retire la carte (et ses graphiques) si elle existe
    pub fn remove(&mut self, key: &DeviceKey, history: &mut HistoryStore, view: &mut dyn View) -> bool {
        if !self.cards.contains_key(key) {
            return false;
        }
        self.destroy(key, history, view);
        true
    }

    /// Retire les cartes des appareils qui ne sont plus dans le registre
    pub fn retain(&mut self, keep: &[DeviceKey], history: &mut HistoryStore, view: &mut dyn View) {
        let stale: Vec<DeviceKey> = self
            .order
            .iter()
            .filter(|key| !keep.contains(key))
            .cloned()
            .collect();
        for key in stale {
            debug!("Card {} no longer registered, removing", key);
            self.destroy(&key, history, view);
        }
    }
}
