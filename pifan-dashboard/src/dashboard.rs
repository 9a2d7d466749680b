/**
 * DASHBOARD - Propriétaire unique de tout l'état du tableau de bord
 *
 * RÔLE : Relie registre, polling, historique, réconciliateur, préférence de
 * disposition, alertes et édition. Toutes les méthodes prennent &mut self :
 * une seule tâche coopérative, aucun verrou sur le chemin chaud.
 *
 * FONCTIONNEMENT :
 * - run() multiplexe le tick d'une seconde, les commandes opérateur et les
 *   travaux réseau terminés (select!)
 * - Passes, sondes et appels au service de gestion tournent dans des tâches à
 *   part; la boucle n'applique que leurs résultats, le tick n'attend jamais
 * - Chaque mutation réussie recharge le registre PUIS lance une passe immédiate
 * - Une passe immédiate ne remet pas le compte à rebours à zéro
 * - Les échecs de l'API de gestion deviennent des alertes, jamais des paniques
 */

use crate::alerts::{Alert, AlertBanner, AlertLevel};
use crate::config::DashboardConfig;
use crate::editor::EditSession;
use crate::error::{FleetError, RegistryError};
use crate::history::HistoryStore;
use crate::layout::{Layout, LayoutPreference, PreferenceStore};
use crate::models::{Device, DeviceKey, DeviceRecord};
use crate::poller::StatusSource;
use crate::reconciler::CardReconciler;
use crate::refresh::{PassJob, PassResults, RefreshCycle, RefreshSummary};
use crate::registry::{submit_add, submit_edit, submit_remove, DeviceRegistry, FleetApi, MutationOutcome, Submission};
use crate::validation::{format_address_input, DeviceForm};
use crate::view::{DeviceListEntry, SubView, View};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

const CHECKING_STATUS: &str = "Checking device status...";
const ADD_REACHABLE: &str = "Device added and reachable.";
const ADD_UNREACHABLE: &str = "Device added but not reachable (offline or status API unavailable).";
const ADD_CONFLICT: &str = "That device address already exists.";
const ADD_FAILED: &str = "Failed to add device due to an unexpected error.";
const EDIT_REACHABLE: &str = "Device updated successfully and is reachable.";
const EDIT_UNREACHABLE: &str = "Device updated, but is not reachable (offline or status API unavailable).";
const EDIT_FAILED: &str = "Error updating device.";
const DELETE_FAILED: &str = "Could not delete device.";

/// Commandes opérateur (console stdin ou tests)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add { name: String, address: String, port: String },
    Edit { address: String },
    Save { name: String, address: String, port: String },
    Cancel,
    Remove { address: String },
    View { address: String, subview: SubView },
    Layout,
    Refresh,
    List,
    Dismiss,
    Quit,
}

/// Collaborateurs externes injectés au démarrage
pub struct DashboardParts {
    pub fleet: Arc<dyn FleetApi>,
    pub status: Arc<dyn StatusSource>,
    pub preferences: Box<dyn PreferenceStore>,
    pub view: Box<dyn View>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSettings {
    pub refresh_interval: Duration,
    pub max_history_points: usize,
    pub alert_lifetime: Duration,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        DashboardSettings::from(&DashboardConfig::default())
    }
}

impl From<&DashboardConfig> for DashboardSettings {
    fn from(cfg: &DashboardConfig) -> Self {
        Self {
            refresh_interval: cfg.refresh_interval(),
            max_history_points: cfg.max_history_points,
            alert_lifetime: cfg.alert_lifetime(),
        }
    }
}

/// Travail réseau en cours, lancé hors de la boucle principale
type Pending<T> = BoxFuture<'static, Result<T, RegistryError>>;

/// Travail réseau terminé, rendu à la boucle principale pour application
enum Completion {
    Pass(PassResults),
    Added(Result<Submission, RegistryError>),
    Edited {
        original: DeviceKey,
        result: Result<Submission, RegistryError>,
    },
    Removed {
        address: String,
        result: Result<Option<Vec<Device>>, RegistryError>,
    },
    Listed(Result<Vec<DeviceRecord>, FleetError>),
}

fn spawn_job<F>(jobs: &mpsc::UnboundedSender<Completion>, work: F)
where
    F: Future<Output = Completion> + Send + 'static,
{
    let jobs = jobs.clone();
    tokio::spawn(async move {
        // la boucle a pu s'arrêter entre-temps
        jobs.send(work.await).ok();
    });
}

pub struct Dashboard {
    registry: DeviceRegistry,
    status: Arc<dyn StatusSource>,
    history: HistoryStore,
    cards: CardReconciler,
    layout: LayoutPreference,
    refresh: RefreshCycle,
    alerts: AlertBanner,
    editor: EditSession,
    add_form: DeviceForm,
    /// Appareil ajouté/édité injoignable, signalé au prochain rendu de la liste seulement
    just_added_offline: Option<DeviceKey>,
    last_summary: Option<RefreshSummary>,
    view: Box<dyn View>,
}

impl Dashboard {
    pub fn new(parts: DashboardParts, settings: DashboardSettings) -> Self {
        Self {
            registry: DeviceRegistry::new(parts.fleet),
            status: parts.status,
            history: HistoryStore::new(settings.max_history_points),
            cards: CardReconciler::new(),
            layout: LayoutPreference::load(parts.preferences),
            refresh: RefreshCycle::new(settings.refresh_interval),
            alerts: AlertBanner::new(settings.alert_lifetime),
            editor: EditSession::new(),
            add_form: DeviceForm::default(),
            just_added_offline: None,
            last_summary: None,
            view: parts.view,
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn cards(&self) -> &CardReconciler {
        &self.cards
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn layout(&self) -> Layout {
        self.layout.current()
    }

    pub fn refresh_cycle(&self) -> &RefreshCycle {
        &self.refresh
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alerts.current()
    }

    pub fn editing(&self) -> Option<&DeviceKey> {
        self.editor.current()
    }

    pub fn add_form(&self) -> &DeviceForm {
        &self.add_form
    }

    pub fn last_summary(&self) -> Option<&RefreshSummary> {
        self.last_summary.as_ref()
    }

    /// Registre, disposition, compte à rebours et liste; sans passe
    async fn prepare(&mut self) {
        if let Err(e) = self.registry.load().await {
            error!("Failed to load device list: {}", e);
        }
        self.layout.apply(self.cards.rendered(), self.view.as_mut());
        self.view.set_countdown(self.refresh.countdown().remaining());
        self.render_device_list();
    }

    /// Chargement initial : registre, disposition, compte à rebours, première passe
    pub async fn start(&mut self) -> RefreshSummary {
        self.prepare().await;
        self.refresh_now().await
    }

    /// Expiration des alertes et compte à rebours; retourne true si une passe est due
    fn advance(&mut self, now: Instant) -> bool {
        if self.alerts.expire(now) {
            self.view.clear_alert();
        }
        self.refresh.tick(self.view.as_mut())
    }

    /// Tick d'une seconde suivi, si elle est due, d'une passe attendue sur place
    pub async fn tick(&mut self, now: Instant) -> Option<RefreshSummary> {
        if self.advance(now) {
            Some(self.refresh_now().await)
        } else {
            None
        }
    }

    fn begin_pass(&mut self) -> PassJob {
        self.refresh
            .begin(Arc::clone(&self.status), self.registry.devices().to_vec())
    }

    fn apply_pass(&mut self, batch: PassResults) -> RefreshSummary {
        let summary = self.refresh.apply(
            batch,
            self.registry.devices(),
            &mut self.cards,
            &mut self.history,
            self.layout.current(),
            self.view.as_mut(),
        );
        self.last_summary = Some(summary.clone());
        summary
    }

    pub async fn refresh_now(&mut self) -> RefreshSummary {
        let batch = self.begin_pass().await;
        self.apply_pass(batch)
    }

    fn show_alert(&mut self, alert: Alert) {
        self.view.show_alert(&alert);
        self.alerts.show(alert, Instant::now());
    }

    pub fn dismiss_alert(&mut self) -> bool {
        let dismissed = self.alerts.dismiss();
        if dismissed {
            self.view.clear_alert();
        }
        dismissed
    }

    pub fn set_add_form(&mut self, form: DeviceForm) {
        self.add_form = form;
    }

    /// Saisie de l'adresse dans le formulaire d'ajout, masque appliqué
    pub fn type_address(&mut self, raw: &str) -> &str {
        self.add_form.address = format_address_input(&self.add_form.address, raw);
        &self.add_form.address
    }

    pub async fn add_device(&mut self) -> Result<MutationOutcome, RegistryError> {
        let submission = self.submit_add_form()?.await;
        let (outcome, pass) = self.finish_add(submission)?;
        let batch = pass.await;
        self.apply_pass(batch);
        Ok(outcome)
    }

    fn submit_add_form(&mut self) -> Result<Pending<Submission>, RegistryError> {
        self.dismiss_alert();
        let device = match self.add_form.validate() {
            Ok(device) => device,
            Err(e) => {
                self.show_alert(Alert::persistent(AlertLevel::Warning, e.to_string()));
                return Err(e.into());
            }
        };

        self.show_alert(Alert::persistent(AlertLevel::Info, CHECKING_STATUS));
        Ok(submit_add(self.registry.api(), Arc::clone(&self.status), device).boxed())
    }

    fn finish_add(
        &mut self,
        submission: Result<Submission, RegistryError>,
    ) -> Result<(MutationOutcome, PassJob), RegistryError> {
        match submission {
            Ok(Submission { outcome, devices }) => {
                if let Some(devices) = devices {
                    self.registry.replace(devices);
                }
                self.add_form.clear();
                if outcome.reachable {
                    self.show_alert(Alert::transient(AlertLevel::Success, ADD_REACHABLE));
                } else {
                    self.show_alert(Alert::transient(AlertLevel::Warning, ADD_UNREACHABLE));
                    self.just_added_offline = Some(outcome.device.key.clone());
                }
                self.render_device_list();
                self.editor.cancel(self.view.as_mut());
                Ok((outcome, self.begin_pass()))
            }
            Err(e) => {
                if e.is_conflict() {
                    warn!("Add rejected, address already registered");
                    self.show_alert(Alert::persistent(AlertLevel::Danger, ADD_CONFLICT));
                } else {
                    error!("Add device error: {}", e);
                    self.show_alert(Alert::persistent(AlertLevel::Danger, ADD_FAILED));
                }
                Err(e)
            }
        }
    }

    /// Ouvre l'édition d'un appareil; une autre édition ouverte est annulée d'abord
    pub fn begin_edit(&mut self, address: &str) -> Result<(), RegistryError> {
        let device = self
            .registry
            .find(address)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownDevice(address.to_string()))?;
        self.editor.begin(&device, self.view.as_mut());
        Ok(())
    }

    pub fn cancel_edit(&mut self) -> bool {
        self.editor.cancel(self.view.as_mut())
    }

    pub async fn save_edit(&mut self, form: &DeviceForm) -> Result<MutationOutcome, RegistryError> {
        let (original, pending) = self.submit_edit_form(form)?;
        let submission = pending.await;
        let (outcome, pass) = self.finish_edit(&original, submission)?;
        let batch = pass.await;
        self.apply_pass(batch);
        Ok(outcome)
    }

    fn submit_edit_form(&mut self, form: &DeviceForm) -> Result<(DeviceKey, Pending<Submission>), RegistryError> {
        let original = self
            .editor
            .original_address()
            .map(str::to_string)
            .ok_or(RegistryError::NotEditing)?;

        let device = match form.validate() {
            Ok(device) => device,
            Err(e) => {
                self.show_alert(Alert::persistent(AlertLevel::Warning, e.to_string()));
                self.editor.finish(self.view.as_mut());
                self.render_device_list();
                return Err(e.into());
            }
        };

        self.show_alert(Alert::persistent(AlertLevel::Info, CHECKING_STATUS));
        self.editor.finish(self.view.as_mut());
        let original_key = DeviceKey::from_address(&original);
        let pending = submit_edit(self.registry.api(), Arc::clone(&self.status), original, device).boxed();
        Ok((original_key, pending))
    }

    fn finish_edit(
        &mut self,
        original: &DeviceKey,
        submission: Result<Submission, RegistryError>,
    ) -> Result<(MutationOutcome, PassJob), RegistryError> {
        match submission {
            Ok(Submission { outcome, devices }) => {
                if let Some(devices) = devices {
                    self.registry.replace(devices);
                }
                if outcome.reachable {
                    self.show_alert(Alert::transient(AlertLevel::Success, EDIT_REACHABLE));
                } else {
                    self.show_alert(Alert::persistent(AlertLevel::Warning, EDIT_UNREACHABLE));
                    self.just_added_offline = Some(outcome.device.key.clone());
                }
                // la carte est reconstruite par la passe suivante, avec le nouvel en-tête
                self.history.rekey(original, &outcome.device.key, self.view.as_mut());
                self.cards.remove(original, &mut self.history, self.view.as_mut());
                self.render_device_list();
                Ok((outcome, self.begin_pass()))
            }
            Err(e) => {
                error!("Edit device error: {}", e);
                self.show_alert(Alert::persistent(AlertLevel::Danger, EDIT_FAILED));
                self.render_device_list();
                Err(e)
            }
        }
    }

    pub async fn remove_device(&mut self, address: &str) -> Result<(), RegistryError> {
        let result = self.submit_removal(address).await;
        let pass = self.finish_remove(address, result)?;
        let batch = pass.await;
        self.apply_pass(batch);
        Ok(())
    }

    fn submit_removal(&self, address: &str) -> Pending<Option<Vec<Device>>> {
        submit_remove(self.registry.api(), address.to_string()).boxed()
    }

    fn finish_remove(
        &mut self,
        address: &str,
        result: Result<Option<Vec<Device>>, RegistryError>,
    ) -> Result<PassJob, RegistryError> {
        let devices = match result {
            Ok(devices) => devices,
            Err(e) => {
                error!("Delete device error: {}", e);
                self.show_alert(Alert::persistent(AlertLevel::Danger, DELETE_FAILED));
                return Err(e);
            }
        };
        if let Some(devices) = devices {
            self.registry.replace(devices);
        }

        let key = DeviceKey::from_address(address);
        if self.editor.current() == Some(&key) {
            self.editor.cancel(self.view.as_mut());
        }
        self.cards.remove(&key, &mut self.history, self.view.as_mut());
        self.history.remove(&key, self.view.as_mut());
        self.render_device_list();
        Ok(self.begin_pass())
    }

    pub fn show_subview(&mut self, address: &str, subview: SubView) -> bool {
        let key = DeviceKey::from_address(address);
        self.cards.toggle_subview(&key, subview, self.view.as_mut())
    }

    pub fn toggle_layout(&mut self) -> Layout {
        self.layout.toggle(self.cards.rendered(), self.view.as_mut())
    }

    /// Rendu du panneau de gestion; consomme le signalement "ajouté injoignable"
    pub fn render_device_list(&mut self) {
        let flagged_key = self.just_added_offline.take();
        let entries: Vec<DeviceListEntry> = self
            .registry
            .devices()
            .iter()
            .map(|device: &Device| DeviceListEntry {
                key: device.key.clone(),
                name: device.name.clone(),
                endpoint: device.endpoint(),
                flagged: flagged_key.as_ref() == Some(&device.key) || self.cards.is_offline(&device.key),
            })
            .collect();
        self.view.render_device_list(&entries);
    }

    /// Traite une commande sans attendre le réseau; retourne false sur Quit
    fn dispatch(&mut self, command: Command, jobs: &mpsc::UnboundedSender<Completion>) -> bool {
        debug!("Command: {:?}", command);
        // les échecs sont déjà signalés par une alerte
        let outcome = match command {
            Command::Add { name, address, port } => {
                let address = format_address_input(&address, &address);
                self.set_add_form(DeviceForm::new(name, address, port));
                self.submit_add_form()
                    .map(|pending| spawn_job(jobs, pending.map(Completion::Added)))
            }
            Command::Edit { address } => self.begin_edit(&address),
            Command::Save { name, address, port } => self
                .submit_edit_form(&DeviceForm::new(name, address, port))
                .map(|(original, pending)| {
                    spawn_job(jobs, pending.map(move |result| Completion::Edited { original, result }))
                }),
            Command::Cancel => {
                self.cancel_edit();
                Ok(())
            }
            Command::Remove { address } => {
                let pending = self.submit_removal(&address);
                spawn_job(jobs, pending.map(move |result| Completion::Removed { address, result }));
                Ok(())
            }
            Command::View { address, subview } => {
                if !self.show_subview(&address, subview) {
                    info!("No online card for {}", address);
                }
                Ok(())
            }
            Command::Layout => {
                self.toggle_layout();
                Ok(())
            }
            Command::Refresh => {
                spawn_job(jobs, self.begin_pass().map(Completion::Pass));
                Ok(())
            }
            Command::List => {
                let api = self.registry.api();
                spawn_job(jobs, async move { Completion::Listed(api.list().await) });
                Ok(())
            }
            Command::Dismiss => {
                self.dismiss_alert();
                Ok(())
            }
            Command::Quit => return false,
        };
        if let Err(e) = outcome {
            debug!("Command failed: {}", e);
        }
        true
    }

    /// Applique un travail terminé; une mutation réussie relance une passe
    fn complete(&mut self, completion: Completion, jobs: &mpsc::UnboundedSender<Completion>) {
        let follow_up = match completion {
            Completion::Pass(batch) => {
                self.apply_pass(batch);
                None
            }
            Completion::Added(result) => self.finish_add(result).ok().map(|(_, pass)| pass),
            Completion::Edited { original, result } => self.finish_edit(&original, result).ok().map(|(_, pass)| pass),
            Completion::Removed { address, result } => self.finish_remove(&address, result).ok(),
            Completion::Listed(result) => {
                match result {
                    Ok(records) => self.registry.replace(records.into_iter().map(Device::from).collect()),
                    Err(e) => warn!("Failed to load device list: {}", e),
                }
                self.render_device_list();
                None
            }
        };
        if let Some(pass) = follow_up {
            spawn_job(jobs, pass.map(Completion::Pass));
        }
    }

    /// Boucle principale : tick d'une seconde, commandes et travaux terminés,
    /// jusqu'à Quit ou fermeture du canal. Les travaux encore en vol sont abandonnés.
    pub async fn run(&mut self, mut commands: mpsc::Receiver<Command>) {
        self.prepare().await;

        let (jobs, mut finished) = mpsc::unbounded_channel();
        spawn_job(&jobs, self.begin_pass().map(Completion::Pass));

        let second = Duration::from_secs(1);
        let mut ticker = interval_at(Instant::now() + second, second);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.advance(Instant::now()) {
                        spawn_job(&jobs, self.begin_pass().map(Completion::Pass));
                    }
                }
                Some(completion) = finished.recv() => self.complete(completion, &jobs),
                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.dispatch(command, &jobs) {
                            info!("Quit requested");
                            break;
                        }
                    }
                    None => {
                        info!("Command channel closed, stopping dashboard");
                        break;
                    }
                },
            }
        }
    }
}
