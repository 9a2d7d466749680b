/**
 * PIFAN DASHBOARD - Point d'entrée du tableau de bord
 *
 * RÔLE : Bootstrap : config, logging, collaborateurs HTTP, préférences, console.
 * La boucle principale tourne sur un runtime mono-thread : tout l'état
 * appartient à une seule tâche.
 */

use anyhow::Context;
use pifan_dashboard::config::load_config;
use pifan_dashboard::console::{spawn_stdin_reader, HELP};
use pifan_dashboard::layout::FilePreferenceStore;
use pifan_dashboard::poller::HttpStatusPoller;
use pifan_dashboard::registry::HttpFleetClient;
use pifan_dashboard::view::TracingView;
use pifan_dashboard::{Dashboard, DashboardParts, DashboardSettings, PreferenceError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pifan_dashboard=info")),
        )
        .init();

    let cfg = load_config().await;
    info!("Fleet manager at {}", cfg.manager_base_url());

    let preferences_path = cfg.preferences_path();
    let preferences = match FilePreferenceStore::open(&preferences_path) {
        Ok(store) => store,
        Err(PreferenceError::Serialization(e)) => {
            warn!("Unreadable preferences at {}, starting fresh: {}", preferences_path.display(), e);
            FilePreferenceStore::empty(&preferences_path)
        }
        Err(e) => {
            return Err(e).with_context(|| format!("opening preferences at {}", preferences_path.display()))
        }
    };

    let parts = DashboardParts {
        fleet: Arc::new(HttpFleetClient::new(cfg.manager_base_url())),
        status: Arc::new(HttpStatusPoller::new(cfg.request_timeout())),
        preferences: Box::new(preferences),
        view: Box::new(TracingView),
    };
    let mut dashboard = Dashboard::new(parts, DashboardSettings::from(&cfg));

    let (tx, rx) = mpsc::channel(32);
    // thread détaché : il ne retient pas l'arrêt du processus après quit
    spawn_stdin_reader(tx).context("starting console reader")?;
    info!("{}", HELP);

    dashboard.run(rx).await;
    info!("Dashboard stopped");
    Ok(())
}
