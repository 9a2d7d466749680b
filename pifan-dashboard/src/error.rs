use crate::validation::ValidationError;

/// Erreurs de l'API de gestion de flotte (get_pi_list / add_pi / edit_pi / delete_pi)
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error("device address already registered")]
    Conflict,
    #[error("management API answered {0}")]
    Status(u16),
    #[error("management API unreachable: {0}")]
    Http(#[from] reqwest::Error),
}

/// Raisons pour lesquelles un appareil est considéré hors ligne.
/// Jamais remontées à la boucle de rafraîchissement, uniquement journalisées.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("request timed out")]
    Timeout,
    #[error("status endpoint answered {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Échec d'une mutation du registre (ajout, édition, suppression)
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Fleet(#[from] FleetError),
    #[error("no device is being edited")]
    NotEditing,
    #[error("unknown device {0}")]
    UnknownDevice(String),
}

impl RegistryError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, RegistryError::Fleet(FleetError::Conflict))
    }
}
