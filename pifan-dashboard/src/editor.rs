use crate::models::{Device, DeviceKey};
use crate::validation::DeviceForm;
use crate::view::View;
use tracing::debug;

/// Édition en ligne d'un appareil du panneau. Une seule à la fois :
/// ouvrir une édition referme d'abord celle qui est en cours.
#[derive(Debug, Default)]
pub struct EditSession {
    editing: Option<(DeviceKey, String)>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&DeviceKey> {
        self.editing.as_ref().map(|(key, _)| key)
    }

    /// Adresse d'origine de l'appareil édité (celle connue du service de gestion)
    pub fn original_address(&self) -> Option<&str> {
        self.editing.as_ref().map(|(_, address)| address.as_str())
    }

    pub fn begin(&mut self, device: &Device, view: &mut dyn View) {
        if let Some((open, _)) = self.editing.take() {
            if open != device.key {
                debug!("Closing edit of {} before editing {}", open, device.key);
            }
            view.close_editor(&open);
        }
        let draft = DeviceForm::new(&device.name, &device.address, device.port.to_string());
        view.open_editor(&device.key, &draft);
        self.editing = Some((device.key.clone(), device.address.clone()));
    }

    pub fn cancel(&mut self, view: &mut dyn View) -> bool {
        match self.editing.take() {
            Some((key, _)) => {
                view.close_editor(&key);
                true
            }
            None => false,
        }
    }

    /// Termine l'édition (sauvegarde réussie ou non), retourne la clé qui était ouverte
    pub fn finish(&mut self, view: &mut dyn View) -> Option<DeviceKey> {
        let (key, _) = self.editing.take()?;
        view.close_editor(&key);
        Some(key)
    }
}
