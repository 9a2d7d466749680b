/**
 * LAYOUT PREFERENCE - Densité de la grille de cartes (2 ou 3 par ligne)
 *
 * RÔLE : Seule donnée conservée entre deux sessions. Lue une fois au démarrage,
 * modifiée uniquement par le bouton de bascule.
 *
 * FONCTIONNEMENT :
 * - PreferenceStore = stockage clé/valeur persistant (fichier JSON par défaut)
 * - Clé "cardLayout", valeurs "two" | "three"
 * - toggle() persiste puis réapplique la classe de largeur à toutes les cartes
 */

use crate::error::PreferenceError;
use crate::models::DeviceKey;
use crate::view::View;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const LAYOUT_KEY: &str = "cardLayout";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    TwoPerRow,
    ThreePerRow,
}

/// Libellé et icône du bouton de bascule (décrit l'état suivant, pas l'état courant)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutControl {
    pub icon: &'static str,
    pub label: &'static str,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::TwoPerRow => "two",
            Layout::ThreePerRow => "three",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "two" => Some(Layout::TwoPerRow),
            "three" => Some(Layout::ThreePerRow),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Layout::TwoPerRow => Layout::ThreePerRow,
            Layout::ThreePerRow => Layout::TwoPerRow,
        }
    }

    pub fn column_class(self) -> &'static str {
        match self {
            Layout::TwoPerRow => "col-lg-6",
            Layout::ThreePerRow => "col-lg-4",
        }
    }

    pub fn control(self) -> LayoutControl {
        match self {
            Layout::TwoPerRow => LayoutControl {
                icon: "bi-grid-3x2-gap-fill",
                label: "Toggle 3 cards per row",
            },
            Layout::ThreePerRow => LayoutControl {
                icon: "bi-grid-fill",
                label: "Toggle 2 cards per row",
            },
        }
    }
}

/// Stockage persistant des préférences locales
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// Préférences dans un petit fichier JSON {"cardLayout": "three"}
pub struct FilePreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FilePreferenceStore {
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, PreferenceError> {
        let path = path.into();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };
        debug!("Preference store opened at {}", path.display());
        Ok(Self { path, values })
    }

    /// Magasin vide, le fichier sera réécrit au premier set()
    pub fn empty<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into(), values: BTreeMap::new() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }
}

pub struct LayoutPreference {
    current: Layout,
    store: Box<dyn PreferenceStore>,
}

impl LayoutPreference {
    /// Lecture unique au démarrage; valeur inconnue ou illisible -> deux par ligne
    pub fn load(store: Box<dyn PreferenceStore>) -> Self {
        let current = match store.get(LAYOUT_KEY) {
            Ok(Some(value)) => Layout::parse(&value).unwrap_or_else(|| {
                warn!("Unknown layout preference {:?}, using default", value);
                Layout::default()
            }),
            Ok(None) => Layout::default(),
            Err(e) => {
                warn!("Failed to read layout preference: {}", e);
                Layout::default()
            }
        };
        Self { current, store }
    }

    pub fn current(&self) -> Layout {
        self.current
    }

    /// Bascule, persiste, puis réapplique sur les cartes existantes
    pub fn toggle<'a, I>(&mut self, cards: I, view: &mut dyn View) -> Layout
    where
        I: IntoIterator<Item = &'a DeviceKey>,
    {
        self.current = self.current.toggled();
        if let Err(e) = self.store.set(LAYOUT_KEY, self.current.as_str()) {
            // la bascule reste effective pour la session en cours
            warn!("Failed to persist layout preference: {}", e);
        }
        info!("Card layout switched to {}", self.current.as_str());
        self.apply(cards, view);
        self.current
    }

    pub fn apply<'a, I>(&self, cards: I, view: &mut dyn View)
    where
        I: IntoIterator<Item = &'a DeviceKey>,
    {
        for key in cards {
            view.set_card_width(key, self.current);
        }
        view.set_layout_control(&self.current.control());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_describes_next_state() {
        assert_eq!(Layout::TwoPerRow.control().label, "Toggle 3 cards per row");
        assert_eq!(Layout::ThreePerRow.control().label, "Toggle 2 cards per row");
        assert_eq!(Layout::ThreePerRow.column_class(), "col-lg-4");
    }

    #[test]
    fn test_parse_round_trip() {
        assert_eq!(Layout::parse("three"), Some(Layout::ThreePerRow));
        assert_eq!(Layout::parse("two"), Some(Layout::TwoPerRow));
        assert_eq!(Layout::parse("four"), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let mut store = FilePreferenceStore::open(&path).unwrap();
        assert_eq!(store.get(LAYOUT_KEY).unwrap(), None);
        store.set(LAYOUT_KEY, "three").unwrap();

        let reopened = FilePreferenceStore::open(&path).unwrap();
        assert_eq!(reopened.get(LAYOUT_KEY).unwrap().as_deref(), Some("three"));
    }

    #[test]
    fn test_load_falls_back_on_unknown_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, r#"{"cardLayout": "sideways"}"#).unwrap();

        let pref = LayoutPreference::load(Box::new(FilePreferenceStore::open(&path).unwrap()));
        assert_eq!(pref.current(), Layout::TwoPerRow);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            FilePreferenceStore::open(&path),
            Err(PreferenceError::Serialization(_))
        ));
    }
}
