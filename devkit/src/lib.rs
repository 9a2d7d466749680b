/*!
# PiFan DevKit - Stubs et Utilitaires pour les tests du tableau de bord

Bibliothèque facilitant les tests du tableau de bord sans réseau ni rendu:
- Vue d'enregistrement (toutes les mutations de rendu, dans l'ordre)
- Service de gestion de flotte en mémoire (409 sur adresse dupliquée)
- Source de statuts scriptée par adresse
- Préférences en mémoire, partagées entre deux "rechargements"
*/

pub mod fleet_stub;
pub mod test_utils;
pub mod view_stub;

pub use fleet_stub::{MemoryPreferences, MockFleet, ScriptedStatus};
pub use test_utils::{reading, TestHarness};
pub use view_stub::{RecordingView, ViewOp};
