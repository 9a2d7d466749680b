//! Live telemetry dashboard for a fleet of Raspberry Pi fan controllers.
//!
//! The binary wires HTTP collaborators and a logging view around
//! [`Dashboard`]; tests swap them for the stubs in `pifan-devkit`.

pub mod alerts;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod editor;
pub mod error;
pub mod history;
pub mod layout;
pub mod models;
pub mod poller;
pub mod reconciler;
pub mod refresh;
pub mod registry;
pub mod state;
pub mod theme;
pub mod validation;
pub mod view;

pub use dashboard::{Command, Dashboard, DashboardParts, DashboardSettings};
pub use error::{FleetError, PreferenceError, RegistryError};
pub use models::{Device, DeviceKey, StatusResult, StatusSample};
pub use validation::{DeviceForm, ValidationError};
