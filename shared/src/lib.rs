//! Platform-neutral core of SubDim.
//!
//! The Windows binary supplies an [`service::OverlayHost`] and a
//! [`settings::PermissionProbe`]; everything else lives here.

pub mod channel;
pub mod color;
pub mod config;
pub mod service;
pub mod settings;

pub use channel::{UpdateBus, UpdateMessage};
pub use color::{Argb, Rgb};
pub use config::{PreferenceKey, PreferenceStore};
pub use service::{Control, OverlayHost, OverlayService, ServiceError, SharedPreferences};
pub use settings::{Notice, PermissionProbe, ScreenAction, SettingsController, StartOutcome};
