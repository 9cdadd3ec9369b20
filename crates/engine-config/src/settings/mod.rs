pub mod env;
pub mod error;
pub mod validated;

pub use error::SettingsError;
pub use validated::{ScrollSettings, ScrollSettingsBuilder};
