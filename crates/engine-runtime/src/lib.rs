pub mod actor;
pub mod error;
pub mod scroll;
