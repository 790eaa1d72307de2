//! Desktop try-on window (library).

pub mod app;
pub mod settings;
pub mod theme;
mod ui;

pub use app::{SessionStatus, TryOnApp};
