//! Terminal User Interface components

mod app;
mod widgets;

pub use app::{display_key, App, AppState, AppView, StatusLine};
pub use widgets::*;
