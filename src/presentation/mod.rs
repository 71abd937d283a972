// Presentation layer - HTTP read surface
pub mod app_state;
pub mod handlers;
