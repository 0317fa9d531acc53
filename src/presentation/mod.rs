// Presentation layer - Display sinks and HTTP surface
pub mod app_state;
pub mod console_display;
pub mod handlers;
pub mod snapshot_publisher;
