mod app;
pub mod config;
mod effects;
mod input;
pub mod logging;
mod render;

pub use app::run_app;
