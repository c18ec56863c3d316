mod app;
pub mod cli;
mod config;
mod effects;
mod logging;
mod ui;

pub use app::run;
