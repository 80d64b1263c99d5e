//! Hintree CLI library: configuration, tree rendering and the shell command language

pub mod config;
pub mod render;
pub mod shell;
pub mod util;

pub use config::AppConfig;
