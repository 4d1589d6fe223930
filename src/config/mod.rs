pub mod env;
mod loader;

pub use env::{AppConfig, BrandConfig, DirectoryConfig, FetchConfig, HeuristicsConfig};
pub use loader::load_config;
