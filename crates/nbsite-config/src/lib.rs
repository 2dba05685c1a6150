pub mod config;
pub mod error;
pub mod plugin;
pub mod site;

pub use config::Config;
pub use error::ConfigError;
pub use plugin::PluginConfig;
pub use site::SiteConfig;
