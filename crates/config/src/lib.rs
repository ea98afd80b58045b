mod config;
mod error;
mod loader;

pub use config::{CodegenConfig, ExternalFragmentConfig, FragmentMode, NamingConvention};
pub use error::{ConfigError, Result};
pub use loader::{load_config, load_config_from_str};
