use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod diff;
pub mod product;
pub mod rules;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use diff::diff;
pub use product::{CanonicalProduct, PriceUpdate, ProductSnapshot, ProductStatus, UpdateDirective};
pub use rules::STOCK_THRESHOLD;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
