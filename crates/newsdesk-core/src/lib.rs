//! Shared configuration, record model, and error taxonomy for newsdesk.

pub mod app_config;
pub mod config;
pub mod error;
pub mod record;

pub use app_config::{
    AccuracyContext, AppConfig, Environment, ScorerChoice, VectorBackend,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, ErrorKind};
pub use record::{MarketRecord, RecordKind};
