//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PingerConfig (validated, immutable)
//!     → sections handed to dispatcher, store and observability
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a scheduled run keeps it for its lifetime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::PingerConfig;
pub use schema::{
    ConnectionConfig, LogFormat, ObservabilityConfig, ProbeConfig, ProtocolConfig,
    ScheduleConfig, StoreConfig, StoreKind, TargetConfig, TransportFailurePolicy,
};
