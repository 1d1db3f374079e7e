// src/config/mod.rs
// Configuration and shared constants

pub mod env;
pub mod file;

pub use env::{
    ApiKeys, AppConfig, ConfigValidation, ReasoningConfig, RestConfig, ServerConfig,
    SpecialSourceConfig, StoreConfig, StoreKind,
};
pub use file::FileConfig;
