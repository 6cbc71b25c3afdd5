// Core Services

pub mod text_processor;
pub mod config_store;
pub mod providers;
pub mod detection;

pub use text_processor::*;
pub use config_store::*;
pub use providers::*;

// Re-export detection entry points
pub use detection::{
    aggregate,
    decide,
    detect_modality,
    is_reliable,
    Analyzer,
    CallSettings,
    Skipped,
};
