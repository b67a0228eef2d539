pub mod config;
pub mod domain;
pub mod frame;

// Re-export key types for easier use by dependent crates
pub use config::{DomainConfig, OutputConfig, PopulationParams, PopulationsConfig, TimingConfig, WalkConfig};
pub use domain::Domain;
pub use frame::{Frame, StreamHeader};
