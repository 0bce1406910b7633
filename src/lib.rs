// Library interface for runsplits modules
// This allows integration tests and benches to access the core functionality

pub mod analysis;
pub mod config;
pub mod credentials;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod models;
pub mod splits;
pub mod trends;

// Re-export commonly used types for convenience
pub use models::*;
pub use splits::{fastest_split, SplitAggregator, SplitFilter, DEFAULT_WARMUP_KM};
pub use analysis::{analyze_multiple_activities, BatchConfig, BatchSummary};
pub use config::AppConfig;
pub use credentials::{CredentialStore, FileCredentialStore, OAuthTokens};
pub use error::{ImportError, Result, RunSplitsError};
pub use export::{ExportError, ExportFormat, ExportManager};
pub use logging::{LogConfig, LogFormat, LogLevel};
