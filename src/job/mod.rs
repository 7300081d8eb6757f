//! Job, answer and metric records plus per-job analytics.

pub mod analytics;
pub mod types;

pub use analytics::{JobAnalytics, ProviderStats, ResponseDetail};
pub use types::*;
