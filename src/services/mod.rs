pub mod audit_logger;
pub mod deduper;
pub mod enricher;
pub mod normalizer;
pub mod orchestrator;
pub mod rate_limiter;

pub use audit_logger::*;
pub use enricher::{Enricher, LeadEnricher};
pub use orchestrator::*;
pub use rate_limiter::*;
