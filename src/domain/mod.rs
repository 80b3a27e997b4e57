pub mod audit;
pub mod job;
pub mod lead;

pub use audit::*;
pub use job::*;
pub use lead::*;
