pub mod analysis;
pub mod cache;
pub mod indicators;

pub use analysis::AnalysisService;
pub use cache::Cache;
