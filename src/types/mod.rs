pub mod indicators;
pub mod series;
pub mod verdict;

pub use indicators::*;
pub use series::*;
pub use verdict::*;
