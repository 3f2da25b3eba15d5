pub mod observation;
pub mod report;
pub mod stats;

pub use observation::*;
pub use report::*;
pub use stats::*;
