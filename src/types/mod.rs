pub mod company;
pub mod dashboard;
pub mod market;
pub mod performance;
pub mod series;
pub mod signal;

pub use company::*;
pub use dashboard::*;
pub use market::*;
pub use performance::*;
pub use series::*;
pub use signal::*;
