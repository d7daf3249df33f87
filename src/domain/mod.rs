pub mod patent;
pub mod run_report;

pub use patent::*;
pub use run_report::*;
