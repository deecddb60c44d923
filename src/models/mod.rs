pub mod finding;
pub mod scan;

pub use finding::{Finding, FindingStatus, Narrative, Severity};
pub use scan::{Scan, ScanStatus, ScanSummary, SeverityCounts};
