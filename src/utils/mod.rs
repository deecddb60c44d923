pub mod truncation;

pub use truncation::{truncate_error, truncate_snippet};
