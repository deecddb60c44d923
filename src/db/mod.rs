pub mod connection;
pub mod findings;
pub mod scans;
pub mod schema;
pub mod users;

pub use connection::Database;
