pub mod connection;
pub mod snapshot;

pub use connection::Database;
