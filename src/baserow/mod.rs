mod baserow_error;
mod client;
pub mod columns;
pub mod fields;
pub mod files;
pub mod mapping;
pub mod models;

pub use baserow_error::BaserowError;
pub use client::BaserowClient;
