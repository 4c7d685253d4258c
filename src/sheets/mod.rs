pub mod client;
pub mod types;

pub use client::SheetsClient;
pub use types::ValueRange;
