//! Domain utilities

pub mod dates;

pub use dates::to_json_date;
