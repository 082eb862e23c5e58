//! Reading and normalizing raw directory records.
//!
//! - [`attributes`]: the multi-valued attribute bag of a single record
//! - [`account_control`]: typed `userAccountControl` flags
//! - [`normalize`]: timestamp, naming, sanitization and high-value rules

pub mod account_control;
pub mod attributes;
pub mod normalize;

pub use account_control::{AccountControl, AccountControlFlag};
pub use attributes::RawEntity;
