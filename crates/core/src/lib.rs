//! ldd2bh core library.
//!
//! Converts an ldapdomaindump directory dump (users, computers, groups and
//! trusts as attribute bags keyed by distinguished name) into the JSON
//! documents ingested by BloodHound (schema version 3): SID decoding,
//! attribute normalization, group membership resolution and atomic
//! document output.

pub mod bloodhound;
pub mod config;
pub mod converter;
pub mod directory;
pub mod errors;
pub mod pipeline;
pub mod refs;
pub mod sid;

// Re-exports for convenience.
pub use config::ConvertConfig;
pub use converter::{ConversionReport, Converter, Selection};
pub use directory::RawEntity;
pub use refs::{EntityKind, ReferenceTable};
