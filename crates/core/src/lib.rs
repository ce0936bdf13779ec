//! Domain logic for sales opportunity tracking.
//!
//! Everything in this crate is pure: no database, no HTTP. The `db` and
//! `api` crates call into these functions to validate writes, compute
//! derived fields, and check workflow transitions before persisting.

pub mod convert_wizard;
pub mod error;
pub mod monthly;
pub mod on_change;
pub mod opportunity;
pub mod party;
pub mod search;
pub mod types;
