//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - Request DTOs specific to the entity's endpoints

pub mod address;
pub mod opportunity;
pub mod party;
