//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods.
//! Read-only helpers take `&PgPool`; methods that take part in a batch
//! write accept any Postgres executor so callers can pass `&mut *tx`.

pub mod address_repo;
pub mod opportunity_repo;
pub mod party_repo;

pub use address_repo::AddressRepo;
pub use opportunity_repo::OpportunityRepo;
pub use party_repo::PartyRepo;
