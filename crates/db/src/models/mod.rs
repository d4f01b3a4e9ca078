//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod audit;
pub mod member;
pub mod paycheck;
pub mod payment;
pub mod time_entry;
pub mod transfer;
