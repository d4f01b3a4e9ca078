//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Flows that must hold a
//! transaction across statements own the transaction inside one method.

pub mod audit_log_repo;
pub mod member_repo;
pub mod paycheck_repo;
pub mod payment_repo;
pub mod settlement_repo;
pub mod time_entry_repo;
pub mod transfer_repo;

pub use audit_log_repo::AuditLogRepo;
pub use member_repo::MemberRepo;
pub use paycheck_repo::PaycheckRepo;
pub use payment_repo::PaymentRepo;
pub use settlement_repo::{SettlementRepo, SettlementRun};
pub use time_entry_repo::{StartOutcome, TimeEntryRepo};
pub use transfer_repo::TransferRepo;
