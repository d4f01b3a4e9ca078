//! External payment provider integration.
//!
//! [`api::ProviderApi`] wraps the provider's HTTP endpoints (quotes,
//! recipient accounts, transfers, funding); [`orchestrator`] drives the
//! multi-step transfer protocol for a paycheck and persists the resulting
//! transfer row. The [`provider::PaymentProvider`] trait is the seam that
//! lets handlers and tests swap the real client for a stub.

pub mod api;
pub mod config;
pub mod orchestrator;
pub mod provider;

pub use api::{ProviderApi, ProviderApiError};
pub use config::ProviderConfig;
pub use orchestrator::{OrchestratorError, TransferOrchestrator};
pub use provider::PaymentProvider;
