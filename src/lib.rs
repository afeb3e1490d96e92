pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

pub use crate::adapters::{build_service, Service};
pub use crate::config::AppConfig;
pub use crate::core::lead_service::{FailurePolicy, LeadService, SubmitOutcome};
pub use crate::domain::model::LeadSubmission;
pub use crate::utils::error::{LeadError, Result};
