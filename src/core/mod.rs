pub mod auth;
pub mod dead_letter;
pub mod dedup;
pub mod export;
pub mod lead_service;
pub mod retry;
pub mod sheets;

pub use crate::domain::ports::{LeadStore, Storage};
pub use crate::utils::error::Result;
