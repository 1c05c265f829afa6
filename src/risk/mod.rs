//! Risk scoring.
//!
//! - [`aggregator`]: folds the evidence of all sources into a [`RiskAssessment`](crate::models::RiskAssessment).
//! - [`status`]: maps free-text registry authorization statuses to
//!   [`RegistryStatus`](crate::models::RegistryStatus).

pub mod aggregator;
pub mod status;
