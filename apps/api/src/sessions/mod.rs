//! Ranking & session pipeline: batch screening, ranking, recruiter overrides,
//! simulated finalization.

pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod store;
