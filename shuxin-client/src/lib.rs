//! shuxin-client: HTTP access to the decision-generation service

pub mod client;
pub mod worker;

pub use client::{
    DEFAULT_API_BASE, DEFAULT_TIMEOUT, DecisionClient, DecisionError, DecisionOutcome,
    OutcomeSource, decision_url,
};
pub use worker::{DecisionEvent, DecisionJob, run_worker, spawn_worker};
