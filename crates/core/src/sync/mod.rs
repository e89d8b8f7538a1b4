//! Reconnection sync: port interfaces and the drain orchestrator.

pub mod ports;
pub mod service;

pub use service::SyncOrchestrator;
