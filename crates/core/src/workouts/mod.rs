//! Offline-aware workout repository facade.

pub mod service;

pub use service::WorkoutService;
