//! # FlexLog Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits)
//! - The sync orchestrator (reconnection drain)
//! - The offline-aware workout facade
//!
//! ## Architecture Principles
//! - Only depends on `flexlog-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod sync;
pub mod workouts;

// Re-export specific items to avoid ambiguity
pub use sync::ports::{
    ActionLog, IdMappingRepository, OfflineWorkoutCache, Reachability, RemoteWorkoutStore,
};
pub use sync::SyncOrchestrator;
pub use workouts::WorkoutService;
