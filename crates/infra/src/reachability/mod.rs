//! Reachability signal plumbing.

pub mod monitor;

pub use monitor::ReachabilityMonitor;
