//! Domain data types

pub mod sync;
pub mod workout;

pub use sync::*;
pub use workout::*;
