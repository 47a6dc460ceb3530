//! Request Coalescing
//!
//! Duplicate-call suppression: at most one execution per key is in flight,
//! and every caller present during it observes that execution's result.

mod flight;

pub use flight::Flight;
