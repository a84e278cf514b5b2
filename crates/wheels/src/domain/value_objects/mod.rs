//! Value Objects
//!
//! Immutable types that are compared by value.

mod money;
mod payment_status;

pub use money::*;
pub use payment_status::*;
