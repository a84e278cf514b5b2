//! Wheels API Data Models
//!
//! - Payment: bank checkout and Stripe requests
//! - Upload: signed upload requests
//! - Notification: push, token registry and chat triggers

mod notification;
mod payment;
mod upload;

pub use notification::*;
pub use payment::*;
pub use upload::*;
