//! Delayed push notifications
//!
//! This module handles:
//! - The push capability and its pub/sub implementation
//! - Scheduling one delayed push per bootstrapped device
//! - Bounding and cancelling pending pushes

mod scheduler;
mod service;

pub use scheduler::PushScheduler;
pub use service::{PubSubPushService, PushService};
#[cfg(test)]
pub use service::{PushError, PushReceipt};
