//! Bootstrap command submission
//!
//! This module handles:
//! - Building the fixed bootstrap batch for a device
//! - Submitting it in order, stopping at the first failure
//! - Queuing accepted commands per device

mod batch;
mod queue;
mod submitter;

pub use batch::CommandBatch;
pub use queue::InMemoryCommandQueue;
pub use submitter::CommandSubmitter;
#[cfg(test)]
pub use submitter::{CommandReceipt, SubmitError};
