//! MDM management API ("apply") HTTP transport
//!
//! Request decoding and response encoding for the administrative endpoints
//! (blueprints, DEP tokens and profiles, app uploads, users, device blocking),
//! the client-side request encoders, and an axum router that binds them to an
//! [`ApplyService`].

pub mod error;
pub mod routes;
pub mod service;
pub mod transport;
pub mod types;

pub use error::{ApplyError, ErrorBody};
pub use routes::make_router;
pub use service::ApplyService;
pub use transport::EncodedRequest;
pub use types::*;
