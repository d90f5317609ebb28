//! HTTP API.
//!
//! Multipart upload routes for the heuristic detectors, the per-modality
//! report pipeline and lab report analysis, plus polling routes for the
//! latest stored results. `api_router()` returns a composable `Router`;
//! `server` owns the listener lifecycle.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;
pub mod upload;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_api_server, ApiServer, ServerError};
pub use types::ApiContext;
