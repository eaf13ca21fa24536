//! Access to the assistant backend
//!
//! - `client`: the HTTP calls and their wire types
//! - `pipeline`: worker thread that runs them off the UI thread

pub mod client;
pub mod pipeline;

pub use client::{BackendClient, QueryRequest, QueryResponse, RetrievedItem};
pub use pipeline::{BackendCommand, BackendEvent, BackendHandle, BackendPipeline};
