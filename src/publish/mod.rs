//! Delivery of the run payload
//!
//! - HTTP transport and endpoint discovery
//! - Workspace cache
//! - Publish, save and print at the end of a run

pub mod cache;
pub mod gateway;
pub mod http;

pub use cache::ProjectCache;
pub use gateway::{PublishGateway, PublishTarget, RunTally};
pub use http::{
    discover_submission_endpoint, HttpClient, HttpRequest, HttpResponse, Method, ReqwestClient,
};
