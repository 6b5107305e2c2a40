//! Business logic services.
//!
//! - [`model_resolver`]: public model name → upstream app id
//! - [`anakin_client`]: upstream HTTP exchange, plain and streaming

pub mod anakin_client;
pub mod model_resolver;

pub use anakin_client::{build_http_client, AnakinClient, UpstreamEvent, UpstreamEventStream};
pub use model_resolver::{AppId, ModelResolver};
