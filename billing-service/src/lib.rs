pub mod config;
pub mod handlers;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod server;
pub mod sinks;
pub mod sources;
pub mod transform;

pub use handlers::{BillingService, InvocationResponse, Status};
pub use pipeline::PipelineError;
