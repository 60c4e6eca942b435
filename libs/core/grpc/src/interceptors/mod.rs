pub mod tracing;

pub use tracing::{REQUEST_ID_HEADER, TracingInterceptor, request_id};
