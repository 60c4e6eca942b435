use tonic::{Request, Status};

/// Metadata key carrying the per-call correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Client interceptor that stamps every outgoing call with an `x-request-id`.
///
/// A request that already carries an id keeps it, so callers can correlate a
/// batch of RPCs under one id.
///
/// # Example
/// ```ignore
/// use grpc_client::interceptors::TracingInterceptor;
/// use rpc::knowledge_bank::knowledge_bank_service_client::KnowledgeBankServiceClient;
///
/// let client = KnowledgeBankServiceClient::with_interceptor(channel, TracingInterceptor::new());
/// ```
#[derive(Clone, Debug, Default)]
pub struct TracingInterceptor;

impl TracingInterceptor {
    pub fn new() -> Self {
        Self
    }
}

impl tonic::service::Interceptor for TracingInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        if let Some(existing) = request_id(&request) {
            tracing::debug!(target: "grpc_client", request_id = %existing, "Outgoing gRPC request");
            return Ok(request);
        }

        let request_id = uuid::Uuid::new_v4().to_string();
        request.metadata_mut().insert(
            REQUEST_ID_HEADER,
            request_id
                .parse()
                .map_err(|_| Status::internal("Failed to create request ID"))?,
        );

        tracing::debug!(target: "grpc_client", request_id = %request_id, "Outgoing gRPC request");

        Ok(request)
    }
}

/// Reads the `x-request-id` of an incoming or outgoing request, if present and ASCII.
pub fn request_id<T>(request: &Request<T>) -> Option<String> {
    request
        .metadata()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
