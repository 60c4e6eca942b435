pub mod config;

pub use config::ChannelConfig;

use crate::error::{GrpcError, GrpcResult};
use tonic::transport::{Channel, Endpoint};

/// Prefixes `http://` onto a bare `host:port` address.
///
/// Addresses that already carry a scheme are returned unchanged.
pub fn normalize_address(addr: &str) -> String {
  let addr = addr.trim();
  if addr.contains("://") {
    addr.to_string()
  } else {
    format!("http://{addr}")
  }
}

/// Creates a gRPC channel with the default [`ChannelConfig`]
pub async fn create_channel(addr: impl Into<String>) -> GrpcResult<Channel> {
  create_channel_with_config(addr, ChannelConfig::default()).await
}

/// Creates a gRPC channel and waits for the connection to be established
///
/// Fails with [`GrpcError::ConnectionTimeout`] when the server does not accept
/// the connection within `config.connect_timeout`.
pub async fn create_channel_with_config(
  addr: impl Into<String>,
  config: ChannelConfig,
) -> GrpcResult<Channel> {
  let addr_string = addr.into();
  let connect_timeout = config.connect_timeout;
  let endpoint = endpoint_for(&addr_string, config)?;

  tracing::debug!(
    target: "grpc_client",
    addr = %addr_string,
    ?connect_timeout,
    "Creating gRPC channel"
  );

  match tokio::time::timeout(connect_timeout, endpoint.connect()).await {
    Ok(Ok(channel)) => Ok(channel),
    Ok(Err(e)) => {
      tracing::error!(
        target: "grpc_client",
        addr = %addr_string,
        error = ?e,
        "Failed to connect to gRPC service"
      );
      Err(GrpcError::ConnectionFailed(e))
    }
    Err(_) => {
      tracing::error!(
        target: "grpc_client",
        addr = %addr_string,
        ?connect_timeout,
        "Timed out connecting to gRPC service"
      );
      Err(GrpcError::ConnectionTimeout(connect_timeout))
    }
  }
}

fn endpoint_for(addr: &str, config: ChannelConfig) -> GrpcResult<Endpoint> {
  let endpoint = Endpoint::from_shared(addr.to_string()).map_err(|e| {
    tracing::error!(target: "grpc_client", addr = %addr, error = ?e, "Invalid URI");
    GrpcError::InvalidUri(e)
  })?;
  Ok(config.apply_to_endpoint(endpoint))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[test]
  fn test_normalize_address() {
    assert_eq!(normalize_address("localhost:10000"), "http://localhost:10000");
    assert_eq!(normalize_address(" [::1]:50051 "), "http://[::1]:50051");
    assert_eq!(normalize_address("https://kbs.internal:443"), "https://kbs.internal:443");
  }

  #[tokio::test]
  async fn test_invalid_uri() {
    let result = create_channel("not a valid uri").await;
    assert!(matches!(result.unwrap_err(), GrpcError::InvalidUri(_)));
  }

  #[tokio::test]
  async fn test_connection_failed() {
    // Nothing listens on port 1 of the loopback interface
    let config = ChannelConfig::default().with_connect_timeout(Duration::from_millis(500));
    let result = create_channel_with_config("http://127.0.0.1:1", config).await;
    assert!(result.is_err());
  }
}
