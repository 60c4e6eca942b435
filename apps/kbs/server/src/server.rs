//! gRPC server initialization and lifecycle management
//!
//! - Tracing and error report initialization
//! - Server configuration from the environment
//! - Health check service (grpc.health.v1.Health)
//! - Graceful shutdown on Ctrl-C

use core_config::{Environment, FromEnv};
use domain_knowledge_bank::KnowledgeBankServiceImpl;
use eyre::{Result, WrapErr};
use grpc_client::server::{GrpcServer, ServerConfig, create_health_service};
use rpc::knowledge_bank::knowledge_bank_service_server::{
    KnowledgeBankServiceServer, SERVICE_NAME,
};
use tonic::codec::CompressionEncoding;
use tonic::transport::Server;
use tonic_health::server::HealthReporter;
use tracing::{info, warn};

/// Wraps `service` with the compression and message limits from `config`.
pub fn knowledge_bank_service(
    config: &ServerConfig,
    service: KnowledgeBankServiceImpl,
) -> KnowledgeBankServiceServer<KnowledgeBankServiceImpl> {
    let server = KnowledgeBankServiceServer::new(service)
        .max_decoding_message_size(config.max_decoding_message_size)
        .max_encoding_message_size(config.max_encoding_message_size);

    if config.enable_compression {
        server
            .accept_compressed(CompressionEncoding::Zstd)
            .send_compressed(CompressionEncoding::Zstd)
    } else {
        server
    }
}

/// Run the gRPC server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if:
/// - The server configuration is invalid
/// - Server binding fails
/// - Server runtime encounters an error
pub async fn run() -> Result<()> {
    core_config::tracing::install_color_eyre();
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    let config = ServerConfig::from_env().wrap_err("Failed to load server configuration")?;
    let addr = config
        .socket_addr()
        .wrap_err_with(|| format!("Failed to parse server address: {}", config.addr_string()))?;

    let (health_reporter, health_service) = create_health_service();
    GrpcServer::setup_health(&health_reporter, SERVICE_NAME).await;
    GrpcServer::log_startup(&config, SERVICE_NAME);

    Server::builder()
        .add_service(health_service)
        .add_service(knowledge_bank_service(&config, KnowledgeBankServiceImpl::new()))
        .serve_with_shutdown(addr, shutdown_signal(health_reporter))
        .await
        .wrap_err("gRPC server failed")?;

    info!("gRPC server stopped");
    Ok(())
}

async fn shutdown_signal(health_reporter: HealthReporter) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
    }
    info!("Shutdown signal received, draining connections");
    GrpcServer::set_not_serving(&health_reporter, SERVICE_NAME).await;
}
