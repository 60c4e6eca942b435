use super::config::ServerConfig;
use tracing::info;

/// Startup logging and health reporting shared by gRPC binaries.
pub struct GrpcServer;

impl GrpcServer {
    pub fn log_startup(config: &ServerConfig, service_name: &str) {
        info!(
            addr = %config.addr_string(),
            service = service_name,
            compression = config.enable_compression,
            max_message_size = config.max_decoding_message_size,
            "gRPC server starting"
        );
    }

    /// Marks `service_name` and the empty service name as serving.
    ///
    /// The empty name answers generic health probes.
    pub async fn setup_health(
        health_reporter: &tonic_health::server::HealthReporter,
        service_name: &str,
    ) {
        health_reporter
            .set_service_status(service_name, tonic_health::ServingStatus::Serving)
            .await;
        health_reporter
            .set_service_status("", tonic_health::ServingStatus::Serving)
            .await;

        info!(service = service_name, "Service marked as serving");
    }

    /// Marks `service_name` as not serving, used while draining on shutdown.
    pub async fn set_not_serving(
        health_reporter: &tonic_health::server::HealthReporter,
        service_name: &str,
    ) {
        health_reporter
            .set_service_status(service_name, tonic_health::ServingStatus::NotServing)
            .await;
        info!(service = service_name, "Service marked as not serving");
    }
}

pub use tonic_health::server::health_reporter as create_health_service;
