//! Boots the server's service stack in-process and checks health and a
//! round trip through `BatchManager`.

use domain_knowledge_bank::{BatchManager, KnowledgeBankServiceImpl, ManagerOptions, Tensor};
use grpc_client::create_channel;
use grpc_client::server::{GrpcServer, ServerConfig, create_health_service};
use kbs_server::knowledge_bank_service;
use rpc::knowledge_bank::{
    DynamicEmbeddingConfig, InProtoKnowledgeBankConfig, KnowledgeBankConfig,
    knowledge_bank_config, knowledge_bank_service_server::SERVICE_NAME,
};
use test_utils::TestGrpcServer;
use tonic::service::Routes;
use tonic_health::pb::HealthCheckRequest;
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_client::HealthClient;

fn config(dim: i32) -> DynamicEmbeddingConfig {
    DynamicEmbeddingConfig {
        embedding_dimension: dim,
        knowledge_bank_config: Some(KnowledgeBankConfig {
            initializer: None,
            extension: Some(knowledge_bank_config::Extension::InProto(
                InProtoKnowledgeBankConfig {},
            )),
        }),
        gradient_descent_config: None,
    }
}

#[tokio::test]
async fn test_health_and_round_trip() {
    let server_config = ServerConfig::default();
    let (health_reporter, health_service) = create_health_service();
    GrpcServer::setup_health(&health_reporter, SERVICE_NAME).await;

    let routes = Routes::new(health_service).add_service(knowledge_bank_service(
        &server_config,
        KnowledgeBankServiceImpl::new(),
    ));
    let server = TestGrpcServer::start(routes).await;

    let channel = create_channel(server.endpoint()).await.unwrap();
    let mut health = HealthClient::new(channel);
    let status = health
        .check(HealthCheckRequest {
            service: SERVICE_NAME.to_string(),
        })
        .await
        .unwrap()
        .into_inner()
        .status;
    assert_eq!(status, ServingStatus::Serving as i32);

    let manager = BatchManager::create(config(2), "smoke", &server.address())
        .await
        .unwrap();
    let keys = Tensor::from(vec!["a", "b"]);
    manager
        .update_values(&keys, &Tensor::matrix(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap())
        .await
        .unwrap();
    let out = manager.lookup(&keys, false).await.unwrap();
    assert_eq!(out.data(), &[1.0, 2.0, 3.0, 4.0]);

    GrpcServer::set_not_serving(&health_reporter, SERVICE_NAME).await;
    let status = health
        .check(HealthCheckRequest {
            service: SERVICE_NAME.to_string(),
        })
        .await
        .unwrap()
        .into_inner()
        .status;
    assert_eq!(status, ServingStatus::NotServing as i32);

    server.shutdown().await;
}

#[tokio::test]
async fn test_uncompressed_server_with_uncompressed_client() {
    let server_config = ServerConfig::default().with_compression(false);
    let routes = Routes::new(knowledge_bank_service(
        &server_config,
        KnowledgeBankServiceImpl::new(),
    ));
    let server = TestGrpcServer::start(routes).await;

    let manager = BatchManager::create_with_options(
        config(3),
        "plain",
        &server.address(),
        ManagerOptions::default().without_compression(),
    )
    .await
    .unwrap();
    let out = manager.lookup(&Tensor::from(vec!["x"]), true).await.unwrap();
    assert_eq!(out.data(), &[0.0, 0.0, 0.0]);
}
