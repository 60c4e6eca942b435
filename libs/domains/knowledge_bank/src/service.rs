//! Knowledge bank gRPC service implementation
//!
//! Thin handlers over [`SessionRegistry`]. Validation and error messages live in
//! the registry; this layer only moves data between proto messages and calls.

use std::path::Path;
use std::sync::Arc;

use grpc_client::request_id;
use rpc::knowledge_bank::{
    ExportRequest, ExportResponse, ImportRequest, ImportResponse, KnowledgeBankSizeRequest,
    KnowledgeBankSizeResponse, LookupRequest, LookupResponse, StartSessionRequest,
    StartSessionResponse, UpdateRequest, UpdateResponse,
    knowledge_bank_service_server::KnowledgeBankService,
};
use tonic::{Request, Response, Status};
use tracing::{info, instrument};

use crate::models::SessionHandle;
use crate::registry::SessionRegistry;

/// gRPC service implementation for knowledge bank sessions.
///
/// Cloning shares the underlying registry.
#[derive(Clone, Default)]
pub struct KnowledgeBankServiceImpl {
    registry: Arc<SessionRegistry>,
}

impl KnowledgeBankServiceImpl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }
}

#[tonic::async_trait]
impl KnowledgeBankService for KnowledgeBankServiceImpl {
    #[instrument(skip(self, request), fields(request_id = %request_id(&request).unwrap_or_default()))]
    async fn start_session(
        &self,
        request: Request<StartSessionRequest>,
    ) -> Result<Response<StartSessionResponse>, Status> {
        let req = request.into_inner();
        let handle = self
            .registry
            .start_session(&req.name, req.config)
            .await
            .map_err(Status::from)?;

        info!(name = %req.name, "Session started");

        Ok(Response::new(StartSessionResponse {
            session_handle: handle.into_bytes(),
        }))
    }

    #[instrument(skip(self, request), fields(request_id = %request_id(&request).unwrap_or_default()))]
    async fn lookup(
        &self,
        request: Request<LookupRequest>,
    ) -> Result<Response<LookupResponse>, Status> {
        let req = request.into_inner();
        let handle = SessionHandle::from_bytes(req.session_handle);
        let embedding_table = self
            .registry
            .lookup(&handle, &req.key, req.update)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(LookupResponse { embedding_table }))
    }

    #[instrument(skip(self, request), fields(request_id = %request_id(&request).unwrap_or_default()))]
    async fn update(
        &self,
        request: Request<UpdateRequest>,
    ) -> Result<Response<UpdateResponse>, Status> {
        let req = request.into_inner();
        let handle = SessionHandle::from_bytes(req.session_handle);
        self.registry
            .update(&handle, req.values, req.gradients)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(UpdateResponse {}))
    }

    #[instrument(skip(self, request), fields(request_id = %request_id(&request).unwrap_or_default()))]
    async fn export(
        &self,
        request: Request<ExportRequest>,
    ) -> Result<Response<ExportResponse>, Status> {
        let req = request.into_inner();
        let handle = SessionHandle::from_bytes(req.session_handle);
        let saved_path = self
            .registry
            .export(&handle, Path::new(&req.export_directory))
            .await
            .map_err(Status::from)?;

        info!(path = %saved_path.display(), "Exported session");

        Ok(Response::new(ExportResponse {
            knowledge_bank_saved_path: saved_path.to_string_lossy().into_owned(),
        }))
    }

    #[instrument(skip(self, request), fields(request_id = %request_id(&request).unwrap_or_default()))]
    async fn import(
        &self,
        request: Request<ImportRequest>,
    ) -> Result<Response<ImportResponse>, Status> {
        let req = request.into_inner();
        let handle = SessionHandle::from_bytes(req.session_handle);
        self.registry
            .import(&handle, Path::new(&req.knowledge_bank_saved_path))
            .await
            .map_err(Status::from)?;

        Ok(Response::new(ImportResponse {}))
    }

    async fn knowledge_bank_size(
        &self,
        _request: Request<KnowledgeBankSizeRequest>,
    ) -> Result<Response<KnowledgeBankSizeResponse>, Status> {
        let size = self.registry.size().await as u64;
        Ok(Response::new(KnowledgeBankSizeResponse { size }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpc::knowledge_bank::{
        DynamicEmbeddingConfig, EmbeddingVector, InProtoKnowledgeBankConfig, KnowledgeBankConfig,
        knowledge_bank_config,
    };
    use std::collections::HashMap;
    use tonic::Code;

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

    async fn start(service: &KnowledgeBankServiceImpl, name: &str) -> Vec<u8> {
        service
            .start_session(Request::new(StartSessionRequest {
                name: name.to_string(),
                config: Some(config(2)),
            }))
            .await
            .unwrap()
            .into_inner()
            .session_handle
    }

    #[tokio::test]
    async fn test_start_session_returns_serialized_request() {
        let service = KnowledgeBankServiceImpl::new();
        let handle = start(&service, "emb").await;
        let expected = SessionHandle::from_request(&StartSessionRequest {
            name: "emb".into(),
            config: Some(config(2)),
        });
        assert_eq!(handle, expected.into_bytes());
    }

    #[tokio::test]
    async fn test_empty_name_is_invalid_argument() {
        let service = KnowledgeBankServiceImpl::new();
        let status = service
            .start_session(Request::new(StartSessionRequest {
                name: String::new(),
                config: Some(config(2)),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "Name is empty.");
    }

    #[tokio::test]
    async fn test_lookup_and_update_round_trip() {
        let service = KnowledgeBankServiceImpl::new();
        let handle = start(&service, "emb").await;

        let mut values = HashMap::new();
        values.insert(
            "k".to_string(),
            EmbeddingVector {
                tag: String::new(),
                value: vec![0.5, -0.5],
                weight: 0.0,
            },
        );
        service
            .update(Request::new(UpdateRequest {
                session_handle: handle.clone(),
                values,
                gradients: HashMap::new(),
            }))
            .await
            .unwrap();

        let table = service
            .lookup(Request::new(LookupRequest {
                session_handle: handle,
                key: vec!["k".into(), "missing".into()],
                update: false,
            }))
            .await
            .unwrap()
            .into_inner()
            .embedding_table;
        assert_eq!(table.len(), 1);
        assert_eq!(table["k"].value, vec![0.5, -0.5]);
        assert_eq!(table["k"].tag, "k");
    }

    #[tokio::test]
    async fn test_update_without_optimizer_is_internal() {
        let service = KnowledgeBankServiceImpl::new();
        let handle = start(&service, "emb").await;
        let mut gradients = HashMap::new();
        gradients.insert(
            "k".to_string(),
            EmbeddingVector {
                tag: String::new(),
                value: vec![1.0, 1.0],
                weight: 0.0,
            },
        );
        let status = service
            .update(Request::new(UpdateRequest {
                session_handle: handle,
                values: HashMap::new(),
                gradients,
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Internal);
        assert_eq!(status.message(), crate::registry::MISSING_OPTIMIZER_MESSAGE);
    }

    #[tokio::test]
    async fn test_size_is_shared_between_clones() {
        let service = KnowledgeBankServiceImpl::new();
        let clone = service.clone();
        start(&service, "a").await;
        start(&clone, "b").await;

        let size = service
            .knowledge_bank_size(Request::new(KnowledgeBankSizeRequest {}))
            .await
            .unwrap()
            .into_inner()
            .size;
        assert_eq!(size, 2);
    }

    #[tokio::test]
    async fn test_export_with_empty_directory_is_invalid_argument() {
        let service = KnowledgeBankServiceImpl::new();
        let handle = start(&service, "emb").await;
        let status = service
            .export(Request::new(ExportRequest {
                session_handle: handle,
                export_directory: String::new(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "export_directory is empty.");
    }
}
