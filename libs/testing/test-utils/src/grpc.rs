//! In-process gRPC server for integration tests
//!
//! Binds `127.0.0.1:0`, serves the given routes on a background task and stops
//! it when dropped.

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::service::Routes;
use tonic::transport::Server;

/// Running test server. The listener is shut down when this struct is dropped.
///
/// # Example
///
/// ```no_run
/// # async fn example(routes: tonic::service::Routes) {
/// use test_utils::TestGrpcServer;
///
/// let server = TestGrpcServer::start(routes).await;
/// let endpoint = server.endpoint(); // "http://127.0.0.1:<port>"
/// # }
/// ```
pub struct TestGrpcServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestGrpcServer {
    pub async fn start(routes: Routes) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let (tx, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let result = Server::builder()
                .add_routes(routes)
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
                    let _ = rx.await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Test gRPC server exited with error");
            }
        });

        tracing::debug!(%addr, "Test gRPC server started");

        Self {
            addr,
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bare `host:port`, the form clients pass before scheme normalization
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the server and wait for the background task to finish
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestGrpcServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
