//! Server orchestration

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::routes::router;
use crate::state::AppState;

/// HTTP vault server
pub struct VaultServer {
    state: Arc<AppState>,
    listen_addr: String,
}

impl VaultServer {
    /// Create a new server for the given state
    pub fn new(state: AppState, listen_addr: impl Into<String>) -> Self {
        Self {
            state: Arc::new(state),
            listen_addr: listen_addr.into(),
        }
    }

    /// Bind the configured address
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        TcpListener::bind(&self.listen_addr).await
    }

    /// Serve requests on an already bound listener until the task is dropped
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let addr: SocketAddr = listener.local_addr()?;
        info!("Secret vault listening on http://{}", addr);
        axum::serve(listener, router(self.state)).await
    }

    /// Bind and serve
    pub async fn run(self) -> std::io::Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }
}
