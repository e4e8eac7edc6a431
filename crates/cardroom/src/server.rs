//! `CardroomServer` builder and server loop.
//!
//! Ties the layers together: one registry dispatcher task, one HTTP
//! control surface, and one router task per accepted WebSocket
//! connection.

use cardroom_protocol::JsonCodec;
use cardroom_session::{spawn_registry, RegistryHandle};
use cardroom_transport::{Transport, WebSocketTransport};
use tokio::net::TcpListener;

use crate::http::control_router;
use crate::router::handle_connection;
use crate::CardroomError;

/// Builder for configuring and starting a Cardroom server.
pub struct CardroomServerBuilder {
    ws_addr: String,
    http_addr: String,
}

impl CardroomServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            ws_addr: "127.0.0.1:8080".to_string(),
            http_addr: "127.0.0.1:3000".to_string(),
        }
    }

    /// Sets the WebSocket listen address.
    pub fn ws_bind(mut self, addr: &str) -> Self {
        self.ws_addr = addr.to_string();
        self
    }

    /// Sets the HTTP control-surface listen address.
    pub fn http_bind(mut self, addr: &str) -> Self {
        self.http_addr = addr.to_string();
        self
    }

    /// Binds both listeners and spawns the registry dispatcher.
    pub async fn build(self) -> Result<CardroomServer, CardroomError> {
        let transport = WebSocketTransport::bind(&self.ws_addr).await?;
        let http_listener = TcpListener::bind(&self.http_addr).await?;
        tracing::info!(addr = %self.http_addr, "HTTP control surface listening");

        Ok(CardroomServer {
            transport,
            http_listener,
            registry: spawn_registry(),
        })
    }
}

impl Default for CardroomServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Cardroom server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct CardroomServer {
    transport: WebSocketTransport,
    http_listener: TcpListener,
    registry: RegistryHandle,
}

impl CardroomServer {
    /// Creates a new builder.
    pub fn builder() -> CardroomServerBuilder {
        CardroomServerBuilder::new()
    }

    /// A handle to the room registry, e.g. for embedding or tests.
    pub fn registry(&self) -> RegistryHandle {
        self.registry.clone()
    }

    /// Returns the local WebSocket address the server is bound to.
    pub fn ws_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns the local HTTP address the server is bound to.
    pub fn http_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.http_listener.local_addr()
    }

    /// Runs the server: serves the HTTP surface and accepts WebSocket
    /// connections until the process is terminated.
    pub async fn run(self) -> Result<(), CardroomError> {
        let Self {
            mut transport,
            http_listener,
            registry,
        } = self;

        let app = control_router(registry.clone());
        tokio::spawn(async move {
            if let Err(e) = axum::serve(http_listener, app).await {
                tracing::error!(error = %e, "HTTP surface failed");
            }
        });

        tracing::info!("Cardroom server running");

        loop {
            match transport.accept().await {
                Ok(conn) => {
                    let registry = registry.clone();
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, registry, JsonCodec).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
