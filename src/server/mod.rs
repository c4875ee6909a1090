//! HTTP server
//!
//! Accepts connections on the configured address and serves:
//!
//! - `GET /health`: liveness plus the configured shop and API version
//! - `POST /upload`: relay one multipart file to Shopify Files
//! - `OPTIONS *`: CORS preflight
//!
//! # Example
//!
//! ```no_run
//! use shopify_upload_relay::{config::Config, server::Server};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let server = Server::new(config).await?;
//! println!("Listening on {}", server.local_addr());
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod cors;
pub mod response;
mod routes;

use crate::config::{Config, ConfigError};
use crate::origin::OriginGate;
use crate::relay::UploadRelay;
use crate::shopify::ShopifyClient;
use crate::upload::UploadPolicy;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to initialize: {0}")]
    Setup(String),

    #[error("Server error: {0}")]
    RuntimeError(String),
}

/// State shared by every connection
pub struct AppState {
    pub config: Config,
    pub origins: OriginGate,
    pub relay: UploadRelay<ShopifyClient>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ServerError> {
        let client =
            ShopifyClient::new(&config.shop).map_err(|e| ServerError::Setup(e.to_string()))?;

        Ok(Self {
            origins: OriginGate::from_config(&config.cors),
            relay: UploadRelay::new(client, UploadPolicy::from(&config.upload)),
            config,
        })
    }
}

/// Upload relay HTTP server
pub struct Server {
    state: Arc<AppState>,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Validate the configuration and bind the listener
    ///
    /// Port 0 binds an OS-assigned port; see [`Server::local_addr`].
    pub async fn new(config: Config) -> Result<Self, ServerError> {
        config.validate()?;
        let addr = config.server.socket_addr()?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(format!("Failed to bind to {}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::BindError(format!("Failed to get local address: {}", e)))?;

        let state = AppState::new(config)?;
        info!(
            address = %local_addr,
            shopify.endpoint = %state.config.shop.graphql_endpoint(),
            "Server bound"
        );

        Ok(Self {
            state: Arc::new(state),
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run until ctrl-c
    pub async fn run(self) -> Result<(), ServerError> {
        let (tx, rx) = tokio::sync::oneshot::channel::<std::io::Error>();
        let signal = async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                let _ = tx.send(e);
            }
        };
        self.run_until(signal).await?;

        match rx.await {
            Ok(e) => Err(ServerError::RuntimeError(format!(
                "Failed to listen for shutdown signal: {}",
                e
            ))),
            Err(_) => Ok(()),
        }
    }

    /// Run until `shutdown` resolves
    ///
    /// Connections already accepted keep running to completion on their own
    /// tasks; only the accept loop stops.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        info!("Starting upload relay on {}", self.local_addr);
        tokio::pin!(shutdown);

        loop {
            let (stream, peer_addr) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                },
            };

            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let state = Arc::clone(&state);
                    async move { routes::handle_request(req, state).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Error serving connection from {}: {}", peer_addr, e);
                }
            });
        }

        info!("Shutting down upload relay");
        Ok(())
    }
}
