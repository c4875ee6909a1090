//! Shopify Upload Relay
//!
//! Accepts a single file from a storefront over `multipart/form-data` and
//! relays it into the store's Shopify Files library with the Admin GraphQL
//! API's three-step staged upload protocol.
//!
//! # Features
//!
//! - **Validated intake**: size limit enforced while streaming, MIME type or
//!   extension allow-list checked before any outbound call
//! - **Staged uploads**: `stagedUploadsCreate`, multipart POST to the staging
//!   target, then `fileCreate`
//! - **Exact-origin CORS**: only configured browser origins are served
//!
//! # Example
//!
//! ```no_run
//! use shopify_upload_relay::{config::Config, server::Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let server = Server::new(config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod origin;
pub mod relay;
pub mod server;
pub mod shopify;
pub mod telemetry;
pub mod upload;

// Re-export commonly used types
pub use config::Config;
pub use error::{RelayError, ValidationError};
pub use relay::{RelayFailure, RelayStage, RelayedFile, UploadRelay};
pub use server::Server;
pub use shopify::{CommercePlatform, ShopifyClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
