//! REST API interaction module
//!
//! # Module Structure
//!
//! - [`auth`] - Username / API key credentials
//! - [`client`] - Main client, implements [`ResourceFetcher`](crate::resource::ResourceFetcher)
//! - [`http`] - HTTP utilities for REST API calls
//! - [`storage`] - On-disk copies of fetched resources
//!
//! # Example
//!
//! ```ignore
//! use reify::api::{auth::Credentials, client::ApiClient};
//!
//! async fn example(credentials: Credentials) -> anyhow::Result<()> {
//!     let client = ApiClient::new(credentials, "bigml.io")?;
//!     let id = "dataset/5143a51a37203f2cf7000972".parse()?;
//!     let dataset = client.get_resource(&id).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod storage;
