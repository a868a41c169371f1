//! Blocking client for a Remotion render function deployed on AWS Lambda.
//!
//! AWS SDK calls live behind the traits in [`adapters`] so the client and the
//! smoke-test flow can be exercised without credentials. The wire contract
//! itself is owned by `remotion_lambda_core`.

pub mod adapters;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod smoke;

pub use client::{AwsRemotionClient, RemotionClient};
pub use config::{AppConfig, ConfigError};
pub use error::{ClientError, ClientResult};
