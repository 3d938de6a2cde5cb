//! # Settings Module
//!
//! This module resolves the runtime configuration of the market news agent:
//! Slack credentials, the YouTube Data API key, the cron shared secret and the
//! Vertex AI model coordinates.
//!
//! Secrets are looked up once at startup, first in a [`SecretStore`]
//! (Google Cloud Secret Manager in production), then in the process
//! environment, and finally default to an empty string.

pub mod metadata;
mod secrets;
mod settings;

pub use secrets::gcp::GcpSecretManager;
pub use secrets::{EnvOnly, SecretError, SecretStore};
pub use settings::{Environment, Settings, SECRET_NAMES};
