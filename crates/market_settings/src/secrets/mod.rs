use std::future::Future;

pub mod gcp;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Secret store error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Malformed secret payload: {0}")]
    Payload(String),
}

/// A named-secret lookup.
///
/// `Ok(None)` means the store answered but holds no value for `name`;
/// callers fall back to the environment in both that case and on `Err`.
pub trait SecretStore {
    fn access_secret(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, SecretError>> + Send;
}

impl<T: SecretStore + Send + Sync> SecretStore for &T {
    async fn access_secret(&self, name: &str) -> Result<Option<String>, SecretError> {
        (**self).access_secret(name).await
    }
}

/// Store used when no cloud project is available; every lookup falls
/// through to the environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvOnly;

impl SecretStore for EnvOnly {
    async fn access_secret(&self, _name: &str) -> Result<Option<String>, SecretError> {
        Ok(None)
    }
}
