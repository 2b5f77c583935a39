use std::fmt::{self, Debug, Formatter};

use async_trait::async_trait;
use thiserror::Error;

/// The symmetric secret used to sign and verify bearer tokens.
///
/// Read-only and process-wide; loaded once per request from the
/// configuration collaborator and never mutated. The Debug rendering is
/// redacted so the secret cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSecret(Vec<u8>);

impl AuthSecret {
    /// Wrap raw secret bytes
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    /// The raw secret bytes, for MAC computation
    pub fn reveal(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for AuthSecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "AuthSecret(<redacted>)")
    }
}

/// Per-request configuration supplied by the configuration collaborator
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// The token signing secret
    pub auth_secret: AuthSecret,
    /// The origin suffix the CORS middleware accepts; carried here because
    /// the same collaborator supplies it, unused by the trust core itself
    pub cors_origin_suffix: String,
}

/// The configuration collaborator failed to produce a config
#[derive(Error, Debug)]
#[error("Configuration unavailable: {0}")]
pub struct ConfigError(pub String);

/// The boundary to the external configuration store.
///
/// Implementations are queried once per request. A failure here is fatal to
/// the request pipeline: no request can be authenticated without a secret.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// The configuration for the current request
    async fn auth_config(&self) -> Result<AuthConfig, ConfigError>;
}

/// A [ConfigSource] over a fixed in-memory configuration, for tests and
/// single-tenant bootstrap deployments.
#[derive(Debug, Clone)]
pub struct StaticConfigSource {
    config: AuthConfig,
}

impl StaticConfigSource {
    /// A source that always yields `config`
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// A source with the given secret and an empty CORS suffix
    pub fn with_secret(secret: impl Into<Vec<u8>>) -> Self {
        Self::new(AuthConfig {
            auth_secret: AuthSecret::new(secret),
            cors_origin_suffix: String::new(),
        })
    }
}

#[async_trait]
impl ConfigSource for StaticConfigSource {
    async fn auth_config(&self) -> Result<AuthConfig, ConfigError> {
        Ok(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::AuthSecret;

    #[test]
    fn the_secret_never_appears_in_debug_output() {
        let secret = AuthSecret::new("super-sensitive");
        let rendered = format!("{secret:?}");

        assert!(!rendered.contains("sensitive"));
        assert!(rendered.contains("redacted"));
    }
}
