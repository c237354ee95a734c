use std::time::Duration;

use crate::errors::PreviewError;

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the HTTP transport.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Full URL of the streaming generation endpoint.
    pub endpoint: String,
    /// Session token sent as bearer auth, if the endpoint requires one.
    pub token: Option<String>,
    /// Model name forwarded in the request body.
    pub model: Option<String>,
    /// Overall HTTP timeout for a request, body included.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a config for `endpoint` with no token and default timeout.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            model: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Builds a config from the environment.
    ///
    /// - `PREVIEW_ENDPOINT` (required)
    /// - `PREVIEW_TOKEN`
    /// - `PREVIEW_MODEL`
    /// - `PREVIEW_TIMEOUT_SECS` (default 120)
    pub fn from_env() -> Result<Self, PreviewError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PreviewError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let endpoint = non_empty("PREVIEW_ENDPOINT").ok_or_else(|| {
            PreviewError::Config("missing PREVIEW_ENDPOINT for the generation endpoint".into())
        })?;
        let mut config = Self::new(endpoint);
        config.token = non_empty("PREVIEW_TOKEN");
        config.model = non_empty("PREVIEW_MODEL");
        if let Some(raw) = non_empty("PREVIEW_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                PreviewError::Config(format!("PREVIEW_TIMEOUT_SECS is not a number: {raw}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Sets the bearer token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Overrides the default HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), PreviewError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(PreviewError::Config("endpoint must not be empty".into()));
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(PreviewError::Config(format!(
                "endpoint must be an http(s) URL: {endpoint}"
            )));
        }
        if self.timeout.is_zero() {
            return Err(PreviewError::Config("timeout must be greater than 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn from_lookup_reads_all_keys() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("PREVIEW_ENDPOINT", "http://localhost:8001/api/generate"),
            ("PREVIEW_TOKEN", "abc"),
            ("PREVIEW_MODEL", "gpt-4o"),
            ("PREVIEW_TIMEOUT_SECS", "30"),
        ]))
        .expect("config");
        assert_eq!(config.endpoint, "http://localhost:8001/api/generate");
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn from_lookup_requires_endpoint_and_numeric_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[("PREVIEW_TOKEN", "abc")])).expect_err("no endpoint");
        assert!(matches!(err, PreviewError::Config(msg) if msg.contains("PREVIEW_ENDPOINT")));

        let err = ClientConfig::from_lookup(lookup(&[
            ("PREVIEW_ENDPOINT", "http://x"),
            ("PREVIEW_TIMEOUT_SECS", "soon"),
        ]))
        .expect_err("bad timeout");
        assert!(matches!(err, PreviewError::Config(msg) if msg.contains("not a number")));
    }

    #[test]
    fn validate_rejects_non_http_endpoints() {
        assert!(ClientConfig::new("ftp://x").validate().is_err());
        assert!(ClientConfig::new("https://x").validate().is_ok());
        assert!(
            ClientConfig::new("https://x")
                .timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }
}
