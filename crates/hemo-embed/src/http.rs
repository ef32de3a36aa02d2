//! Blocking JSON-over-HTTP plumbing shared by the remote providers.

use std::time::Duration;

use hemo_core::error::{Error, Result};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|e| Error::Provider(format!("failed to build HTTP client: {e}")))
}

/// Send the request and decode a JSON body; non-2xx statuses become provider errors.
pub fn send_json<T: DeserializeOwned>(request: RequestBuilder, what: &str) -> Result<T> {
    let response = request
        .send()
        .map_err(|e| Error::Provider(format!("{what} request failed: {e}")))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(Error::Provider(format!("{what} API error {status}: {body}")));
    }
    response
        .json::<T>()
        .map_err(|e| Error::Provider(format!("{what} response could not be decoded: {e}")))
}

/// Read an API key from the named environment variable.
pub fn api_key_from_env(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(Error::InvalidConfig(format!("API key not found. Set {var} environment variable"))),
    }
}

/// Check a provider reply: one vector per input, each of the advertised dimension.
pub fn check_embeddings(vectors: Vec<Vec<f32>>, expected_count: usize, dim: usize) -> Result<Vec<Vec<f32>>> {
    if vectors.len() != expected_count {
        return Err(Error::Provider(format!(
            "expected {expected_count} embeddings, got {}",
            vectors.len()
        )));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
        return Err(Error::DimensionMismatch { expected: dim, actual: bad.len() });
    }
    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_embeddings_rejects_wrong_count_and_dim() {
        assert!(check_embeddings(vec![vec![0.0; 3]], 2, 3).is_err());
        let err = check_embeddings(vec![vec![0.0; 3], vec![0.0; 4]], 2, 3).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 4 }));
        assert_eq!(check_embeddings(vec![vec![1.0; 3]], 1, 3).unwrap().len(), 1);
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let err = api_key_from_env("HEMO_TEST_SURELY_UNSET_KEY").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
