//! ExAC lookup service clients.
//!
//! [`ExacClient`] talks to the ExAC bulk variant endpoint over blocking HTTP.
//! [`MockExacService`] answers from memory for tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::error::FerroError;

use super::types::{ExacResponse, ExacVariant, VariantKey};

/// Default ExAC bulk variant endpoint
pub const DEFAULT_ENDPOINT: &str = "http://exac.hms.harvard.edu/rest/bulk/variant/variant";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Batch variant lookup.
///
/// Implementations receive every key of a table in row order and must answer
/// with one call; there is no per-key fallback.
pub trait ExacService {
    fn lookup(&self, keys: &[VariantKey]) -> Result<ExacResponse, FerroError>;
}

/// Blocking HTTP client for the ExAC bulk variant endpoint
pub struct ExacClient {
    client: Client,
    endpoint: String,
}

impl ExacClient {
    /// Create a client for `endpoint` with the given request timeout
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, FerroError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FerroError::ServiceRequest {
                msg: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ExacService for ExacClient {
    fn lookup(&self, keys: &[VariantKey]) -> Result<ExacResponse, FerroError> {
        if keys.is_empty() {
            return Ok(ExacResponse::new());
        }

        debug!(endpoint = %self.endpoint, keys = keys.len(), "posting bulk variant request");
        let response = self
            .client
            .post(&self.endpoint)
            .json(keys)
            .send()
            .map_err(|e| FerroError::ServiceRequest {
                msg: format!("POST {} failed: {}", self.endpoint, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FerroError::ServiceRequest {
                msg: format!("POST {} returned HTTP {}", self.endpoint, status),
            });
        }

        let body = response.text().map_err(|e| FerroError::ServiceRequest {
            msg: format!("Failed to read response body: {}", e),
        })?;
        debug!(bytes = body.len(), "received bulk variant response");

        parse_response(&body)
    }
}

/// Parse a bulk variant response body.
///
/// The body must be a JSON object keyed by variant key. A `null` value is
/// treated as a record with no data.
pub fn parse_response(body: &str) -> Result<ExacResponse, FerroError> {
    let raw: HashMap<String, Option<ExacVariant>> =
        serde_json::from_str(body).map_err(|e| FerroError::ServiceResponse {
            msg: e.to_string(),
        })?;

    Ok(raw
        .into_iter()
        .map(|(k, v)| (k, v.unwrap_or_default()))
        .collect())
}

/// In-memory lookup service.
///
/// Answers with the stored record of every requested key that has one, or
/// replays a fixed response body through [`parse_response`].
#[derive(Debug, Default)]
pub struct MockExacService {
    records: HashMap<String, ExacVariant>,
    body: Option<String>,
    failure: Option<String>,
    requests: RefCell<Vec<Vec<String>>>,
}

impl MockExacService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record for `key`
    pub fn add_record(&mut self, key: &str, variant: ExacVariant) {
        self.records.insert(key.to_string(), variant);
    }

    /// Builder form of [`add_record`](Self::add_record)
    pub fn with_record(mut self, key: &str, variant: ExacVariant) -> Self {
        self.add_record(key, variant);
        self
    }

    /// Answer every request with `body`, parsed as a real response would be
    pub fn with_body(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            ..Self::default()
        }
    }

    /// Fail every request with a `ServiceRequest` error
    pub fn failing(msg: &str) -> Self {
        Self {
            failure: Some(msg.to_string()),
            ..Self::default()
        }
    }

    /// Key lists received so far, one entry per request
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests.borrow().clone()
    }
}

impl ExacService for MockExacService {
    fn lookup(&self, keys: &[VariantKey]) -> Result<ExacResponse, FerroError> {
        self.requests
            .borrow_mut()
            .push(keys.iter().map(|k| k.to_string()).collect());

        if let Some(msg) = &self.failure {
            return Err(FerroError::ServiceRequest { msg: msg.clone() });
        }
        if let Some(body) = &self.body {
            return parse_response(body);
        }

        Ok(keys
            .iter()
            .map(|k| k.to_string())
            .filter_map(|k| self.records.get(&k).map(|v| (k, v.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "1-100-G-A": {"allele_freq": 0.5, "vep_annotations": [{"major_consequence": "synonymous_variant"}]},
            "1-200-C-T": {},
            "1-300-T-G": null
        }"#;
        let response = parse_response(body).unwrap();
        assert_eq!(response.len(), 3);
        assert_eq!(response["1-100-G-A"].allele_freq, Some(0.5));
        assert!(response["1-200-C-T"].is_empty());
        assert!(response["1-300-T-G"].is_empty());
    }

    #[test]
    fn test_parse_malformed_response() {
        for body in ["<html>502</html>", "[\"1-100-G-A\"]", ""] {
            let err = parse_response(body).unwrap_err();
            assert!(matches!(err, FerroError::ServiceResponse { .. }), "{}", body);
        }
    }

    #[test]
    fn test_mock_answers_requested_keys() {
        let mock = MockExacService::new()
            .with_record(
                "1-100-G-A",
                ExacVariant {
                    allele_freq: Some(0.1),
                    vep_annotations: None,
                },
            )
            .with_record("9-9-A-C", ExacVariant::default());

        let keys = vec![
            VariantKey::new("1", 100, "G", "A"),
            VariantKey::new("1", 200, "C", "T"),
        ];
        let response = mock.lookup(&keys).unwrap();
        assert_eq!(response.len(), 1);
        assert!(response.contains_key("1-100-G-A"));
        assert_eq!(
            mock.requests(),
            vec![vec!["1-100-G-A".to_string(), "1-200-C-T".to_string()]]
        );
    }

    #[test]
    fn test_mock_failure() {
        let mock = MockExacService::failing("connection refused");
        let err = mock.lookup(&[VariantKey::new("1", 1, "A", "G")]).unwrap_err();
        assert!(matches!(err, FerroError::ServiceRequest { .. }));
    }

    #[test]
    fn test_client_rejects_unreachable_endpoint() {
        let client = ExacClient::new("http://127.0.0.1:9/bulk", Duration::from_secs(2)).unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:9/bulk");
        let err = client
            .lookup(&[VariantKey::new("1", 1, "A", "G")])
            .unwrap_err();
        assert!(matches!(err, FerroError::ServiceRequest { .. }));
    }

    #[test]
    fn test_client_skips_empty_batch() {
        let client = ExacClient::new("http://127.0.0.1:9/bulk", Duration::from_secs(2)).unwrap();
        assert!(client.lookup(&[]).unwrap().is_empty());
    }

    /// Answer a single HTTP request on a local port. The handle yields the
    /// request body once the response was sent.
    fn serve_once(status: &str, body: &str) -> (String, std::thread::JoinHandle<String>) {
        use std::io::{BufRead, BufReader, Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/bulk", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut request = vec![0u8; length];
            reader.read_exact(&mut request).unwrap();
            reader.get_mut().write_all(response.as_bytes()).unwrap();
            String::from_utf8(request).unwrap()
        });
        (url, handle)
    }

    #[test]
    fn test_client_parses_http_response() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"1-100-G-A": {"allele_freq": 0.25, "vep_annotations": [{"major_consequence": "missense_variant"}]}}"#,
        );
        let client = ExacClient::new(&url, Duration::from_secs(5)).unwrap();

        let keys = vec![
            VariantKey::new("1", 100, "G", "A"),
            VariantKey::new("1", 200, "C", "T"),
        ];
        let response = client.lookup(&keys).unwrap();
        assert_eq!(response.len(), 1);
        assert_eq!(response["1-100-G-A"].allele_freq, Some(0.25));
        assert_eq!(
            response["1-100-G-A"].major_consequence(),
            Some("missense_variant")
        );

        let request = server.join().unwrap();
        assert_eq!(request, r#"["1-100-G-A","1-200-C-T"]"#);
    }

    #[test]
    fn test_client_rejects_error_status() {
        let (url, server) = serve_once("500 Internal Server Error", r#"{"1-100-G-A": {}}"#);
        let client = ExacClient::new(&url, Duration::from_secs(5)).unwrap();

        let err = client
            .lookup(&[VariantKey::new("1", 100, "G", "A")])
            .unwrap_err();
        match err {
            FerroError::ServiceRequest { msg } => assert!(msg.contains("500"), "{}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_client_rejects_malformed_body() {
        let (url, server) = serve_once("200 OK", "<html>maintenance</html>");
        let client = ExacClient::new(&url, Duration::from_secs(5)).unwrap();

        let err = client
            .lookup(&[VariantKey::new("1", 100, "G", "A")])
            .unwrap_err();
        assert!(matches!(err, FerroError::ServiceResponse { .. }));
        server.join().unwrap();
    }
}
