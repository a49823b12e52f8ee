//! S3 object fetch over HTTPS with AWS Signature Version 4.
//!
//! Blocking reqwest client (no async runtime). Only `GetObject` is needed:
//! the object body is streamed straight into the destination file.

use super::aws::{self, CredentialChain, Credentials, env_var};
use super::{BlobFetcher, BlobLocation};
use crate::config::RemoteConfig;
use crate::error::{Result, SheetError};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use log::debug;
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Url;
use reqwest::blocking::{Client, Response};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_REGION: &str = "us-east-1";
const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const USER_AGENT: &str = concat!("sheetcell/", env!("CARGO_PKG_VERSION"));
const BUCKET_REGION_HEADER: &str = "x-amz-bucket-region";
const METADATA_TIMEOUT: Duration = Duration::from_secs(2);

/// Blocking S3 `GetObject` client
pub struct S3Fetcher {
    http: Client,
    metadata: Client,
    region: String,
    endpoint: Option<String>,
    credentials: CredentialChain,
}

impl S3Fetcher {
    /// Build a fetcher with fixed credentials. With `endpoint` set, requests
    /// use path-style addressing against it; otherwise the AWS
    /// virtual-hosted endpoint.
    pub fn new(
        region: impl Into<String>,
        endpoint: Option<String>,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Result<Self> {
        Self::with_chain(region, endpoint, CredentialChain::fixed(credentials), timeout)
    }

    pub fn with_chain(
        region: impl Into<String>,
        endpoint: Option<String>,
        credentials: CredentialChain,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SheetError::Http(e.to_string()))?;
        // Link-local metadata endpoints answer fast or not at all
        let metadata = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(METADATA_TIMEOUT)
            .no_proxy()
            .build()
            .map_err(|e| SheetError::Http(e.to_string()))?;

        Ok(Self {
            http,
            metadata,
            region: region.into(),
            endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
            credentials,
        })
    }

    /// Build a fetcher from `[remote]` settings and the AWS environment
    pub fn from_config(remote: &RemoteConfig) -> Result<Self> {
        let chain = CredentialChain::from_environment(remote);
        let region = remote
            .region
            .clone()
            .or_else(|| env_var("AWS_REGION"))
            .or_else(|| env_var("AWS_DEFAULT_REGION"))
            .or_else(|| {
                chain
                    .config_file
                    .as_deref()
                    .and_then(|path| aws::config_file_region(path, &chain.profile))
            })
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let endpoint = remote
            .endpoint
            .clone()
            .or_else(|| env_var("AWS_ENDPOINT_URL_S3"))
            .or_else(|| env_var("AWS_ENDPOINT_URL"));

        Self::with_chain(region, endpoint, chain, Duration::from_secs(remote.timeout_secs))
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// URL of the object in the configured region
    pub fn object_url(&self, location: &BlobLocation) -> Result<Url> {
        self.object_url_in(location, &self.region)
    }

    /// URL of the object in `region`, with the key percent-encoded per path
    /// segment
    pub fn object_url_in(&self, location: &BlobLocation, region: &str) -> Result<Url> {
        location.validate()?;
        let key = encode_key(&location.key);
        let raw = match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint, location.bucket, key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                location.bucket, region, key
            ),
        };
        Url::parse(&raw).map_err(|_| SheetError::InvalidLocator(location.to_string()))
    }

    fn get_object(
        &self,
        location: &BlobLocation,
        region: &str,
        credentials: &Credentials,
    ) -> Result<Response> {
        let url = self.object_url_in(location, region)?;
        let headers = sign_get(credentials, region, &url, Utc::now())?;

        debug!("GET {}", url);
        let mut request = self.http.get(url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        request.send().map_err(|e| SheetError::Http(e.to_string()))
    }
}

impl BlobFetcher for S3Fetcher {
    fn fetch(&self, location: &BlobLocation, dest: &Path) -> Result<u64> {
        let credentials = self
            .credentials
            .resolve(&self.metadata)
            .ok_or(SheetError::CredentialsMissing)?;

        let mut response = self.get_object(location, &self.region, &credentials)?;
        let bucket_region = response
            .headers()
            .get(BUCKET_REGION_HEADER)
            .and_then(|v| v.to_str().ok());
        if let Some(region) = redirect_region(response.status().as_u16(), bucket_region, &self.region) {
            debug!("bucket {} is in {}, retrying there", location.bucket, region);
            response = self.get_object(location, &region, &credentials)?;
        }

        let status = response.status();
        if status.is_success() {
            let mut file = File::create(dest)?;
            return response
                .copy_to(&mut file)
                .map_err(|e| SheetError::Http(e.to_string()));
        }

        let body = response.text().unwrap_or_default();
        let (code, message) = parse_error_body(&body);
        Err(classify_error(location, status.as_u16(), code, message))
    }
}

/// Region to retry in when S3 answers that the bucket lives elsewhere
fn redirect_region(status: u16, bucket_region: Option<&str>, current: &str) -> Option<String> {
    match (status, bucket_region) {
        (301 | 307 | 400, Some(region)) if !region.is_empty() && region != current => {
            Some(region.to_string())
        }
        _ => None,
    }
}

fn classify_error(
    location: &BlobLocation,
    status: u16,
    code: Option<String>,
    message: Option<String>,
) -> SheetError {
    match code.as_deref() {
        Some("NoSuchBucket") => {
            SheetError::RemoteNotFound(format!("S3 bucket not found: {}", location.bucket))
        }
        Some("NoSuchKey") => SheetError::RemoteNotFound(format!("File not found in S3: {}", location)),
        _ if status == 404 => SheetError::RemoteNotFound(format!("File not found in S3: {}", location)),
        _ => {
            let detail = match (code, message) {
                (Some(code), Some(message)) => format!("{}: {}", code, message),
                (Some(code), None) => code,
                (None, Some(message)) => message,
                (None, None) => format!("error downloading {}", location),
            };
            SheetError::Remote {
                status,
                message: detail,
            }
        }
    }
}

/// Extract `Code` and `Message` from an S3 XML error document
fn parse_error_body(body: &str) -> (Option<String>, Option<String>) {
    let mut reader = Reader::from_str(body);
    let mut code = None;
    let mut message = None;
    let mut current: Option<Vec<u8>> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => current = Some(e.name().as_ref().to_vec()),
            Ok(Event::Text(text)) => {
                let Ok(value) = text.unescape() else {
                    continue;
                };
                match current.as_deref() {
                    Some(b"Code") => code = Some(value.trim().to_string()),
                    Some(b"Message") => message = Some(value.trim().to_string()),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    (code, message)
}

/// Signature Version 4 headers for an unsigned-body GET of `url`
pub(crate) fn sign_get(
    credentials: &Credentials,
    region: &str,
    url: &Url,
    now: DateTime<Utc>,
) -> Result<Vec<(&'static str, String)>> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();
    let payload_hash = hex::encode(Sha256::digest(b""));

    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };

    // Header names sorted, as canonical form requires
    let mut signed = vec![
        ("host", host),
        ("x-amz-content-sha256", payload_hash.clone()),
        ("x-amz-date", amz_date.clone()),
    ];
    if let Some(token) = &credentials.session_token {
        signed.push(("x-amz-security-token", token.clone()));
    }

    let canonical_headers: String = signed
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();
    let signed_headers = signed
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");

    let canonical_request = format!(
        "GET\n{}\n{}\n{}\n{}\n{}",
        url.path(),
        url.query().unwrap_or(""),
        canonical_headers,
        signed_headers,
        payload_hash
    );

    let scope = format!("{}/{}/s3/aws4_request", date_stamp, region);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let key = signing_key(&credentials.secret_access_key, &date_stamp, region, "s3")?;
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, credentials.access_key_id, scope, signed_headers, signature
    );

    // `host` is set by the HTTP client from the URL
    let mut headers: Vec<(&'static str, String)> = signed
        .into_iter()
        .filter(|(name, _)| *name != "host")
        .collect();
    headers.push(("authorization", authorization));
    Ok(headers)
}

fn signing_key(secret: &str, date_stamp: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| SheetError::Config(format!("invalid signing key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Percent-encode an object key, keeping `/` separators
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len() * 2);
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                encoded.push(byte as char);
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
