//! AWS credential and region discovery
//!
//! Credentials are looked up in order: explicit `[remote]` settings, the
//! `AWS_*` environment variables, the shared credentials file, the shared
//! config file, the container credentials endpoint (ECS/EKS) and finally the
//! EC2 instance metadata service (IMDSv2). Lookups happen per fetch, so
//! short-lived role credentials are refreshed and local-only use never
//! touches the network.

use crate::config::RemoteConfig;
use log::debug;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROFILE: &str = "default";

const CONTAINER_HOST: &str = "http://169.254.170.2";
const INSTANCE_METADATA_ENDPOINT: &str = "http://169.254.169.254";
const INSTANCE_TOKEN_TTL_SECS: &str = "21600";

/// AWS access key pair, optionally with a session token
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    fn from_section(values: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            access_key_id: values.get("aws_access_key_id")?.clone(),
            secret_access_key: values.get("aws_secret_access_key")?.clone(),
            session_token: values.get("aws_session_token").cloned(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Credential document served by the container and instance endpoints
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MetadataCredentials {
    access_key_id: String,
    secret_access_key: String,
    token: Option<String>,
    code: Option<String>,
}

/// Container credentials endpoint with its optional authorization token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEndpoint {
    pub uri: String,
    pub authorization: Option<String>,
}

impl ContainerEndpoint {
    fn from_env() -> Option<Self> {
        let uri = env_var("AWS_CONTAINER_CREDENTIALS_FULL_URI").or_else(|| {
            env_var("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI")
                .map(|path| format!("{}{}", CONTAINER_HOST, path))
        })?;
        let authorization = env_var("AWS_CONTAINER_AUTHORIZATION_TOKEN").or_else(|| {
            env_var("AWS_CONTAINER_AUTHORIZATION_TOKEN_FILE")
                .and_then(|path| fs::read_to_string(path).ok())
                .map(|token| token.trim().to_string())
        });
        Some(Self { uri, authorization })
    }
}

/// Ordered credential providers
#[derive(Debug, Clone)]
pub struct CredentialChain {
    /// `[remote]` access key settings
    pub explicit: Option<Credentials>,
    /// `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`
    pub environment: Option<Credentials>,
    pub profile: String,
    pub credentials_file: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub container: Option<ContainerEndpoint>,
    /// Instance metadata endpoint; `None` disables the lookup
    pub instance_metadata: Option<String>,
}

impl CredentialChain {
    /// Chain holding only `credentials`, with no file or network lookups
    pub fn fixed(credentials: Option<Credentials>) -> Self {
        Self {
            explicit: credentials,
            environment: None,
            profile: DEFAULT_PROFILE.to_string(),
            credentials_file: None,
            config_file: None,
            container: None,
            instance_metadata: None,
        }
    }

    /// Full chain from `[remote]` settings and the AWS environment
    pub fn from_environment(remote: &RemoteConfig) -> Self {
        let explicit = match (&remote.access_key_id, &remote.secret_access_key) {
            (Some(id), Some(secret)) => Some(Credentials {
                access_key_id: id.clone(),
                secret_access_key: secret.clone(),
                session_token: remote.session_token.clone(),
            }),
            _ => None,
        };
        let environment = match (env_var("AWS_ACCESS_KEY_ID"), env_var("AWS_SECRET_ACCESS_KEY")) {
            (Some(id), Some(secret)) => Some(Credentials {
                access_key_id: id,
                secret_access_key: secret,
                session_token: env_var("AWS_SESSION_TOKEN"),
            }),
            _ => None,
        };
        let metadata_disabled = env_var("AWS_EC2_METADATA_DISABLED")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        Self {
            explicit,
            environment,
            profile: profile_name(remote),
            credentials_file: shared_file("AWS_SHARED_CREDENTIALS_FILE", "credentials"),
            config_file: shared_file("AWS_CONFIG_FILE", "config"),
            container: ContainerEndpoint::from_env(),
            instance_metadata: (!metadata_disabled).then(|| {
                env_var("AWS_EC2_METADATA_SERVICE_ENDPOINT")
                    .unwrap_or_else(|| INSTANCE_METADATA_ENDPOINT.to_string())
            }),
        }
    }

    /// First credentials any provider yields; `metadata` is used for the
    /// container and instance endpoints
    pub fn resolve(&self, metadata: &Client) -> Option<Credentials> {
        if let Some(credentials) = &self.explicit {
            return Some(credentials.clone());
        }
        if let Some(credentials) = &self.environment {
            debug!("using credentials from environment");
            return Some(credentials.clone());
        }
        if let Some(credentials) = self
            .credentials_file
            .as_deref()
            .and_then(|path| profile_credentials(path, &self.profile))
        {
            debug!("using credentials from profile '{}'", self.profile);
            return Some(credentials);
        }
        if let Some(credentials) = self
            .config_file
            .as_deref()
            .and_then(|path| profile_credentials(path, &config_section(&self.profile)))
        {
            debug!("using credentials from config profile '{}'", self.profile);
            return Some(credentials);
        }
        if let Some(credentials) = self
            .container
            .as_ref()
            .and_then(|endpoint| container_credentials(metadata, endpoint))
        {
            debug!("using container credentials");
            return Some(credentials);
        }
        let credentials = self
            .instance_metadata
            .as_deref()
            .and_then(|endpoint| instance_credentials(metadata, endpoint));
        if credentials.is_some() {
            debug!("using instance profile credentials");
        }
        credentials
    }
}

/// Profile from `[remote]`, then `AWS_PROFILE`, then `default`
pub fn profile_name(remote: &RemoteConfig) -> String {
    remote
        .profile
        .clone()
        .or_else(|| env_var("AWS_PROFILE"))
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
}

/// `region` of `profile` in the shared config file
pub fn config_file_region(path: &Path, profile: &str) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    parse_ini_section(&content, &config_section(profile))?.remove("region")
}

// The config file names non-default profiles `[profile name]`
fn config_section(profile: &str) -> String {
    if profile == DEFAULT_PROFILE {
        profile.to_string()
    } else {
        format!("profile {}", profile)
    }
}

fn profile_credentials(path: &Path, section: &str) -> Option<Credentials> {
    let content = fs::read_to_string(path).ok()?;
    Credentials::from_section(&parse_ini_section(&content, section)?)
}

/// Key/value pairs of one `[section]` of an INI-style AWS file
pub(crate) fn parse_ini_section(content: &str, section: &str) -> Option<HashMap<String, String>> {
    let mut found = false;
    let mut in_section = false;
    let mut values = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_section = name.trim() == section;
            found |= in_section;
            continue;
        }
        if in_section {
            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    }

    found.then_some(values)
}

pub(crate) fn container_credentials(http: &Client, endpoint: &ContainerEndpoint) -> Option<Credentials> {
    let mut request = http.get(&endpoint.uri);
    if let Some(token) = &endpoint.authorization {
        request = request.header("authorization", token);
    }
    parse_metadata_credentials(&send_text(request)?)
}

/// IMDSv2: session token, then role name, then the role's credentials
pub(crate) fn instance_credentials(http: &Client, endpoint: &str) -> Option<Credentials> {
    let base = endpoint.trim_end_matches('/');
    let token = send_text(
        http.put(format!("{}/latest/api/token", base))
            .header("x-aws-ec2-metadata-token-ttl-seconds", INSTANCE_TOKEN_TTL_SECS),
    )?;
    let token = token.trim();

    let roles_url = format!("{}/latest/meta-data/iam/security-credentials/", base);
    let roles = send_text(http.get(&roles_url).header("x-aws-ec2-metadata-token", token))?;
    let role = roles.lines().map(str::trim).find(|l| !l.is_empty())?;

    let document = send_text(
        http.get(format!("{}{}", roles_url, role))
            .header("x-aws-ec2-metadata-token", token),
    )?;
    parse_metadata_credentials(&document)
}

fn send_text(request: RequestBuilder) -> Option<String> {
    match request.send() {
        Ok(response) if response.status().is_success() => response.text().ok(),
        Ok(response) => {
            debug!("credential endpoint returned HTTP {}", response.status());
            None
        }
        Err(e) => {
            debug!("credential endpoint unreachable: {}", e);
            None
        }
    }
}

fn parse_metadata_credentials(body: &str) -> Option<Credentials> {
    let document: MetadataCredentials = match serde_json::from_str(body) {
        Ok(document) => document,
        Err(e) => {
            debug!("malformed credential document: {}", e);
            return None;
        }
    };
    if document.code.as_deref().is_some_and(|code| code != "Success") {
        return None;
    }
    Some(Credentials {
        access_key_id: document.access_key_id,
        secret_access_key: document.secret_access_key,
        session_token: document.token,
    })
}

pub(crate) fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn shared_file(variable: &str, name: &str) -> Option<PathBuf> {
    env_var(variable)
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".aws").join(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;

    const ROLE_DOCUMENT: &str = r#"{
        "Code": "Success",
        "LastUpdated": "2024-05-01T10:00:00Z",
        "Type": "AWS-HMAC",
        "AccessKeyId": "ASIAROLE",
        "SecretAccessKey": "role-secret",
        "Token": "role-token",
        "Expiration": "2024-05-01T16:00:00Z"
    }"#;

    fn client() -> Client {
        Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_ini_section() {
        let content = "\
# comment
[default]
aws_access_key_id = AKIDDEFAULT
aws_secret_access_key = secret-default

[ci]
aws_access_key_id=AKIDCI
aws_secret_access_key=secret-ci
aws_session_token=token-ci

[broken]
aws_access_key_id = AKIDBROKEN
";
        let default = parse_ini_section(content, "default").unwrap();
        assert_eq!(default["aws_access_key_id"], "AKIDDEFAULT");

        let ci = Credentials::from_section(&parse_ini_section(content, "ci").unwrap()).unwrap();
        assert_eq!(ci.secret_access_key, "secret-ci");
        assert_eq!(ci.session_token.as_deref(), Some("token-ci"));

        assert!(Credentials::from_section(&parse_ini_section(content, "broken").unwrap()).is_none());
        assert!(parse_ini_section(content, "absent").is_none());
    }

    #[test]
    fn test_profile_files() {
        let dir = tempfile::tempdir().unwrap();
        let credentials = dir.path().join("credentials");
        let config = dir.path().join("config");
        fs::write(&credentials, "[ci]\naws_access_key_id = AKIDCI\naws_secret_access_key = s\n").unwrap();
        fs::write(
            &config,
            "[default]\nregion = us-west-2\n\n[profile ci]\nregion = eu-central-1\n\
             [profile staging]\nregion = ap-south-1\naws_access_key_id = AKIDSTAGE\n\
             aws_secret_access_key = s2\n",
        )
        .unwrap();

        assert_eq!(config_file_region(&config, "default").as_deref(), Some("us-west-2"));
        assert_eq!(config_file_region(&config, "ci").as_deref(), Some("eu-central-1"));
        assert_eq!(config_file_region(&config, "missing"), None);

        let mut chain = CredentialChain::fixed(None);
        chain.credentials_file = Some(credentials);
        chain.config_file = Some(config);
        chain.profile = "ci".to_string();
        assert_eq!(chain.resolve(&client()).unwrap().access_key_id, "AKIDCI");

        chain.profile = "staging".to_string();
        assert_eq!(chain.resolve(&client()).unwrap().access_key_id, "AKIDSTAGE");

        chain.profile = "nobody".to_string();
        assert!(chain.resolve(&client()).is_none());
    }

    #[test]
    fn test_explicit_credentials_win() {
        let server = MockServer::start();
        let container = server.mock(|when, then| {
            when.path("/creds");
            then.status(200).body(ROLE_DOCUMENT);
        });

        let mut chain = CredentialChain::fixed(Some(Credentials::new("AKIDCONFIG", "secret")));
        chain.environment = Some(Credentials::new("AKIDENV", "secret"));
        chain.container = Some(ContainerEndpoint {
            uri: server.url("/creds"),
            authorization: None,
        });

        assert_eq!(chain.resolve(&client()).unwrap().access_key_id, "AKIDCONFIG");
        chain.explicit = None;
        assert_eq!(chain.resolve(&client()).unwrap().access_key_id, "AKIDENV");
        container.assert_calls(0);

        let debug = format!("{:?}", Credentials::new("AKIDCONFIG", "hunter2"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_container_credentials() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v2/credentials/task-role")
                .header("authorization", "Bearer container-token");
            then.status(200).body(ROLE_DOCUMENT);
        });

        let mut chain = CredentialChain::fixed(None);
        chain.container = Some(ContainerEndpoint {
            uri: server.url("/v2/credentials/task-role"),
            authorization: Some("Bearer container-token".to_string()),
        });
        let credentials = chain.resolve(&client()).unwrap();

        mock.assert();
        assert_eq!(credentials.access_key_id, "ASIAROLE");
        assert_eq!(credentials.session_token.as_deref(), Some("role-token"));
    }

    #[test]
    fn test_instance_credentials() {
        let server = MockServer::start();
        let token = server.mock(|when, then| {
            when.method(PUT)
                .path("/latest/api/token")
                .header("x-aws-ec2-metadata-token-ttl-seconds", "21600");
            then.status(200).body("imds-token");
        });
        let roles = server.mock(|when, then| {
            when.method(GET)
                .path("/latest/meta-data/iam/security-credentials/")
                .header("x-aws-ec2-metadata-token", "imds-token");
            then.status(200).body("reader-role\n");
        });
        let document = server.mock(|when, then| {
            when.method(GET)
                .path("/latest/meta-data/iam/security-credentials/reader-role")
                .header("x-aws-ec2-metadata-token", "imds-token");
            then.status(200).body(ROLE_DOCUMENT);
        });

        let mut chain = CredentialChain::fixed(None);
        chain.instance_metadata = Some(server.base_url());
        let credentials = chain.resolve(&client()).unwrap();

        token.assert();
        roles.assert();
        document.assert();
        assert_eq!(credentials.secret_access_key, "role-secret");
    }

    #[test]
    fn test_container_failure_falls_back_to_instance() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v2/credentials/gone");
            then.status(404);
        });
        server.mock(|when, then| {
            when.method(PUT).path("/latest/api/token");
            then.status(200).body("t");
        });
        server.mock(|when, then| {
            when.method(GET).path("/latest/meta-data/iam/security-credentials/");
            then.status(200).body("role");
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/latest/meta-data/iam/security-credentials/role");
            then.status(200).body(ROLE_DOCUMENT);
        });

        let mut chain = CredentialChain::fixed(None);
        chain.container = Some(ContainerEndpoint {
            uri: server.url("/v2/credentials/gone"),
            authorization: None,
        });
        chain.instance_metadata = Some(server.base_url());
        assert_eq!(chain.resolve(&client()).unwrap().access_key_id, "ASIAROLE");
    }

    #[test]
    fn test_instance_without_role() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(PUT).path("/latest/api/token");
            then.status(200).body("t");
        });
        server.mock(|when, then| {
            when.method(GET).path("/latest/meta-data/iam/security-credentials/");
            then.status(404);
        });

        let mut chain = CredentialChain::fixed(None);
        chain.instance_metadata = Some(server.base_url());
        assert!(chain.resolve(&client()).is_none());
    }

    #[test]
    fn test_failed_role_document_is_ignored() {
        assert!(parse_metadata_credentials(r#"{"Code": "AssumeRoleUnauthorizedAccess", "AccessKeyId": "x", "SecretAccessKey": "y"}"#).is_none());
        assert!(parse_metadata_credentials("<html>").is_none());
    }
}
