//! Authenticated Cloud Controller v2 client.

use async_trait::async_trait;
use instance_authn_sdk::{
    PlatformApp, PlatformClient, PlatformError, PlatformOrg, PlatformSettings, PlatformSpace,
};
use parking_lot::RwLock;
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::dto::{AppEntity, InfoResponse, OrgEntity, Resource, SpaceEntity, TokenResponse};

/// Client id the `cf` CLI registers with UAA; used for the password grant
/// when no client id is configured.
const CF_CLI_CLIENT_ID: &str = "cf";

#[derive(Debug)]
enum Grant {
    Password {
        username: String,
        password: SecretString,
    },
    ClientCredentials,
}

#[derive(Debug)]
struct Credentials {
    client_id: String,
    client_secret: SecretString,
    grant: Grant,
}

impl Credentials {
    fn from_settings(settings: &PlatformSettings) -> Result<Self, PlatformError> {
        let secret = |s: Option<&SecretString>| s.cloned().unwrap_or_else(|| SecretString::from(""));
        if !settings.username.is_empty() {
            let client_id = if settings.client_id.is_empty() {
                CF_CLI_CLIENT_ID.to_owned()
            } else {
                settings.client_id.clone()
            };
            return Ok(Self {
                client_id,
                client_secret: secret(settings.client_secret.as_ref()),
                grant: Grant::Password {
                    username: settings.username.clone(),
                    password: secret(settings.password.as_ref()),
                },
            });
        }
        if !settings.client_id.is_empty() {
            return Ok(Self {
                client_id: settings.client_id.clone(),
                client_secret: secret(settings.client_secret.as_ref()),
                grant: Grant::ClientCredentials,
            });
        }
        Err(PlatformError::InvalidSettings(
            "either a username or a client id is required".to_owned(),
        ))
    }
}

/// Cloud Controller client holding a UAA access token.
///
/// A lookup answered with `401` fetches a fresh token and is retried once.
pub struct CloudControllerClient {
    http: reqwest::Client,
    api: Url,
    token_url: Url,
    credentials: Credentials,
    access_token: RwLock<SecretString>,
}

impl std::fmt::Debug for CloudControllerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudControllerClient")
            .field("api", &self.api.as_str())
            .field("token_url", &self.token_url.as_str())
            .finish_non_exhaustive()
    }
}

impl CloudControllerClient {
    /// Discovers the token endpoint and logs in.
    ///
    /// # Errors
    /// - [`PlatformError::InvalidSettings`] for an unusable address, trusted
    ///   certificate or credential combination
    /// - [`PlatformError::Unauthorized`] if UAA refuses the credentials
    /// - any other variant if the API could not be reached
    pub async fn connect(settings: &PlatformSettings) -> Result<Self, PlatformError> {
        let api = parse_base_url(&settings.api_addr)?;
        let credentials = Credentials::from_settings(settings)?;
        let http = build_http_client(settings)?;

        let info_url = endpoint(&api, &["v2", "info"])?;
        let info: InfoResponse = decode(get(&http, &info_url, None).await?, &info_url).await?;
        let token_url = endpoint(&parse_base_url(&info.token_endpoint)?, &["oauth", "token"])?;
        debug!(token_url = %token_url, "discovered token endpoint");

        let access_token = fetch_token(&http, &token_url, &credentials).await?;
        Ok(Self {
            http,
            api,
            token_url,
            credentials,
            access_token: RwLock::new(access_token),
        })
    }

    async fn resource<T: DeserializeOwned>(
        &self,
        kind: &'static str,
        collection: &str,
        guid: &str,
    ) -> Result<Resource<T>, PlatformError> {
        let url = endpoint(&self.api, &["v2", collection, guid])?;
        let mut response = self.authorized_get(&url).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("access token refused; logging in again");
            let token = fetch_token(&self.http, &self.token_url, &self.credentials).await?;
            *self.access_token.write() = token;
            response = self.authorized_get(&url).await?;
        }
        if response.status() == StatusCode::NOT_FOUND {
            return Err(PlatformError::not_found(kind, guid));
        }
        decode(response, &url).await
    }

    async fn authorized_get(&self, url: &Url) -> Result<Response, PlatformError> {
        let token = self.access_token.read().clone();
        get(&self.http, url, Some(&token)).await
    }
}

#[async_trait]
impl PlatformClient for CloudControllerClient {
    async fn app_by_guid(&self, guid: &str) -> Result<PlatformApp, PlatformError> {
        self.resource::<AppEntity>("app", "apps", guid)
            .await
            .map(Into::into)
    }

    async fn org_by_guid(&self, guid: &str) -> Result<PlatformOrg, PlatformError> {
        self.resource::<OrgEntity>("organization", "organizations", guid)
            .await
            .map(Into::into)
    }

    async fn space_by_guid(&self, guid: &str) -> Result<PlatformSpace, PlatformError> {
        self.resource::<SpaceEntity>("space", "spaces", guid)
            .await
            .map(Into::into)
    }
}

fn build_http_client(settings: &PlatformSettings) -> Result<reqwest::Client, PlatformError> {
    let mut builder = reqwest::Client::builder();
    for pem in &settings.trusted_certificates {
        let cert = reqwest::Certificate::from_pem(pem.as_bytes())
            .map_err(|e| PlatformError::InvalidSettings(format!("trusted certificate: {e}")))?;
        builder = builder.add_root_certificate(cert);
    }
    if let Some(timeout) = settings.timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| PlatformError::InvalidSettings(e.to_string()))
}

fn parse_base_url(raw: &str) -> Result<Url, PlatformError> {
    let url = Url::parse(raw)
        .map_err(|e| PlatformError::InvalidSettings(format!("address {raw:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(PlatformError::InvalidSettings(format!(
            "address {raw:?} is not an http(s) URL"
        )));
    }
    Ok(url)
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, PlatformError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| PlatformError::InvalidSettings(format!("{base} cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn get(
    http: &reqwest::Client,
    url: &Url,
    token: Option<&SecretString>,
) -> Result<Response, PlatformError> {
    let mut request = http.get(url.clone());
    if let Some(token) = token {
        request = request.bearer_auth(token.expose_secret());
    }
    request
        .send()
        .await
        .map_err(|e| PlatformError::Transport(e.to_string()))
}

async fn fetch_token(
    http: &reqwest::Client,
    token_url: &Url,
    credentials: &Credentials,
) -> Result<SecretString, PlatformError> {
    let form: Vec<(&str, &str)> = match &credentials.grant {
        Grant::Password { username, password } => vec![
            ("grant_type", "password"),
            ("username", username.as_str()),
            ("password", password.expose_secret()),
        ],
        Grant::ClientCredentials => vec![("grant_type", "client_credentials")],
    };
    let response = http
        .post(token_url.clone())
        .basic_auth(
            &credentials.client_id,
            Some(credentials.client_secret.expose_secret()),
        )
        .form(&form)
        .send()
        .await
        .map_err(|e| PlatformError::Transport(e.to_string()))?;
    let token: TokenResponse = decode(response, token_url).await?;
    Ok(SecretString::from(token.access_token))
}

async fn decode<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T, PlatformError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(PlatformError::Unauthorized(format!("{url} answered {status}")));
    }
    if !status.is_success() {
        return Err(PlatformError::Transport(format!("{url} answered {status}")));
    }
    response
        .json()
        .await
        .map_err(|e| PlatformError::InvalidResponse(format!("{url}: {e}")))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_segments_to_base_path() {
        let base = Url::parse("https://api.sys.example.com/cf/").unwrap();
        let url = endpoint(&base, &["v2", "apps", "app-1"]).unwrap();
        assert_eq!(url.as_str(), "https://api.sys.example.com/cf/v2/apps/app-1");
    }

    #[test]
    fn endpoint_escapes_guid() {
        let base = Url::parse("https://api.sys.example.com").unwrap();
        let url = endpoint(&base, &["v2", "apps", "../info"]).unwrap();
        assert_eq!(url.as_str(), "https://api.sys.example.com/v2/apps/..%2Finfo");
    }

    #[test]
    fn base_url_must_be_http() {
        assert!(parse_base_url("https://api.sys.example.com").is_ok());
        assert!(matches!(
            parse_base_url("ftp://api.sys.example.com"),
            Err(PlatformError::InvalidSettings(_))
        ));
        assert!(matches!(
            parse_base_url(""),
            Err(PlatformError::InvalidSettings(_))
        ));
    }

    #[test]
    fn username_selects_password_grant_with_cli_client() {
        let settings = PlatformSettings {
            username: "admin".to_owned(),
            password: Some(SecretString::from("pw")),
            ..PlatformSettings::default()
        };
        let creds = Credentials::from_settings(&settings).unwrap();
        assert_eq!(creds.client_id, "cf");
        assert_eq!(creds.client_secret.expose_secret(), "");
        assert!(matches!(creds.grant, Grant::Password { ref username, .. } if username == "admin"));
    }

    #[test]
    fn client_id_alone_selects_client_credentials() {
        let settings = PlatformSettings {
            client_id: "broker".to_owned(),
            client_secret: Some(SecretString::from("s3cret")),
            ..PlatformSettings::default()
        };
        let creds = Credentials::from_settings(&settings).unwrap();
        assert_eq!(creds.client_id, "broker");
        assert!(matches!(creds.grant, Grant::ClientCredentials));
    }

    #[test]
    fn credentials_are_required() {
        let err = Credentials::from_settings(&PlatformSettings::default()).unwrap_err();
        assert!(matches!(err, PlatformError::InvalidSettings(_)));
    }
}
