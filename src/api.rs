//! API client module: a small blocking HTTP client for the record and
//! profile service. Every call is a single attempt with a bounded timeout.

use std::fmt;

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::records::model::null_as_default;
use crate::records::{Record, RecordStore, Session};

const MACHINE_ID_LEN: usize = 128;
const MACHINE_ID_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_";
const UID_PREFIX: &str = "reso-cli-session-";

/// Blocking client holding a reqwest client and the service base URL.
/// Sessions are passed per call, the client never stores a token.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// Credentials collected from the operator.
#[derive(Clone, Default)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
    pub totp: Option<String>,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("totp", &self.totp.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Login payload for `POST /userSessions`.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username: &'a str,
    authentication: PasswordAuthentication<'a>,
    secret_machine_id: String,
    remember_me: bool,
}

#[derive(Serialize, Debug)]
struct PasswordAuthentication<'a> {
    #[serde(rename = "$type")]
    kind: &'static str,
    password: &'a str,
}

#[derive(Deserialize, Debug)]
struct SessionEnvelope {
    entity: SessionEntity,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SessionEntity {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    token: String,
}

/// Editable part of a user's profile. `None` fields are omitted on update.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    // Badge entries are opaque objects; keep them as raw JSON so they are
    // sent back untouched.
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_badges: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Response of `GET /users/{userId}`; only the fields this client uses.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

impl ApiClient {
    /// Build a client from the loaded configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authorization header map for a session.
    fn auth_headers(&self, session: &Session) -> ApiResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(&session.authorization())?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    /// Send `request` and return the body of a success response, or a
    /// `Transport` error carrying status and body.
    ///
    /// A success body that cannot be read in full is a `Network` error.
    fn send(&self, endpoint: &str, request: RequestBuilder) -> ApiResult<String> {
        debug!(endpoint, "sending request");
        let res = request.send()?;
        let status = res.status();
        if !status.is_success() {
            // Diagnostic only; an unreadable error body stays empty.
            let body = res.text().unwrap_or_default();
            return Err(ApiError::Transport {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(res.text()?)
    }

    /// Log in and return the session used by every later call.
    ///
    /// Any failure, including a non-success status or an unreadable body,
    /// is reported as `ApiError::Auth`.
    pub fn create_session(&self, credentials: &LoginCredentials) -> ApiResult<Session> {
        let payload = LoginRequest {
            username: &credentials.username,
            authentication: PasswordAuthentication {
                kind: "password",
                password: &credentials.password,
            },
            secret_machine_id: generate_machine_id(),
            remember_me: false,
        };
        let request = self
            .client
            .post(self.url("/userSessions"))
            .header("UID", generate_uid())
            .header("TOTP", credentials.totp.as_deref().unwrap_or(""))
            .json(&payload);

        let body = self
            .send("POST /userSessions", request)
            .map_err(|err| ApiError::Auth {
                reason: err.to_string(),
            })?;
        let session = decode_session(&body)?;
        info!(user_id = session.user_id(), "session created");
        Ok(session)
    }

    /// Fetch the current user's profile. A user without a profile gets an
    /// empty one.
    pub fn get_profile(&self, session: &Session) -> ApiResult<UserProfile> {
        let path = format!("/users/{}", session.user_id());
        let endpoint = format!("GET {path}");
        let request = self
            .client
            .get(self.url(&path))
            .headers(self.auth_headers(session)?);
        let body = self.send(&endpoint, request)?;
        let info: UserInfo = decode("user info", &body)?;
        Ok(info.profile.unwrap_or_default())
    }

    /// Replace the current user's profile.
    pub fn update_profile(&self, session: &Session, profile: &UserProfile) -> ApiResult<()> {
        let path = format!("/users/{}/profile", session.user_id());
        let endpoint = format!("PUT {path}");
        let request = self
            .client
            .put(self.url(&path))
            .headers(self.auth_headers(session)?)
            .json(profile);
        self.send(&endpoint, request)?;
        info!(user_id = session.user_id(), "profile updated");
        Ok(())
    }
}

impl RecordStore for ApiClient {
    fn fetch_all(&self, session: &Session) -> ApiResult<Vec<Record>> {
        let path = format!("/users/{}/records", session.user_id());
        let endpoint = format!("GET {path}");
        let request = self
            .client
            .get(self.url(&path))
            .headers(self.auth_headers(session)?);
        let body = self.send(&endpoint, request)?;
        let records = decode_records(&body)?;
        debug!(count = records.len(), "fetched records");
        Ok(records)
    }

    fn delete(&self, session: &Session, record: &Record) -> ApiResult<()> {
        let path = format!("/users/{}/records/{}", session.user_id(), record.id);
        let endpoint = format!("DELETE {path}");
        let request = self
            .client
            .delete(self.url(&path))
            .headers(self.auth_headers(session)?);
        self.send(&endpoint, request)?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(what: &'static str, body: &str) -> ApiResult<T> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode {
        what,
        body: body.to_string(),
        source,
    })
}

/// Decode the JSON array returned by the record list endpoint.
pub fn decode_records(body: &str) -> ApiResult<Vec<Record>> {
    decode("records", body)
}

/// Decode the session envelope returned by `POST /userSessions`.
pub fn decode_session(body: &str) -> ApiResult<Session> {
    let envelope: SessionEnvelope = serde_json::from_str(body).map_err(|err| ApiError::Auth {
        reason: format!("unreadable session response ({err}): {body}"),
    })?;
    let SessionEntity { user_id, token } = envelope.entity;
    if user_id.is_empty() || token.is_empty() {
        return Err(ApiError::Auth {
            reason: "session response did not contain a user id and token".into(),
        });
    }
    Ok(Session::new(user_id, token))
}

fn random_bytes() -> [u8; 16] {
    *Uuid::new_v4().as_bytes()
}

/// 128 random characters from `[A-Za-z0-9_]`.
fn generate_machine_id() -> String {
    let mut id = String::with_capacity(MACHINE_ID_LEN);
    while id.len() < MACHINE_ID_LEN {
        for byte in random_bytes() {
            if id.len() == MACHINE_ID_LEN {
                break;
            }
            let idx = byte as usize % MACHINE_ID_ALPHABET.len();
            id.push(MACHINE_ID_ALPHABET[idx] as char);
        }
    }
    id
}

/// Uppercase hex SHA-256 of a client tag plus 16 random bytes.
fn generate_uid() -> String {
    let data = format!("{UID_PREFIX}{}", STANDARD.encode(random_bytes()));
    hex::encode_upper(Sha256::digest(data.as_bytes()))
}
