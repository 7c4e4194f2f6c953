// ── Push gateway ──
//
// The hub can call back into the host: a single entity state, a bulk of
// `key=value` states, or a bare refresh trigger. Every call must come from
// the hub's own address and carry HTTP Basic credentials
// `ipx800:<push password>`. HTTP routing belongs to the host; this module
// only authorizes a request and says what to do with it.

use std::net::IpAddr;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, warn};

pub const PUSH_USERNAME: &str = "ipx800";

/// Bulk values read as "on"; anything else is "off".
const ON_VALUES: [&str; 3] = ["1", "on", "true"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("Push from {remote} refused: {reason}")]
    Unauthorized { remote: IpAddr, reason: String },
}

/// What the hub sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushKind {
    /// `/api/ipx800v5/{entity_id}/{state}`
    State { entity_id: String, state: String },
    /// `/api/ipx800v5_data/{data}`, `data` being `id=value&id=value`.
    Bulk { data: String },
    /// `/api/ipx800v5_refresh/{data}`
    Refresh,
}

/// One incoming push call.
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub remote: IpAddr,
    /// Raw `Authorization` header, if any.
    pub authorization: Option<String>,
    pub kind: PushKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateUpdate {
    pub entity_id: String,
    pub state: String,
}

/// What the host should do after an authorized push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushAction {
    /// Overwrite these entity states, keeping their attributes.
    SetStates(Vec<StateUpdate>),
    /// Ask the state coordinator for a refresh.
    Refresh,
}

/// Authorizes push calls for one hub.
pub struct PushGateway {
    host: String,
    password: Option<SecretString>,
}

impl PushGateway {
    pub fn new(host: impl Into<String>, password: Option<SecretString>) -> Self {
        Self {
            host: host.into(),
            password,
        }
    }

    pub fn handle(&self, request: &PushRequest) -> Result<PushAction, PushError> {
        self.authorize(request).map_err(|reason| {
            warn!(remote = %request.remote, %reason, "push refused");
            PushError::Unauthorized {
                remote: request.remote,
                reason,
            }
        })?;

        Ok(match &request.kind {
            PushKind::State { entity_id, state } => {
                debug!(entity_id = %entity_id, state = %state, "state pushed");
                PushAction::SetStates(vec![StateUpdate {
                    entity_id: entity_id.clone(),
                    state: state.clone(),
                }])
            }
            PushKind::Bulk { data } => PushAction::SetStates(parse_bulk(data)),
            PushKind::Refresh => {
                debug!("refresh pushed");
                PushAction::Refresh
            }
        })
    }

    fn authorize(&self, request: &PushRequest) -> Result<(), String> {
        if request.remote.to_string() != self.host {
            return Err(format!("not coming from the hub address {}", self.host));
        }
        let Some(expected) = &self.password else {
            return Err("no push password configured".into());
        };
        let header = request
            .authorization
            .as_deref()
            .ok_or("no authentication provided")?;
        let (user, password) = decode_basic(header).ok_or("malformed Authorization header")?;
        if user != PUSH_USERNAME || password != expected.expose_secret() {
            return Err("invalid credentials".into());
        }
        Ok(())
    }
}

fn decode_basic(header: &str) -> Option<(String, String)> {
    let mut parts = header.split_whitespace();
    let scheme = parts.next()?;
    let encoded = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_owned(), password.to_owned()))
}

/// `a=1&b=off&c` -> `a: on`, `b: off`; entries without `=` are skipped.
pub fn parse_bulk(data: &str) -> Vec<StateUpdate> {
    data.split('&')
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let Some((entity_id, value)) = entry.split_once('=') else {
                warn!(entry, "bulk push entry without a value, skipping");
                return None;
            };
            let state = if ON_VALUES.contains(&value) { "on" } else { "off" };
            Some(StateUpdate {
                entity_id: entity_id.to_owned(),
                state: state.to_owned(),
            })
        })
        .collect()
}
