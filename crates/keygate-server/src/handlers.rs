use std::collections::BTreeMap;

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    client_ip::{peer_ip, ClientIp},
    error::ApiError,
    policy::{decide_client, decide_developer, ClientDecision},
    store::{bans, KeyRecord},
    AppState,
};

pub const NEW_KEY_MESSAGE: &str = "Here is your new key for today.";
pub const EXISTING_KEY_MESSAGE: &str = "You already have a key for today. Come back tomorrow.";

// ── Health ────────────────────────────────────────────────────────────────────

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

// ── Landing page ──────────────────────────────────────────────────────────────

pub async fn index(
    State(state): State<AppState>,
    client: ClientIp,
) -> Result<Html<String>, ApiError> {
    let is_developer = state.policy.is_allowlisted(&client.ip);
    Ok(Html(state.pages.index(is_developer)?))
}

// ── Debug info ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DebugInfo {
    pub calculated_user_ip: String,
    pub remote_addr: String,
    pub all_headers: BTreeMap<String, String>,
}

/// Echoes what the server sees about the caller. Unauthenticated: it exposes
/// every request header, including any added by proxies in front.
pub async fn debug_info(client: ClientIp, headers: HeaderMap) -> Json<DebugInfo> {
    let mut all_headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers.iter() {
        let value = String::from_utf8_lossy(value.as_bytes());
        all_headers
            .entry(name.as_str().to_owned())
            .and_modify(|v| {
                v.push_str(", ");
                v.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }

    Json(DebugInfo {
        calculated_user_ip: client.ip,
        remote_addr: peer_ip(client.peer),
        all_headers,
    })
}

// ── Client key ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ClientKeyResponse {
    pub daily_key: String,
    pub message: &'static str,
}

pub async fn get_client_key(
    State(state): State<AppState>,
    client: ClientIp,
) -> Result<Json<ClientKeyResponse>, ApiError> {
    let response = tokio::task::spawn_blocking(move || issue_client_key(&state, &client.ip))
        .await
        .context("client key task failed")??;
    Ok(Json(response))
}

/// Ban check, decision, and persistence under both store locks
/// (ban list first, then keys).
fn issue_client_key(state: &AppState, ip: &str) -> Result<ClientKeyResponse, ApiError> {
    let today = state.clock.today();

    let ban_file = state.bans.lock()?;
    let mut banned = ban_file.load()?;
    if bans::contains(&banned, ip) {
        warn!(ip, "client key refused: banned");
        return Err(ApiError::Banned);
    }

    let key_file = state.keys.lock()?;
    let mut records = key_file.load()?;
    let prior_repeats = state.repeats.count(ip, today)?;

    match decide_client(ip, today, &records, prior_repeats, &state.policy) {
        ClientDecision::Issue(record) => {
            let daily_key = record.key.clone();
            records.push(record);
            key_file.save(&records)?;
            info!(ip, %today, "audit: key.issue");
            Ok(ClientKeyResponse {
                daily_key,
                message: NEW_KEY_MESSAGE,
            })
        }
        ClientDecision::Existing(daily_key) => {
            let repeats = state.repeats.record(ip, today)?;
            info!(ip, repeats, "audit: key.repeat");
            Ok(ClientKeyResponse {
                daily_key,
                message: EXISTING_KEY_MESSAGE,
            })
        }
        ClientDecision::Ban => {
            if bans::insert(&mut banned, ip) {
                ban_file.save(&banned)?;
            }
            state.repeats.clear(ip, today)?;
            warn!(ip, threshold = state.policy.ban_threshold, "audit: ip.ban");
            Err(ApiError::NewlyBanned)
        }
    }
}

// ── Developer key ─────────────────────────────────────────────────────────────

/// First value of `days` in the query string. Repeated keys are allowed and
/// later values ignored.
pub fn first_days_param(pairs: &[(String, String)]) -> Option<&str> {
    pairs
        .iter()
        .find(|(name, _)| name == "days")
        .map(|(_, value)| value.as_str())
}

#[derive(Debug, Serialize)]
pub struct DeveloperKeyResponse {
    pub key_info: KeyRecord,
}

pub async fn generate_developer_key(
    State(state): State<AppState>,
    client: ClientIp,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<DeveloperKeyResponse>, ApiError> {
    let today = state.clock.today();
    let days = first_days_param(&pairs);
    let record = decide_developer(&client.ip, days, today, &state.policy).map_err(|rejection| {
        warn!(ip = %client.ip, ?days, ?rejection, "developer key refused");
        ApiError::from(rejection)
    })?;

    let stored = record.clone();
    tokio::task::spawn_blocking(move || append_key(&state, stored))
        .await
        .context("developer key task failed")??;
    info!(
        ip = %client.ip,
        valid_for_days = record.valid_for_days,
        expires_on = %record.expires_on,
        "audit: key.developer"
    );
    Ok(Json(DeveloperKeyResponse { key_info: record }))
}

fn append_key(state: &AppState, record: KeyRecord) -> anyhow::Result<()> {
    let key_file = state.keys.lock()?;
    let mut records = key_file.load()?;
    records.push(record);
    key_file.save(&records)
}
