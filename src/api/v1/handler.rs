use super::error::*;
use crate::application_port::*;
use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use warp::http::{StatusCode, header};
use warp::{Reply, reject};

pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

const UNKNOWN_ORIGIN: &str = "unknown";

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PairResponse {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// The client address without its port.
fn origin_of(remote: Option<SocketAddr>) -> String {
    remote
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_ORIGIN.to_string())
}

fn refresh_cookie(token: &RefreshToken, expires_at: DateTime<Utc>) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; Expires={}",
        REFRESH_COOKIE_NAME,
        token.0,
        expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
    )
}

fn cleared_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; Max-Age=0", REFRESH_COOKIE_NAME)
}

async fn bounded<T>(
    timeout: Duration,
    op: impl Future<Output = Result<T, AuthError>>,
) -> Result<T, warp::Rejection> {
    tokio::time::timeout(timeout, op)
        .await
        .map_err(|_| reject::custom(ApiErrorCode::internal("request timed out")))?
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)
}

fn pair_reply(pair: TokenPair) -> impl Reply {
    let cookie = refresh_cookie(&pair.refresh_token, pair.refresh_token_expires_at);
    let response = PairResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    };
    warp::reply::with_header(warp::reply::json(&response), header::SET_COOKIE, cookie)
}

pub async fn login(
    query: LoginQuery,
    remote: Option<SocketAddr>,
    auth_service: Arc<dyn AuthService>,
    timeout: Duration,
) -> Result<impl Reply, warp::Rejection> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| reject::custom(ApiErrorCode::MissingId))?;
    let user_id: UserId = id
        .parse()
        .map_err(|_| reject::custom(ApiErrorCode::InvalidId))?;

    let origin = origin_of(remote);
    let pair = bounded(timeout, auth_service.authenticate(user_id, &origin)).await?;

    Ok(pair_reply(pair))
}

pub async fn refresh(
    cookie: Option<String>,
    remote: Option<SocketAddr>,
    auth_service: Arc<dyn AuthService>,
    timeout: Duration,
) -> Result<impl Reply, warp::Rejection> {
    let token = cookie
        .filter(|c| !c.is_empty())
        .map(RefreshToken)
        .ok_or_else(|| reject::custom(ApiErrorCode::Unauthorized))?;

    let origin = origin_of(remote);
    let pair = bounded(timeout, auth_service.refresh(&token, &origin)).await?;

    Ok(pair_reply(pair))
}

pub async fn logout(
    cookie: Option<String>,
    auth_service: Arc<dyn AuthService>,
    timeout: Duration,
) -> Result<impl Reply, warp::Rejection> {
    let token = cookie
        .filter(|c| !c.is_empty())
        .map(RefreshToken)
        .ok_or_else(|| reject::custom(ApiErrorCode::Unauthorized))?;

    bounded(timeout, auth_service.invalidate(&token)).await?;

    let reply = warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT);
    Ok(warp::reply::with_header(
        reply,
        header::SET_COOKIE,
        cleared_cookie(),
    ))
}

pub async fn health() -> Result<impl Reply, warp::Rejection> {
    Ok(warp::reply::json(&HealthResponse { status: "ok" }))
}
