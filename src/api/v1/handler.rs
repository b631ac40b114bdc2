use super::error::*;
use crate::application_port::*;
use crate::domain_model::{UserId, UserProfile};
use crate::logger::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Reply, reject};

pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

fn json_with_status<T: Serialize>(data: T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(&ApiResponse::ok(data)), status).into_response()
}

fn no_content() -> Response {
    warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT).into_response()
}

pub async fn healthz() -> Result<Response, warp::Rejection> {
    Ok(warp::reply::with_status("OK", StatusCode::OK).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

pub async fn signup(
    body: CredentialsRequest,
    account_service: Arc<dyn AccountService>,
) -> Result<Response, warp::Rejection> {
    let input = SignupInput {
        email: body.email,
        password: body.password,
    };
    let profile = account_service
        .signup(input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(json_with_status(profile, StatusCode::CREATED))
}

pub async fn update_credentials(
    user_id: UserId,
    body: CredentialsRequest,
    account_service: Arc<dyn AccountService>,
) -> Result<Response, warp::Rejection> {
    let input = UpdateCredentialsInput {
        email: body.email,
        password: body.password,
    };
    let profile = account_service
        .update_credentials(user_id, input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(json_with_status(profile, StatusCode::OK))
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub token: AccessToken,
    pub token_expires_at: DateTime<Utc>,
    pub refresh_token: RefreshToken,
    pub refresh_token_expires_at: DateTime<Utc>,
}

pub async fn login(
    body: CredentialsRequest,
    session_service: Arc<dyn SessionService>,
) -> Result<Response, warp::Rejection> {
    let input = LoginInput {
        email: body.email,
        password: body.password,
    };
    let result = session_service
        .login(input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = LoginResponse {
        user: result.user,
        token: result.access_token,
        token_expires_at: result.access_token_expires_at,
        refresh_token: result.refresh_token,
        refresh_token_expires_at: result.refresh_token_expires_at,
    };
    Ok(json_with_status(response, StatusCode::OK))
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: AccessToken,
    pub expires_at: DateTime<Utc>,
}

pub async fn refresh(
    refresh_token: String,
    session_service: Arc<dyn SessionService>,
) -> Result<Response, warp::Rejection> {
    let result = session_service
        .refresh(&refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = RefreshResponse {
        token: result.access_token,
        expires_at: result.access_token_expires_at,
    };
    Ok(json_with_status(response, StatusCode::OK))
}

pub async fn revoke(
    refresh_token: String,
    session_service: Arc<dyn SessionService>,
) -> Result<Response, warp::Rejection> {
    match session_service.revoke(&refresh_token).await {
        // unknown tokens get the same answer as revoked ones
        Ok(()) | Err(AuthError::NotFound) => Ok(no_content()),
        Err(e) => Err(reject::custom(ApiErrorCode::from(e))),
    }
}

#[derive(Debug, Deserialize)]
pub struct EntitlementData {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct EntitlementEvent {
    pub event: String,
    pub data: EntitlementData,
}

/// Payment-provider callback. Anything we don't act on is acknowledged so the
/// provider stops retrying.
pub async fn entitlement_webhook(
    body: EntitlementEvent,
    session_service: Arc<dyn SessionService>,
) -> Result<Response, warp::Rejection> {
    if body.event != USER_UPGRADED_EVENT {
        debug!(event = %body.event, "ignoring webhook event");
        return Ok(no_content());
    }
    let Ok(user_id) = body.data.user_id.parse::<UserId>() else {
        warn!(user_id = %body.data.user_id, "webhook carried an unparseable user id");
        return Ok(no_content());
    };

    session_service
        .upgrade_entitlement(user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(no_content())
}

pub async fn reset(account_service: Arc<dyn AccountService>) -> Result<Response, warp::Rejection> {
    let summary = account_service
        .reset()
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(json_with_status(summary, StatusCode::OK))
}
