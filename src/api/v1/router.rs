use super::error::*;
use super::handler;
use crate::application_port::*;
use crate::credential::*;
use crate::domain_model::UserId;
use crate::server::*;
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::HeaderMap;
use warp::{Filter, Rejection, reject};

const MAX_JSON_BODY: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    // Path before method, so an unknown path is a 404 rather than a 405.
    let healthz = warp::path("healthz")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handler::healthz);

    let signup = warp::path("users")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.account_service.clone()))
        .and_then(handler::signup);

    let update_credentials = warp::path("users")
        .and(warp::path::end())
        .and(warp::put())
        .and(with_authenticated_user(server.session_service.clone()))
        .and(json_body())
        .and(with(server.account_service.clone()))
        .and_then(handler::update_credentials);

    let login = warp::path("login")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.session_service.clone()))
        .and_then(handler::login);

    let refresh = warp::path("refresh")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_bearer())
        .and(with(server.session_service.clone()))
        .and_then(handler::refresh);

    let revoke = warp::path("revoke")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_bearer())
        .and(with(server.session_service.clone()))
        .and_then(handler::revoke);

    let entitlement = warp::path!("webhooks" / "entitlement")
        .and(warp::post())
        .and(with_api_key(server.api_key_verifier.clone()))
        .and(json_body())
        .and(with(server.session_service.clone()))
        .and_then(handler::entitlement_webhook);

    let reset = warp::path!("admin" / "reset")
        .and(warp::post())
        .and(with(server.account_service.clone()))
        .and_then(handler::reset);

    healthz
        .or(signup)
        .or(update_credentials)
        .or(login)
        .or(refresh)
        .or(revoke)
        .or(entitlement)
        .or(reset)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_JSON_BODY).and(warp::body::json())
}

fn auth_rejection(err: impl Into<AuthError>) -> Rejection {
    reject::custom(ApiErrorCode::from(err.into()))
}

/// Raw bearer credential. Refresh and revoke hand it to the session service
/// as a refresh token; [`with_authenticated_user`] verifies it as an access
/// token.
fn with_bearer() -> impl Filter<Extract = (String,), Error = Rejection> + Clone {
    warp::header::headers_cloned().and_then(|headers: HeaderMap| async move {
        extract_bearer_token(&headers).map_err(auth_rejection)
    })
}

fn with_authenticated_user(
    session_service: Arc<dyn SessionService>,
) -> impl Filter<Extract = (UserId,), Error = Rejection> + Clone {
    with_bearer().and_then(move |token: String| {
        let session_service = session_service.clone();
        async move {
            session_service
                .authenticate(&token)
                .await
                .map_err(auth_rejection)
        }
    })
}

fn with_api_key(
    verifier: Arc<ApiKeyVerifier>,
) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::headers_cloned()
        .and_then(move |headers: HeaderMap| {
            let verifier = verifier.clone();
            async move {
                let key = extract_api_key(&headers).map_err(auth_rejection)?;
                if verifier.verify(&key) {
                    Ok::<(), Rejection>(())
                } else {
                    Err(auth_rejection(AuthError::InvalidApiKey))
                }
            }
        })
        .untuple_one()
}
