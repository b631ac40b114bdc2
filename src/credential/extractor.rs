use crate::application_port::AuthError;
use warp::http::HeaderMap;
use warp::http::header::AUTHORIZATION;

pub const BEARER_PREFIX: &str = "Bearer ";
pub const API_KEY_PREFIX: &str = "ApiKey ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("authorization header missing")]
    MissingHeader,
    #[error("authorization header malformed")]
    MalformedHeader,
}

impl From<CredentialError> for AuthError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::MissingHeader => AuthError::MissingHeader,
            CredentialError::MalformedHeader => AuthError::MalformedHeader,
        }
    }
}

/// `Authorization: Bearer <token>`. The token may be an access token or a
/// refresh token; the caller decides which.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, CredentialError> {
    extract_with_prefix(headers, BEARER_PREFIX)
}

/// `Authorization: ApiKey <key>`.
pub fn extract_api_key(headers: &HeaderMap) -> Result<String, CredentialError> {
    extract_with_prefix(headers, API_KEY_PREFIX)
}

pub fn parse_bearer(value: &str) -> Result<&str, CredentialError> {
    parse_with_prefix(value, BEARER_PREFIX)
}

pub fn parse_api_key(value: &str) -> Result<&str, CredentialError> {
    parse_with_prefix(value, API_KEY_PREFIX)
}

fn extract_with_prefix(headers: &HeaderMap, prefix: &str) -> Result<String, CredentialError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(CredentialError::MissingHeader)?
        .to_str()
        .map_err(|_| CredentialError::MalformedHeader)?;
    parse_with_prefix(value, prefix).map(str::to_owned)
}

fn parse_with_prefix<'a>(value: &'a str, prefix: &str) -> Result<&'a str, CredentialError> {
    if value.trim().is_empty() {
        return Err(CredentialError::MissingHeader);
    }
    let credential = value
        .strip_prefix(prefix)
        .ok_or(CredentialError::MalformedHeader)?
        .trim();
    if credential.is_empty() {
        return Err(CredentialError::MalformedHeader);
    }
    Ok(credential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use warp::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(parse_bearer("Bearer abc123"), Ok("abc123"));
        assert_eq!(
            extract_bearer_token(&headers_with("Bearer abc123")),
            Ok("abc123".to_string())
        );
    }

    #[test]
    fn empty_header_is_missing() {
        assert_eq!(parse_bearer(""), Err(CredentialError::MissingHeader));
        assert_eq!(
            extract_bearer_token(&headers_with("")),
            Err(CredentialError::MissingHeader)
        );
        assert_eq!(
            extract_bearer_token(&HeaderMap::new()),
            Err(CredentialError::MissingHeader)
        );
    }

    #[test]
    fn wrong_scheme_is_malformed() {
        assert_eq!(
            parse_bearer("Basic abc123"),
            Err(CredentialError::MalformedHeader)
        );
        assert_eq!(parse_bearer("Bearer "), Err(CredentialError::MalformedHeader));
        assert_eq!(parse_bearer("bearer abc"), Err(CredentialError::MalformedHeader));
    }

    #[test]
    fn api_key_uses_its_own_scheme() {
        assert_eq!(parse_api_key("ApiKey f271c81ff7084ee5"), Ok("f271c81ff7084ee5"));
        assert_eq!(
            extract_api_key(&headers_with("Bearer abc123")),
            Err(CredentialError::MalformedHeader)
        );
        assert_eq!(
            extract_api_key(&HeaderMap::new()),
            Err(CredentialError::MissingHeader)
        );
    }

    #[test]
    fn non_ascii_header_is_malformed() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap(),
        );
        assert_eq!(
            extract_bearer_token(&headers),
            Err(CredentialError::MalformedHeader)
        );
    }
}
