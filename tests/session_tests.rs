mod common;

use chirpy_auth::application_port::*;
use chirpy_auth::domain_model::UserId;
use chirpy_auth::server::Server;
use chrono::Duration;
use common::*;

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = context("dev");
    ctx.signup(EMAIL, PASSWORD).await;

    let before = ctx.hasher.verifications();
    let wrong_password = ctx.login(EMAIL, "wrong").await.unwrap_err();
    let after_wrong = ctx.hasher.verifications();
    let unknown_email = ctx.login("nobody@b.com", PASSWORD).await.unwrap_err();
    let after_unknown = ctx.hasher.verifications();

    assert_eq!(wrong_password, AuthError::InvalidCredentials);
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    // one verification on each path
    assert_eq!(after_wrong - before, 1);
    assert_eq!(after_unknown - after_wrong, 1);
}

#[tokio::test]
async fn test_login_returns_working_tokens() {
    let ctx = context("dev");
    let profile = ctx.signup(EMAIL, PASSWORD).await;

    let result = ctx.login(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(result.user, profile);
    assert_eq!(result.refresh_token.0.len(), 64);
    assert!(result.refresh_token.0.chars().all(|c| c.is_ascii_hexdigit()));

    let now = chirpy_auth::domain_port::Clock::now(ctx.clock.as_ref());
    assert_eq!(result.access_token_expires_at, now + Duration::hours(1));
    assert_eq!(result.refresh_token_expires_at, now + Duration::days(60));

    let user_id = ctx
        .server
        .session_service
        .authenticate(&result.access_token.0)
        .await
        .unwrap();
    assert_eq!(user_id, profile.id);
}

#[tokio::test]
async fn test_every_login_opens_a_separate_session() {
    let ctx = context("dev");
    ctx.signup(EMAIL, PASSWORD).await;

    let first = ctx.login(EMAIL, PASSWORD).await.unwrap();
    let second = ctx.login(EMAIL, PASSWORD).await.unwrap();
    assert_ne!(first.refresh_token, second.refresh_token);
    assert_eq!(ctx.refresh_tokens.len(), 2);

    let sessions = &ctx.server.session_service;
    assert!(sessions.refresh(&first.refresh_token.0).await.is_ok());
    assert!(sessions.refresh(&second.refresh_token.0).await.is_ok());

    sessions.revoke(&first.refresh_token.0).await.unwrap();
    assert!(sessions.refresh(&second.refresh_token.0).await.is_ok());
}

#[tokio::test]
async fn test_refresh_token_state_machine() {
    let ctx = context("dev");
    let profile = ctx.signup(EMAIL, PASSWORD).await;
    let login = ctx.login(EMAIL, PASSWORD).await.unwrap();
    let token = login.refresh_token.0;
    let sessions = &ctx.server.session_service;

    let refreshed = sessions.refresh(&token).await.unwrap();
    assert_eq!(
        sessions
            .authenticate(&refreshed.access_token.0)
            .await
            .unwrap(),
        profile.id
    );

    // refresh does not rotate
    assert!(sessions.refresh(&token).await.is_ok());

    sessions.revoke(&token).await.unwrap();
    assert_eq!(
        sessions.refresh(&token).await.unwrap_err(),
        AuthError::Unauthenticated(UnauthenticatedReason::Revoked)
    );

    // second revoke is a no-op
    sessions.revoke(&token).await.unwrap();
    assert_eq!(
        sessions.refresh(&token).await.unwrap_err(),
        AuthError::Unauthenticated(UnauthenticatedReason::Revoked)
    );
}

#[tokio::test]
async fn test_unknown_refresh_token() {
    let ctx = context("dev");
    let sessions = &ctx.server.session_service;
    let unknown = "ab".repeat(32);

    assert_eq!(
        sessions.refresh(&unknown).await.unwrap_err(),
        AuthError::Unauthenticated(UnauthenticatedReason::NotFound)
    );
    assert_eq!(
        sessions.revoke(&unknown).await.unwrap_err(),
        AuthError::NotFound
    );
}

#[tokio::test]
async fn test_refresh_token_expires_after_sixty_days() {
    let ctx = context("dev");
    ctx.signup(EMAIL, PASSWORD).await;
    let token = ctx.login(EMAIL, PASSWORD).await.unwrap().refresh_token.0;
    let sessions = &ctx.server.session_service;

    ctx.clock.advance(Duration::days(60) - Duration::seconds(1));
    assert!(sessions.refresh(&token).await.is_ok());

    ctx.clock.advance(Duration::seconds(1));
    assert_eq!(
        sessions.refresh(&token).await.unwrap_err(),
        AuthError::Unauthenticated(UnauthenticatedReason::Expired)
    );
}

#[tokio::test]
async fn test_revocation_wins_over_expiry() {
    let ctx = context("dev");
    ctx.signup(EMAIL, PASSWORD).await;
    let token = ctx.login(EMAIL, PASSWORD).await.unwrap().refresh_token.0;
    let sessions = &ctx.server.session_service;

    sessions.revoke(&token).await.unwrap();
    ctx.clock.advance(Duration::days(61));
    assert_eq!(
        sessions.refresh(&token).await.unwrap_err(),
        AuthError::Unauthenticated(UnauthenticatedReason::Revoked)
    );
}

#[tokio::test]
async fn test_access_token_expires_after_an_hour() {
    let ctx = context("dev");
    ctx.signup(EMAIL, PASSWORD).await;
    let access = ctx.login(EMAIL, PASSWORD).await.unwrap().access_token.0;
    let sessions = &ctx.server.session_service;

    ctx.clock.advance(Duration::seconds(3599));
    assert!(sessions.authenticate(&access).await.is_ok());

    ctx.clock.advance(Duration::seconds(1));
    assert_eq!(
        sessions.authenticate(&access).await.unwrap_err(),
        AuthError::InvalidToken(TokenError::Expired)
    );
}

#[tokio::test]
async fn test_garbage_access_tokens_are_rejected() {
    let ctx = context("dev");
    let sessions = &ctx.server.session_service;

    for token in ["", "abc", "a.b.c", "....", "eyJhbGciOiJIUzI1NiJ9"] {
        assert!(matches!(
            sessions.authenticate(token).await,
            Err(AuthError::InvalidToken(_))
        ));
    }
}

#[tokio::test]
async fn test_upgrade_entitlement() {
    let ctx = context("dev");
    let profile = ctx.signup(EMAIL, PASSWORD).await;
    assert!(!profile.is_premium);
    let sessions = &ctx.server.session_service;

    sessions.upgrade_entitlement(profile.id).await.unwrap();
    sessions.upgrade_entitlement(profile.id).await.unwrap();
    let user = ctx.login(EMAIL, PASSWORD).await.unwrap().user;
    assert!(user.is_premium);

    assert_eq!(
        sessions
            .upgrade_entitlement(UserId::new_v4())
            .await
            .unwrap_err(),
        AuthError::NotFound
    );
}

#[tokio::test]
async fn test_signup_validation_and_duplicates() {
    let ctx = context("dev");
    let accounts = &ctx.server.account_service;
    ctx.signup(EMAIL, PASSWORD).await;

    let duplicate = accounts
        .signup(SignupInput {
            email: EMAIL.to_string(),
            password: "other".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(duplicate, AuthError::UserExists);

    let empty = accounts
        .signup(SignupInput {
            email: "  ".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(empty, AuthError::Validation(_)));

    let no_password = accounts
        .signup(SignupInput {
            email: "c@d.com".to_string(),
            password: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(no_password, AuthError::Validation(_)));
}

#[tokio::test]
async fn test_login_ignores_surrounding_whitespace_in_email() {
    let ctx = context("dev");
    let padded = format!("  {EMAIL} ");
    let profile = ctx.signup(&padded, PASSWORD).await;
    assert_eq!(profile.email, EMAIL);

    let login = ctx.login(&padded, PASSWORD).await.unwrap();
    assert_eq!(login.user.id, profile.id);
    ctx.login(EMAIL, PASSWORD).await.unwrap();
}

#[tokio::test]
async fn test_server_refuses_out_of_range_ttls() {
    for (key, value) in [
        ("CHIRPY__AUTH__ACCESS_TTL_SECS", "0"),
        ("CHIRPY__AUTH__REFRESH_TTL_DAYS", "0"),
        ("CHIRPY__AUTH__REFRESH_TTL_DAYS", "100000000"),
    ] {
        let settings = settings_with("dev", &[(key, value)]);
        let err = Server::try_new(&settings).await.err();
        assert!(err.is_some(), "{key}={value} accepted");
    }
}

#[tokio::test]
async fn test_update_credentials() {
    let ctx = context("dev");
    let profile = ctx.signup(EMAIL, PASSWORD).await;
    ctx.signup("taken@b.com", PASSWORD).await;
    let accounts = &ctx.server.account_service;

    let updated = accounts
        .update_credentials(
            profile.id,
            UpdateCredentialsInput {
                email: "new@b.com".to_string(),
                password: "secret2".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.id, profile.id);
    assert_eq!(updated.email, "new@b.com");

    assert_eq!(
        ctx.login(EMAIL, PASSWORD).await.unwrap_err(),
        AuthError::InvalidCredentials
    );
    assert!(ctx.login("new@b.com", "secret2").await.is_ok());

    let clash = accounts
        .update_credentials(
            profile.id,
            UpdateCredentialsInput {
                email: "taken@b.com".to_string(),
                password: "secret3".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(clash, AuthError::UserExists);
}

#[tokio::test]
async fn test_reset_is_forbidden_outside_dev() {
    let ctx = context("prod");
    ctx.signup(EMAIL, PASSWORD).await;

    assert_eq!(
        ctx.server.account_service.reset().await.unwrap_err(),
        AuthError::Forbidden
    );
    assert!(ctx.login(EMAIL, PASSWORD).await.is_ok());
}

#[tokio::test]
async fn test_reset_clears_users_and_sessions() {
    let ctx = context("dev");
    ctx.signup(EMAIL, PASSWORD).await;
    ctx.signup("c@d.com", PASSWORD).await;
    let token = ctx.login(EMAIL, PASSWORD).await.unwrap().refresh_token.0;

    let summary = ctx.server.account_service.reset().await.unwrap();
    assert_eq!(
        summary,
        ResetSummary {
            users: 2,
            refresh_tokens: 1
        }
    );
    assert!(ctx.refresh_tokens.is_empty());
    assert_eq!(
        ctx.login(EMAIL, PASSWORD).await.unwrap_err(),
        AuthError::InvalidCredentials
    );
    assert_eq!(
        ctx.server
            .session_service
            .refresh(&token)
            .await
            .unwrap_err(),
        AuthError::Unauthenticated(UnauthenticatedReason::NotFound)
    );
}
