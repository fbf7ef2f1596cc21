use jsonwebtoken::{EncodingKey, Header};
use serde::Serialize;
use shimms_auth::{AuthError, IdentityVerifier, JwtIdentityVerifier};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Serialize)]
struct TestClaims<'a> {
    sub: &'a str,
    email: Option<&'a str>,
    aud: &'a str,
    exp: u64,
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn sign(secret: &str, sub: &str, exp: u64) -> String {
    let claims = TestClaims {
        sub,
        email: Some("coach@example.se"),
        aud: "authenticated",
        exp,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token")
}

#[test]
fn hosted_token_decodes_to_identity() {
    let verifier = JwtIdentityVerifier::new("secret".to_string());
    let token = sign("secret", "user-1", now() + 3600);

    let identity = verifier.verify(&token).expect("identity");
    assert_eq!(identity.id, "user-1");
    assert_eq!(identity.email.as_deref(), Some("coach@example.se"));
}

#[test]
fn expired_token_rejected() {
    let verifier = JwtIdentityVerifier::new("secret".to_string());
    let token = sign("secret", "user-1", now() - 3600);

    assert!(matches!(verifier.verify(&token), Err(AuthError::TokenExpired)));
}

#[test]
fn wrong_secret_or_garbage_is_invalid() {
    let verifier = JwtIdentityVerifier::new("secret".to_string());
    let token = sign("other", "user-1", now() + 3600);

    assert!(matches!(verifier.verify(&token), Err(AuthError::TokenInvalid)));
    assert!(matches!(verifier.verify("not-a-jwt"), Err(AuthError::TokenInvalid)));
}

#[test]
fn empty_token_or_subject_rejected() {
    let verifier = JwtIdentityVerifier::new("secret".to_string());
    assert!(matches!(verifier.verify("  "), Err(AuthError::TokenMissing)));

    let token = sign("secret", "", now() + 3600);
    assert!(matches!(verifier.verify(&token), Err(AuthError::TokenInvalid)));
}
