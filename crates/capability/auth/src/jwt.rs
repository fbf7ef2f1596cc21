use crate::AuthError;
use domain::Identity;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
/// 托管身份提供方签发的 access token claims（仅取本层需要的字段，exp 由 Validation 校验）。
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

/// 外部 access token 校验（HS256，本层不签发）。
pub struct JwtIdentityVerifier {
    secret: Vec<u8>,
}

impl JwtIdentityVerifier {
    pub fn new(secret: String) -> Self {
        Self {
            secret: secret.into_bytes(),
        }
    }

    /// 校验签名与过期时间，提取身份。
    pub fn decode_identity(&self, token: &str) -> Result<Identity, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::TokenMissing);
        }
        let claims = self.decode_claims(token)?;
        if claims.sub.trim().is_empty() {
            return Err(AuthError::TokenInvalid);
        }
        Ok(Identity::new(claims.sub, claims.email))
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // 托管方 token 的 aud 固定为 "authenticated"，不参与判断。
        validation.validate_aud = false;
        let decoded = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &validation,
        )
        .map_err(map_jwt_error)?;
        Ok(decoded.claims)
    }
}

/// 将 jwt 库错误映射为业务错误。
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenInvalid,
    }
}
