use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const SESSION_TTL_MINUTES: i64 = 60;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i32,
    pub oid: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: String,
    pub exp: i64,
}

impl Claims {
    pub fn new(
        user_id: i32,
        open_id: String,
        name: Option<String>,
        email: Option<String>,
        role: String,
    ) -> Self {
        Self {
            sub: user_id,
            oid: open_id,
            name,
            email,
            role,
            exp: (Utc::now() + Duration::minutes(SESSION_TTL_MINUTES)).timestamp(),
        }
    }
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("JWT encode failed: {e}"))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("JWT decode failed: {e}"))
}
