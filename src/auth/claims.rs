use serde::{Deserialize, Serialize};

/// JWT payload. A cache of the user record at issuance time: only `id` is
/// ever used for authorization, and only after a fresh store lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,           // user ID
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub iat: usize,        // issued at (unix timestamp)
    pub iss: String,       // issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<usize>, // only when a TTL is configured
}
