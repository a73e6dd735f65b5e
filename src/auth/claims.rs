use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::roles::Role;

/// JWT payload. Carries no version or epoch, so a token stays valid until `exp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,   // principal ID
    pub role: Role,  // role at signup
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}
