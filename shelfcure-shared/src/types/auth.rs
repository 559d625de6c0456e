use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Staff,
    Pharmacist,
    StoreManager,
    Admin,
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaffRole::Staff => write!(f, "staff"),
            StaffRole::Pharmacist => write!(f, "pharmacist"),
            StaffRole::StoreManager => write!(f, "store_manager"),
            StaffRole::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "staff" => Ok(StaffRole::Staff),
            "pharmacist" => Ok(StaffRole::Pharmacist),
            "store_manager" => Ok(StaffRole::StoreManager),
            "admin" => Ok(StaffRole::Admin),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// JWT claims. `store_id` is the caller's current store scope; every
/// notification endpoint is implicitly filtered by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub store_id: Uuid,
    pub role: StaffRole,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn new(user_id: Uuid, store_id: Uuid, role: StaffRole, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id,
            store_id,
            role,
            iat: now,
            exp: now + duration_secs,
            jti: Uuid::now_v7(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    pub fn is_manager(&self) -> bool {
        matches!(self.role, StaffRole::StoreManager | StaffRole::Admin)
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub store_id: Uuid,
    pub role: StaffRole,
    pub token_id: Uuid,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            store_id: claims.store_id,
            role: claims.role,
            token_id: claims.jti,
        }
    }
}
