//! Lease (spec §3) — two-key authorization token for privileged actions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CosignerRole {
    Human,
    Agent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cosignature {
    pub role: CosignerRole,
    pub id: String,
    pub sig: String,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    Pending,
    Active,
    Revoked,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseLimits {
    pub wallclock_timeout_s: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lease {
    pub lease_id: String,
    pub intent_id: String,
    pub actor: String,
    pub issued_at: f64,
    pub expires_at: f64,
    pub limits: LeaseLimits,
    #[serde(default)]
    pub cosigners: Vec<Cosignature>,
    #[serde(default)]
    pub status: Option<LeaseStatus>,
}

impl Lease {
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn has_role(&self, role: CosignerRole) -> bool {
        self.cosigners.iter().any(|c| c.role == role)
    }
}
