//! C5 Lease & Cosignature Manager: two-key authorization tokens.
//!
//! Leases persist one JSON file per lease under `outgoing/leases/<id>.json`
//! (spec §6), write-once-per-key: the lease document itself is replaced
//! atomically on each mutation (issue, cosign, expire), but cosignatures
//! only ever accumulate or replace an existing (role, id) pair, never drop
//! other entries (spec §5 "the lease directory is write-once-per-key … ;
//! cosignatures append").

use calyx_core::entities::{Cosignature, CosignerRole, Lease, LeaseLimits, LeaseStatus};
use calyx_fabric::write_atomic_json;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Default window (spec §4.5) after which a lease missing its human
/// cosignature is auto-rejected.
pub const DEFAULT_HUMAN_SIG_TIMEOUT_SECS: f64 = 900.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResult {
    pub usable: bool,
    pub reason: String,
}

pub struct LeaseManager {
    leases_dir: PathBuf,
    signing_key: String,
    human_sig_timeout_secs: f64,
}

impl LeaseManager {
    pub fn open(outgoing_dir: &std::path::Path, signing_key: impl Into<String>) -> Self {
        Self {
            leases_dir: outgoing_dir.join("leases"),
            signing_key: signing_key.into(),
            human_sig_timeout_secs: DEFAULT_HUMAN_SIG_TIMEOUT_SECS,
        }
    }

    fn path(&self, lease_id: &str) -> PathBuf {
        self.leases_dir.join(format!("{lease_id}.json"))
    }

    /// The signing convention this manager agrees on: hex SHA-256 over
    /// `lease_id:role:id:signing_key`. `AddCosignature` does not itself
    /// validate against this — that happens at `verify_lease`, so a
    /// forged signature is recorded but surfaces as `signature_mismatch`
    /// only when the lease is actually checked for usability.
    pub fn expected_signature(&self, lease_id: &str, role: CosignerRole, id: &str) -> String {
        let role_str = match role {
            CosignerRole::Human => "human",
            CosignerRole::Agent => "agent",
        };
        let mut hasher = Sha256::new();
        hasher.update(format!("{lease_id}:{role_str}:{id}:{}", self.signing_key));
        hex::encode(hasher.finalize())
    }

    pub fn issue_lease(&self, intent_id: &str, actor: &str, limits: LeaseLimits) -> Result<Lease, calyx_fabric::FabricError> {
        let now = calyx_core::time::now_ts();
        let lease = Lease {
            lease_id: Lease::new_id(),
            intent_id: intent_id.to_string(),
            actor: actor.to_string(),
            issued_at: now,
            expires_at: now + limits.wallclock_timeout_s as f64,
            limits,
            cosigners: Vec::new(),
            status: Some(LeaseStatus::Pending),
        };
        write_atomic_json(&self.path(&lease.lease_id), &lease)?;
        Ok(lease)
    }

    fn load(&self, lease_id: &str) -> Result<Option<Lease>, calyx_fabric::FabricError> {
        let path = self.path(lease_id);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Appends or replaces a cosignature for the (role, id) pair and
    /// activates the lease once it carries at least one human and one
    /// agent cosigner (status moves pending -> active).
    pub fn add_cosignature(
        &self,
        lease_id: &str,
        role: CosignerRole,
        id: &str,
        sig: &str,
    ) -> Result<Lease, calyx_fabric::FabricError> {
        let mut lease = self
            .load(lease_id)?
            .ok_or_else(|| calyx_fabric::FabricError::Watch(format!("no such lease: {lease_id}")))?;
        lease.cosigners.retain(|c| !(c.role == role && c.id == id));
        lease.cosigners.push(Cosignature {
            role,
            id: id.to_string(),
            sig: sig.to_string(),
            timestamp: calyx_core::time::now_ts(),
        });
        if lease.has_role(CosignerRole::Human) && lease.has_role(CosignerRole::Agent) {
            lease.status = Some(LeaseStatus::Active);
        }
        write_atomic_json(&self.path(lease_id), &lease)?;
        Ok(lease)
    }

    /// Checks expiry, cosigner presence, and signature validity (spec
    /// §4.5). A lease with a missing human cosignature past the timeout
    /// is auto-revoked and reported as such.
    pub fn verify_lease(&self, lease_id: &str) -> Result<VerifyResult, calyx_fabric::FabricError> {
        let lease = match self.load(lease_id)? {
            None => return Ok(VerifyResult { usable: false, reason: "not_found".to_string() }),
            Some(l) => l,
        };
        if matches!(lease.status, Some(LeaseStatus::Revoked)) {
            return Ok(VerifyResult { usable: false, reason: "revoked".to_string() });
        }
        let now = calyx_core::time::now_ts();
        if now < lease.issued_at || now > lease.expires_at {
            return Ok(VerifyResult { usable: false, reason: "expired".to_string() });
        }
        if !lease.has_role(CosignerRole::Human) {
            if now - lease.issued_at > self.human_sig_timeout_secs {
                self.expire_lease(lease_id)?;
                return Ok(VerifyResult { usable: false, reason: "missing_human_cosignature_timeout".to_string() });
            }
            return Ok(VerifyResult { usable: false, reason: "missing_human_cosignature".to_string() });
        }
        if !lease.has_role(CosignerRole::Agent) {
            return Ok(VerifyResult { usable: false, reason: "missing_agent_cosignature".to_string() });
        }
        for cosig in &lease.cosigners {
            let expected = self.expected_signature(&lease.lease_id, cosig.role, &cosig.id);
            if expected != cosig.sig {
                return Ok(VerifyResult { usable: false, reason: "signature_mismatch".to_string() });
            }
        }
        Ok(VerifyResult { usable: true, reason: "ok".to_string() })
    }

    /// Marks a lease revoked; it can never be reused afterward.
    pub fn expire_lease(&self, lease_id: &str) -> Result<(), calyx_fabric::FabricError> {
        let mut lease = self
            .load(lease_id)?
            .ok_or_else(|| calyx_fabric::FabricError::Watch(format!("no such lease: {lease_id}")))?;
        lease.status = Some(LeaseStatus::Revoked);
        write_atomic_json(&self.path(lease_id), &lease)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> LeaseLimits {
        LeaseLimits { wallclock_timeout_s: 3600 }
    }

    #[test]
    fn issued_lease_is_not_usable_until_both_roles_cosign() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = LeaseManager::open(dir.path(), "test-key");
        let lease = mgr.issue_lease("intent-1", "bridge", limits()).unwrap();
        assert_eq!(mgr.verify_lease(&lease.lease_id).unwrap().reason, "missing_human_cosignature");

        let sig = mgr.expected_signature(&lease.lease_id, CosignerRole::Agent, "agent1");
        mgr.add_cosignature(&lease.lease_id, CosignerRole::Agent, "agent1", &sig).unwrap();
        assert_eq!(mgr.verify_lease(&lease.lease_id).unwrap().reason, "missing_human_cosignature");

        let sig = mgr.expected_signature(&lease.lease_id, CosignerRole::Human, "operator1");
        mgr.add_cosignature(&lease.lease_id, CosignerRole::Human, "operator1", &sig).unwrap();
        let result = mgr.verify_lease(&lease.lease_id).unwrap();
        assert!(result.usable);
    }

    #[test]
    fn forged_signature_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = LeaseManager::open(dir.path(), "test-key");
        let lease = mgr.issue_lease("intent-1", "bridge", limits()).unwrap();
        mgr.add_cosignature(&lease.lease_id, CosignerRole::Agent, "agent1", "not-the-right-sig").unwrap();
        mgr.add_cosignature(&lease.lease_id, CosignerRole::Human, "operator1", "also-wrong").unwrap();
        let result = mgr.verify_lease(&lease.lease_id).unwrap();
        assert!(!result.usable);
        assert_eq!(result.reason, "signature_mismatch");
    }

    #[test]
    fn duplicate_role_id_replaces_not_appends() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = LeaseManager::open(dir.path(), "test-key");
        let lease = mgr.issue_lease("intent-1", "bridge", limits()).unwrap();
        mgr.add_cosignature(&lease.lease_id, CosignerRole::Agent, "agent1", "sig-a").unwrap();
        let updated = mgr.add_cosignature(&lease.lease_id, CosignerRole::Agent, "agent1", "sig-b").unwrap();
        assert_eq!(updated.cosigners.len(), 1);
        assert_eq!(updated.cosigners[0].sig, "sig-b");
    }

    #[test]
    fn expired_lease_cannot_be_reused() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = LeaseManager::open(dir.path(), "test-key");
        let lease = mgr.issue_lease("intent-1", "bridge", limits()).unwrap();
        mgr.expire_lease(&lease.lease_id).unwrap();
        let result = mgr.verify_lease(&lease.lease_id).unwrap();
        assert!(!result.usable);
        assert_eq!(result.reason, "revoked");
    }
}
