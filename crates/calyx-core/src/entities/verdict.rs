//! Verdict (spec §3) — emitted by Triage reviewers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictResult {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub intent_id: String,
    pub reviewer_id: String,
    pub verdict: VerdictResult,
    #[serde(default)]
    pub findings: Vec<String>,
    #[serde(default)]
    pub details: BTreeMap<String, serde_json::Value>,
    /// Hex digest over plan+audit+diff+version (spec §3, §4.8).
    pub signature: String,
}

impl Verdict {
    pub fn fail(intent_id: impl Into<String>, reviewer_id: impl Into<String>, reason: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            intent_id: intent_id.into(),
            reviewer_id: reviewer_id.into(),
            verdict: VerdictResult::Fail,
            findings: vec![reason.into()],
            details: BTreeMap::new(),
            signature: signature.into(),
        }
    }

    pub fn pass(intent_id: impl Into<String>, reviewer_id: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            intent_id: intent_id.into(),
            reviewer_id: reviewer_id.into(),
            verdict: VerdictResult::Pass,
            findings: Vec::new(),
            details: BTreeMap::new(),
            signature: signature.into(),
        }
    }
}
