//! Proposals submitted to a workgroup

use crate::errors::{Result, VotyError};
use crate::types::{Permalink, SnapshotSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How voters distribute their choice over the options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotingType {
    /// Exactly one option
    Single,
    /// Any non-empty subset of options
    Multiple,
    /// Weights over options
    Weighted,
}

/// Proposal body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Community the proposal belongs to
    pub community: Permalink,
    /// Workgroup id inside the community
    pub workgroup: String,
    /// Title
    pub title: String,
    /// Choice semantics
    pub voting_type: VotingType,
    /// Options voters choose from
    pub options: Vec<String>,
    /// Heights voting power is evaluated at
    pub snapshots: SnapshotSet,
    /// Free-form content (body, attachments)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<Value>,
}

impl Proposal {
    /// Check structural constraints that the type system does not capture
    pub fn validate(&self) -> Result<()> {
        if self.title.is_empty() || self.workgroup.is_empty() {
            return Err(VotyError::invalid("proposal title and workgroup are required"));
        }
        if self.options.is_empty() || self.options.iter().any(String::is_empty) {
            return Err(VotyError::invalid(
                "proposal needs at least one non-empty option",
            ));
        }
        Ok(())
    }
}
