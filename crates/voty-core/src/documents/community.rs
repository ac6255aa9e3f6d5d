//! Communities and their workgroups

use crate::errors::{Result, VotyError};
use crate::policy::{PolicyNode, WeightNode};
use crate::types::Did;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minimum length of the announcement and voting phases, in seconds
pub const MIN_PHASE_SECS: u64 = 3600;

/// Community definition, signed by the owner of its entry identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    /// Display name
    pub name: String,
    /// Identifier the community is published under
    pub entry: Did,
    /// Groups that accept proposals
    #[serde(default)]
    pub workgroups: Vec<Workgroup>,
    /// Free-form presentation data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<Value>,
}

impl Community {
    /// Workgroup with the given id
    pub fn workgroup(&self, id: &str) -> Option<&Workgroup> {
        self.workgroups.iter().find(|workgroup| workgroup.id == id)
    }

    /// Check structural constraints that the type system does not capture
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(VotyError::invalid("community name is required"));
        }
        for (index, workgroup) in self.workgroups.iter().enumerate() {
            if self.workgroups[..index]
                .iter()
                .any(|other| other.id == workgroup.id)
            {
                return Err(VotyError::invalid(format!(
                    "duplicate workgroup id: {}",
                    workgroup.id
                )));
            }
            workgroup.validate()?;
        }
        Ok(())
    }
}

/// Group of members sharing proposing and voting rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workgroup {
    /// Identifier, unique within the community
    pub id: String,
    /// Display name
    pub name: String,
    /// Phase lengths of proposals in this workgroup
    pub duration: Duration,
    /// Who may propose and how much each voter weighs
    pub permission: Permission,
    /// Free-form presentation data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<Value>,
}

impl Workgroup {
    fn validate(&self) -> Result<()> {
        if self.id.is_empty() || self.name.is_empty() {
            return Err(VotyError::invalid("workgroup id and name are required"));
        }
        if self.duration.announcement < MIN_PHASE_SECS || self.duration.voting < MIN_PHASE_SECS {
            return Err(VotyError::invalid(format!(
                "workgroup {} phases must last at least {MIN_PHASE_SECS}s",
                self.id
            )));
        }
        Ok(())
    }
}

/// Proposal phase lengths in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duration {
    /// Time between publication and the start of voting
    pub announcement: u64,
    /// Length of the voting phase
    pub voting: u64,
}

/// Permission trees of a workgroup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    /// Who may create proposals
    pub proposing: PolicyNode,
    /// Voting power of each identity
    pub voting: WeightNode,
}
