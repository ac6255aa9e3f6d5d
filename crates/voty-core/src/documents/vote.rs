//! Votes cast on proposals

use super::proposal::VotingType;
use crate::errors::{Result, VotyError};
use crate::types::Permalink;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Option selection of a vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Choice {
    /// Index of the single chosen option
    Single(usize),
    /// Indices of all chosen options
    Multiple(Vec<usize>),
    /// Option index (as decimal string) to relative weight
    Weighted(BTreeMap<String, f64>),
}

impl Choice {
    /// Check the choice against the proposal's voting type and option count
    pub fn validate(&self, voting_type: VotingType, option_count: usize) -> Result<()> {
        let in_range = |index: usize| {
            if index < option_count {
                Ok(())
            } else {
                Err(VotyError::invalid(format!(
                    "option {index} out of range (proposal has {option_count})"
                )))
            }
        };

        match (voting_type, self) {
            (VotingType::Single, Choice::Single(index)) => in_range(*index),
            (VotingType::Multiple, Choice::Multiple(indices)) => {
                if indices.is_empty() {
                    return Err(VotyError::invalid("no option chosen"));
                }
                let unique: BTreeSet<_> = indices.iter().collect();
                if unique.len() != indices.len() {
                    return Err(VotyError::invalid("option chosen more than once"));
                }
                indices.iter().try_for_each(|index| in_range(*index))
            }
            (VotingType::Weighted, Choice::Weighted(weights)) => {
                let mut total = 0.0;
                for (key, weight) in weights {
                    let index: usize = key
                        .parse()
                        .map_err(|_| VotyError::invalid(format!("invalid option index: {key:?}")))?;
                    in_range(index)?;
                    if !weight.is_finite() || *weight < 0.0 {
                        return Err(VotyError::invalid(format!(
                            "invalid weight {weight} for option {index}"
                        )));
                    }
                    total += weight;
                }
                if total > 0.0 {
                    Ok(())
                } else {
                    Err(VotyError::invalid("weights must not all be zero"))
                }
            }
            (voting_type, _) => Err(VotyError::invalid(format!(
                "choice does not match {voting_type:?} voting"
            ))),
        }
    }
}

/// Vote body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    /// Proposal the vote is cast on
    pub proposal: Permalink,
    /// Selected options
    pub choice: Choice,
    /// Voting power claimed by the voter
    pub power: f64,
}
