//! Vote casting

use super::{check_voting_window, VerifiedAuthor, Verifier};
use crate::errors::{Action, AuthorizationError, EvaluationError, Result};
use std::collections::BTreeSet;
use voty_core::{DataType, SignedProposal, SignedVote};

/// Relative tolerance when comparing claimed and computed voting power
pub const POWER_TOLERANCE: f64 = 1e-9;

/// Vote accepted with its computed power
#[derive(Debug, Clone)]
pub struct VerifiedVote {
    /// Voter
    pub author: VerifiedAuthor,
    /// Proposal the vote was cast on
    pub proposal: SignedProposal,
    /// Voting power computed at the proposal's snapshots
    pub power: f64,
}

fn powers_match(claimed: f64, computed: f64) -> bool {
    (claimed - computed).abs() <= POWER_TOLERANCE * computed.abs().max(1.0)
}

impl Verifier {
    /// Accept a vote cast during the voting phase with the correct power
    #[tracing::instrument(
        skip(self, vote),
        fields(author = %vote.authorship().author, proposal = %vote.body().proposal)
    )]
    pub async fn verify_vote(&self, vote: &SignedVote) -> Result<VerifiedVote> {
        let body = vote.body();
        let author = self.verify_authorship(vote).await?;

        let proposal: SignedProposal = self
            .load_document(DataType::Proposal, &body.proposal)
            .await?;
        let proposal_body = proposal.body();
        let community = self.load_community(&proposal_body.community).await?;
        let workgroup = community
            .body()
            .workgroup(&proposal_body.workgroup)
            .ok_or_else(|| AuthorizationError::NotFound {
                what: format!(
                    "workgroup {} in {}",
                    proposal_body.workgroup, proposal_body.community
                ),
            })?;

        body.choice
            .validate(proposal_body.voting_type, proposal_body.options.len())
            .map_err(|e| AuthorizationError::InvalidChoice {
                message: e.to_string(),
            })?;

        let proposal_authorship = proposal.authorship();
        let (proposal_time, vote_time) = futures::try_join!(
            self.oracle
                .snapshot_timestamp(proposal_authorship.coin_type, proposal_authorship.snapshot),
            self.oracle
                .snapshot_timestamp(author.authorship.coin_type, author.authorship.snapshot),
        )?;
        if let Err(err) = check_voting_window(proposal_time, &workgroup.duration, vote_time) {
            tracing::info!(error = %err, "vote outside voting phase");
            return Err(err);
        }

        let weight = self
            .evaluator
            .compile_weight(&workgroup.permission.voting)
            .map_err(|e| self.evaluation_failure(e))?;
        // Only the voter's own resolver chains may be filled in; the tree is weighed at the
        // proposal's heights.
        if let Some(coin_type) = proposal_body
            .snapshots
            .missing(&weight.required_coin_types())
            .into_iter()
            .next()
        {
            return Err(self.evaluation_failure(EvaluationError::MissingSnapshot { coin_type }));
        }
        let snapshots = self
            .prefetch(&proposal_body.snapshots, BTreeSet::new(), &author.authorship.author)
            .await?;
        let power = self
            .evaluator
            .weigh(&weight, &author.authorship.author, &snapshots)
            .await
            .map_err(|e| self.evaluation_failure(e))?;

        if power <= 0.0 {
            tracing::info!("voter has no voting power");
            return Err(AuthorizationError::PolicyDenied {
                action: Action::Vote,
                author: author.authorship.author.clone(),
            });
        }
        if !powers_match(body.power, power) {
            tracing::info!(claimed = body.power, computed = power, "voting power mismatch");
            return Err(AuthorizationError::PowerMismatch {
                claimed: body.power,
                computed: power,
            });
        }

        tracing::debug!(power, "vote accepted");
        Ok(VerifiedVote {
            author,
            proposal,
            power,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_comparison() {
        assert!(powers_match(10.0, 10.0));
        assert!(powers_match(0.1 + 0.2, 0.3));
        assert!(!powers_match(10.0, 10.5));
        assert!(!powers_match(1.0, 0.0));
    }
}
