//! Proposal submission

use super::{VerifiedAuthor, Verifier};
use crate::errors::{Action, AuthorizationError, EvaluationError, Result};
use voty_core::crypto::verify_document;
use voty_core::{
    CoinType, DataType, Permalink, SignedCommunity, SignedProposal, SnapshotSet, StorageError,
    Timestamp, Workgroup,
};

/// Proposal accepted for its workgroup
#[derive(Debug, Clone)]
pub struct VerifiedProposal {
    /// Proposer
    pub author: VerifiedAuthor,
    /// Community the proposal was filed in
    pub community: SignedCommunity,
    /// Workgroup whose proposing permission was satisfied
    pub workgroup: Workgroup,
    /// Block time at which the community was anchored
    pub community_timestamp: Timestamp,
    /// Snapshots the permission was evaluated at and votes will be weighed at
    pub snapshots: SnapshotSet,
}

impl Verifier {
    /// Accept a proposal whose author may propose in the named workgroup
    ///
    /// The proposal's snapshot set must already pin every chain the
    /// workgroup's trees and the proposer's resolver read; nothing is
    /// filled in with live heights.
    #[tracing::instrument(
        skip(self, proposal),
        fields(author = %proposal.authorship().author, workgroup = %proposal.body().workgroup)
    )]
    pub async fn verify_proposal(&self, proposal: &SignedProposal) -> Result<VerifiedProposal> {
        let body = proposal.body();
        body.validate()
            .map_err(|e| AuthorizationError::Malformed {
                message: e.to_string(),
            })?;

        let author = self.verify_authorship(proposal).await?;

        let (community, community_timestamp) = futures::try_join!(
            self.load_community(&body.community),
            self.anchoring_timestamp(&body.community),
        )?;

        let workgroup = community
            .body()
            .workgroup(&body.workgroup)
            .cloned()
            .ok_or_else(|| AuthorizationError::NotFound {
                what: format!("workgroup {} in {}", body.workgroup, body.community),
            })?;

        let proposer = &author.authorship.author;
        let proposing = self
            .evaluator
            .compile_policy(&workgroup.permission.proposing)
            .map_err(|e| self.evaluation_failure(e))?;
        let voting = self
            .evaluator
            .compile_weight(&workgroup.permission.voting)
            .map_err(|e| self.evaluation_failure(e))?;

        // Both trees and the proposer's resolver are evaluated at these heights only.
        let mut required = self
            .evaluator
            .policy_reads(&proposing, proposer)
            .map_err(|e| self.evaluation_failure(e))?;
        required.extend(voting.required_coin_types());
        required.extend(self.resolvers().required_coin_types(proposer)?);
        if let Some(coin_type) = body.snapshots.missing(&required).into_iter().next() {
            tracing::info!(%coin_type, "proposal does not pin a required chain");
            return Err(EvaluationError::MissingSnapshot { coin_type }.into());
        }

        self.require_permission(Action::Propose, &proposing, proposer, &body.snapshots).await?;
        let snapshots = body.snapshots.clone();

        tracing::debug!(community_timestamp = community_timestamp.secs(), "proposal accepted");
        Ok(VerifiedProposal {
            author,
            community,
            workgroup,
            community_timestamp,
            snapshots,
        })
    }

    /// Load an anchored community and re-check its proof
    pub(super) async fn load_community(&self, permalink: &Permalink) -> Result<SignedCommunity> {
        let community: SignedCommunity = self.load_document(DataType::Community, permalink).await?;
        verify_document(&community).map_err(|e| AuthorizationError::Malformed {
            message: format!("community {permalink} carries an invalid proof: {e}"),
        })?;
        Ok(community)
    }

    /// Block time of the storage-chain height that anchored `permalink`
    async fn anchoring_timestamp(&self, permalink: &Permalink) -> Result<Timestamp> {
        let not_found = || AuthorizationError::NotFound {
            what: format!("anchoring of {permalink}"),
        };
        let snapshot = match self.oracle.snapshot_of_stored_document(permalink).await {
            Ok(snapshot) => snapshot.ok_or_else(not_found)?,
            Err(StorageError::NotFound { .. }) => return Err(not_found()),
            Err(err) => return Err(err.into()),
        };
        Ok(self.oracle.snapshot_timestamp(CoinType::AR, snapshot).await?)
    }
}
