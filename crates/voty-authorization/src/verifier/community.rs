//! Community publication

use super::{VerifiedAuthor, Verifier};
use crate::errors::{AuthorizationError, Result};
use voty_core::SignedCommunity;

impl Verifier {
    /// Accept a community signed by the owner of its entry identifier
    ///
    /// Every workgroup's proposing and voting trees are bound against the
    /// registry, so a community naming an unknown function or passing bad
    /// arguments is rejected at publication rather than at first use.
    #[tracing::instrument(skip(self, community), fields(entry = %community.body().entry))]
    pub async fn verify_community(&self, community: &SignedCommunity) -> Result<VerifiedAuthor> {
        let body = community.body();
        body.validate()
            .map_err(|e| AuthorizationError::Malformed {
                message: e.to_string(),
            })?;

        let author = self.verify_authorship(community).await?;
        if author.authorship.author != body.entry {
            tracing::info!(author = %author.authorship.author, "community signed by non-owner");
            return Err(AuthorizationError::AuthorMismatch {
                expected: body.entry.clone(),
                actual: author.authorship.author,
            });
        }

        for workgroup in &body.workgroups {
            self.evaluator
                .compile_policy(&workgroup.permission.proposing)
                .map_err(|e| self.evaluation_failure(e))?;
            self.evaluator
                .compile_weight(&workgroup.permission.voting)
                .map_err(|e| self.evaluation_failure(e))?;
        }

        tracing::debug!(workgroups = body.workgroups.len(), "community accepted");
        Ok(author)
    }
}
