//! Network, proof and freshness stages shared by every document kind

use super::{check_freshness, Verifier};
use crate::errors::{AuthorizationError, Result};
use crate::resolver::ResolvedIdentity;
use serde::Serialize;
use voty_core::crypto::verify_document;
use voty_core::{Authorized, Authorship, Network, Proved, SnapshotSet};

/// Author whose proof and snapshot were accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAuthor {
    /// Authorship record of the document
    pub authorship: Authorship,
    /// Address the author resolved to at the authorship snapshot
    pub identity: ResolvedIdentity,
}

impl Verifier {
    /// Check the network flag, the proof and the snapshot freshness of `document`
    #[tracing::instrument(
        skip(self, document),
        fields(author = %document.authorship().author, coin_type = %document.authorship().coin_type)
    )]
    pub async fn verify_authorship<T>(
        &self,
        document: &Proved<Authorized<T>>,
    ) -> Result<VerifiedAuthor>
    where
        T: Serialize + Sync,
    {
        let authorship = document.authorship();

        let actual = Network::from_testnet(authorship.testnet);
        let expected = self.config.network();
        if actual != expected {
            tracing::info!(?expected, ?actual, "network mismatch");
            return Err(AuthorizationError::NetworkMismatch { expected, actual });
        }

        let signer = verify_document(document).map_err(|e| {
            tracing::info!(error = %e, "proof rejected");
            AuthorizationError::InvalidSignature {
                message: e.to_string(),
            }
        })?;

        let snapshots = SnapshotSet::new().with(authorship.coin_type, authorship.snapshot);
        let identity = self
            .resolvers()
            .resolve(&authorship.author, &snapshots)
            .await?;
        if identity.address != signer {
            tracing::info!(
                signer = %signer,
                bound = %identity.address,
                "signer does not control author"
            );
            return Err(AuthorizationError::InvalidSignature {
                message: format!(
                    "signer {signer} does not control {} (bound to {})",
                    authorship.author, identity.address
                ),
            });
        }

        let current = self.oracle.current_snapshot(authorship.coin_type).await?;
        if let Err(err) = check_freshness(
            authorship.coin_type,
            authorship.snapshot,
            current,
            self.config.snapshot_tolerance,
        ) {
            tracing::info!(claimed = %authorship.snapshot, current = %current, "stale snapshot");
            return Err(err);
        }

        tracing::debug!(address = %identity.address, "authorship accepted");
        Ok(VerifiedAuthor {
            authorship: authorship.clone(),
            identity,
        })
    }
}
