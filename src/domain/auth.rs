use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use thiserror::Error;

/// Failure modes for resolving a request credential to a user identity
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("the provided credential does not belong to any user")]
    InvalidCredential,
    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}


pub mod driven_ports {
    use super::*;

    /// Looks up the user a request credential belongs to. The credential's provenance
    /// (session tokens, signed tickets, ...) is an adapter concern.
    pub trait ResolveCredential {
        async fn user_for_credential(
            &self,
            credential: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<i32>, anyhow::Error>;
    }
}

/// Resolves a request credential to the ID of the user it authenticates. Fails with
/// [AuthError::InvalidCredential] when no user owns the credential, so callers reject
/// the request before any task data is touched.
pub async fn authenticate(
    credential: &str,
    ext_cxn: &mut impl ExternalConnectivity,
    cred_resolve: &impl driven_ports::ResolveCredential,
) -> Result<i32, AuthError> {
    let resolved_user = cred_resolve
        .user_for_credential(credential, &mut *ext_cxn)
        .await
        .context("resolving a request credential")?;

    resolved_user.ok_or(AuthError::InvalidCredential)
}
