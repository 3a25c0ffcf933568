use crate::domain::auth::driven_ports::ResolveCredential;
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use sqlx::query_as;

/// Resolves bearer tokens against the session table maintained by the external
/// login service
pub struct DbCredentialResolver;

#[derive(sqlx::FromRow)]
struct SessionRow {
    user_id: i32,
}

impl ResolveCredential for DbCredentialResolver {
    async fn user_for_credential(
        &self,
        credential: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<i32>, Error> {
        let mut cxn = ext_cxn
            .database_cxn()
            .await
            .context("acquiring a connection to resolve a credential")?;

        let session: Option<SessionRow> =
            query_as("SELECT user_id FROM user_session WHERE token = $1")
                .bind(credential)
                .fetch_optional(cxn.borrow_connection())
                .await
                .context("trying to resolve a session token")?;

        Ok(session.map(|row| row.user_id))
    }
}
