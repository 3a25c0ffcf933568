use sqlx::PgConnection;

/// A handle to an active database connection, borrowed from an [ExternalConnectivity]
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Abstracts clients for systems outside the app's process. Driven adapters accept an
/// ExternalConnectivity rather than concrete clients so business logic stays agnostic
/// of the systems it talks to, and so tests can substitute a fake that never leaves
/// the process.
pub trait ExternalConnectivity: Sync {
    type DbHandle<'cxn_borrow>: ConnectionHandle
    where
        Self: 'cxn_borrow;

    /// Acquires a database connection handle from the underlying pool
    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;
}
