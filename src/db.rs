use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Creates the application's PostgreSQL connection pool. Panics if the database
/// cannot be reached, as the service cannot do anything useful without it.
pub async fn connect_sqlx(db_url: &str) -> PgPool {
    PgPoolOptions::new()
        .max_connections(16)
        .connect(db_url)
        .await
        .expect("Could not connect to the database")
}
