use crate::{app_env, db};
use dotenv::dotenv;
use lazy_static::lazy_static;
use rand::{Rng, thread_rng};
use sqlx::{Connection, PgConnection, PgPool, Row};
use std::{env, future::Future};
use tokio::runtime::Runtime;

lazy_static! {
    static ref TOKIO_RT: Runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Tokio runtime failed to initialize");
}

struct TestDatabase {
    db_name: String,
}

impl TestDatabase {
    /// Provisions a uniquely named throwaway database on the test server
    async fn create(conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        let mut rng = thread_rng();
        let schema_id: u32 = rng.gen_range(10_000..99_999);
        let db_name = format!("test_db_{}", schema_id);

        sqlx::query(format!("CREATE DATABASE {}", db_name).as_str())
            .execute(&mut *conn)
            .await?;

        Ok(Self { db_name })
    }

    /// Drops leftover databases from earlier test runs that died before cleanup
    async fn clear_old_dbs(&self, conn: &mut PgConnection) {
        let test_dbs = sqlx::query(
            "SELECT datname FROM pg_catalog.pg_database WHERE datname LIKE 'test_db%' AND datname <> $1",
        )
        .bind(self.db_name.as_str())
        .fetch_all(&mut *conn)
        .await;
        let test_dbs = match test_dbs {
            Ok(results) => results.into_iter().map(|row| row.get::<String, _>(0)),
            Err(error) => {
                println!(
                    "Warning: failed to look up old test databases. You may need to delete them manually. Error: {error}"
                );
                return;
            }
        };

        for old_db in test_dbs {
            let result = sqlx::query(format!("DROP DATABASE {}", old_db).as_str())
                .execute(&mut *conn)
                .await;
            if result.is_err() {
                println!(
                    "Warning: failed to drop old test database {}, you may need to do it manually.",
                    old_db
                );
            }
        }
    }

    fn db_name(&self) -> &str {
        self.db_name.as_str()
    }
}

/// Creates a fresh database for a test, applies the app's migrations to it, and hands the
/// test a pool connected to it.
///
/// Expects that the TEST_DB_URL environment variable holds the base postgres connection
/// string, without a database name in the path.
pub fn prepare_db_and_test<F, R>(test_fn: F)
where
    R: Future<Output = ()>,
    F: FnOnce(PgPool) -> R,
{
    if dotenv().is_err() {
        println!("Test is running without .env file.");
    }

    TOKIO_RT.block_on(async move {
        let pg_connection_base_url = env::var(app_env::test::TEST_DB_URL).expect(
            "You must provide the TEST_DB_URL environment variable as the base postgres connection string",
        );
        let test_db = {
            let mut initial_conn =
                PgConnection::connect(format!("{}/postgres", pg_connection_base_url).as_str())
                    .await
                    .expect("Test failure - could not create initial connection to provision database.");
            let test_db = match TestDatabase::create(&mut initial_conn).await {
                Ok(tdb) => tdb,
                Err(db_err) => panic!("Failed to start test database: {}", db_err),
            };
            test_db.clear_old_dbs(&mut initial_conn).await;
            let _ = initial_conn.close().await;

            test_db
        };

        let sqlx_pool = db::connect_sqlx(
            format!("{}/{}", pg_connection_base_url, test_db.db_name()).as_str(),
        )
        .await;
        sqlx::migrate!("./migrations")
            .run(&sqlx_pool)
            .await
            .expect("Failed to apply migrations to the test database");

        test_fn(sqlx_pool.clone()).await;
    });
}

/// Inserts a user and a session token for them, returning the new user's ID
pub async fn seed_user_with_session(db: &PgPool, display_name: &str, token: &str) -> i32 {
    let user_id: i32 =
        sqlx::query_scalar("INSERT INTO app_user (display_name) VALUES ($1) RETURNING id")
            .bind(display_name)
            .fetch_one(db)
            .await
            .expect("Failed to seed a user");

    sqlx::query("INSERT INTO user_session (token, user_id) VALUES ($1, $2)")
        .bind(token)
        .bind(user_id)
        .execute(db)
        .await
        .expect("Failed to seed a session");

    user_id
}
