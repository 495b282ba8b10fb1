use std::{ops::Deref, sync::Arc};
use deadpool_postgres::Pool;
use secrecy::ExposeSecret;
use tokio_postgres::{Client, NoTls};

use crate::{prelude::*, config::Config, store::Store};
use super::super::{create_pool, migrate, DbConfig, PgStore};


/// Environment variable pointing to the config file used by the DB tests.
const CONFIG_ENV: &str = "SOCIALGRAPH_TEST_CONFIG";

async fn conn(config: &DbConfig) -> Result<Client> {
    let (client, connection) = tokio_postgres::config::Config::new()
        .user(&config.user)
        .password(config.password.expose_secret())
        .dbname(&config.database)
        .host(&config.host)
        .port(config.port)
        .application_name("socialgraph DB tests")
        .connect(NoTls)
        .await
        .context("could not connect to DB in test")?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            panic!("PG connection error: {e}");
        }
    });

    Ok(client)
}

/// A temporary, fully migrated DB used for a single unit test. Is removed on
/// drop.
///
/// Be sure to use the multi threaded Tokio runtime or else `drop` will hang
/// indefinitely!
pub(super) struct TestDb {
    pool: Option<Pool>,
    controller: Client,
    db_name: String,
}

impl TestDb {
    pub(super) async fn new() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV)
            .with_context(|| format!("'{CONFIG_ENV}' has to point to a config file"))?;
        let config = Config::load_from(path).context("failed to load config")?;

        // Create connection to original database and create a new temporary one.
        let controller = conn(&config.db).await?;
        let db_name = format!("socialgraph_test_{}", rand::random::<u64>());
        controller.execute(&format!("create database {db_name}"), &[]).await
            .context("failed to create temporary test DB")?;

        let pool = create_pool(&DbConfig { database: db_name.clone(), ..config.db }).await?;
        let mut db = pool.get().await?;
        migrate(&mut db).await.context("failed to run migrations on test DB")?;
        drop(db);

        Ok(Self {
            pool: Some(pool),
            controller,
            db_name,
        })
    }

    /// A fresh store handle, like the one an API request gets.
    pub(super) fn store(&self) -> Arc<dyn Store> {
        Arc::new(PgStore::new(self.pool().clone()))
    }

    fn pool(&self) -> &Pool {
        self.pool.as_ref().unwrap()
    }
}

impl Deref for TestDb {
    type Target = Pool;

    fn deref(&self) -> &Self::Target {
        self.pool()
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        // There is no "async drop", so: close the pool, then drop the database
        // within `block_on`. Requires the multi threaded Tokio runtime.
        if let Some(pool) = self.pool.take() {
            pool.close();
        }
        futures::executor::block_on(async move {
            self.controller.execute(&format!("drop database {} with (force)", self.db_name), &[])
                .await
                .expect("failed to drop temporary test DB");
        });
    }
}
