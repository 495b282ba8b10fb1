//! Schema migrations. The scripts are compiled into the binary and every
//! applied one is recorded in `__db_migrations` together with its script.

use deadpool_postgres::Transaction;
use std::time::Duration;
use tokio_postgres::{IsolationLevel, error::SqlState};

use crate::prelude::*;
use super::{Db, query, util::{collect_rows, dbargs}};


/// A migration known to this binary.
#[derive(Debug)]
pub(crate) struct Migration {
    id: i64,
    name: &'static str,
    script: &'static str,
}

/// All migrations, ordered by id. Ids start at 1 and have no gaps.
static MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        name: "social",
        script: include_str!("migrations/01-social.sql"),
    },
];

/// How often committing the migration transaction is attempted.
const COMMIT_ATTEMPTS: u32 = 5;

/// A row of `__db_migrations`.
#[derive(Debug)]
struct Applied {
    id: i64,
    name: String,
    script: String,
}

/// What has to happen to bring the database schema up to date.
#[derive(Debug)]
pub(crate) enum MigrationPlan {
    /// Nothing exists yet: create `__db_migrations` and run every migration.
    EmptyDb,
    UpToDate,
    /// These migrations are missing, in the order they have to run.
    Pending(&'static [Migration]),
}

impl MigrationPlan {
    /// Inspects the database inside `tx` without modifying it.
    pub(crate) async fn build(tx: &Transaction<'_>) -> Result<Self> {
        if !query::does_table_exist(&**tx, "__db_migrations").await? {
            let tables = query::all_table_names(&**tx).await?;
            if !tables.is_empty() {
                bail!(
                    "the database contains tables ({}) but no '__db_migrations', \
                        so it was not set up by socialgraph. Refusing to touch it.",
                    tables.join(", "),
                );
            }
            return Ok(Self::EmptyDb);
        }

        let rows = tx
            .query_raw("select id, name, script from __db_migrations order by id", dbargs![])
            .await
            .context("failed to read '__db_migrations'")?;
        let applied = collect_rows(rows, |row| Applied {
            id: row.get(0),
            name: row.get(1),
            script: row.get(2),
        }).await?;

        Self::compare(&applied, MIGRATIONS)
    }

    /// Checks that `applied` is a prefix of `known` and returns the rest.
    fn compare(applied: &[Applied], known: &'static [Migration]) -> Result<Self> {
        if applied.len() > known.len() {
            let unknown = &applied[known.len()];
            bail!(
                "migration {}-{} is applied in the database, but unknown to this \
                    binary. Is an older socialgraph version running against a newer database?",
                unknown.id,
                unknown.name,
            );
        }

        for (row, migration) in applied.iter().zip(known) {
            if row.id != migration.id || row.script != migration.script {
                debug!("Script of {}-{} in the database:\n{}", row.id, row.name, row.script);
                bail!(
                    "applied migration {}-{} differs from migration {}-{} of this binary",
                    row.id,
                    row.name,
                    migration.id,
                    migration.name,
                );
            }
        }

        match &known[applied.len()..] {
            [] => Ok(Self::UpToDate),
            pending => Ok(Self::Pending(pending)),
        }
    }

    /// Number of migrations that `execute` will run.
    pub(crate) fn pending_count(&self) -> usize {
        match self {
            Self::EmptyDb => MIGRATIONS.len(),
            Self::UpToDate => 0,
            Self::Pending(pending) => pending.len(),
        }
    }

    pub(crate) async fn execute(&self, tx: &Transaction<'_>) -> Result<()> {
        let pending = match self {
            Self::UpToDate => {
                info!("Database schema is up to date");
                return Ok(());
            }
            Self::EmptyDb => {
                info!("Database is empty, creating '__db_migrations'");
                tx.batch_execute(include_str!("db-migrations.sql"))
                    .await
                    .context("failed to create '__db_migrations'")?;
                MIGRATIONS
            }
            Self::Pending(pending) => *pending,
        };

        for migration in pending {
            info!("Applying migration {}-{}", migration.id, migration.name);
            trace!("Executing:\n{}", migration.script);

            tx.batch_execute(migration.script)
                .await
                .with_context(|| format!("migration {}-{} failed", migration.id, migration.name))?;
            tx.execute(
                "insert into __db_migrations (id, name, applied_on, script) \
                    values ($1, $2, now(), $3)",
                &[&migration.id, &migration.name, &migration.script],
            ).await.context("failed to record migration in '__db_migrations'")?;
        }

        Ok(())
    }
}


/// Brings the schema up to date in one serializable transaction. If another
/// instance migrates at the same time, the commit fails with a serialization
/// error and the whole plan is built again.
pub(crate) async fn migrate(db: &mut Db) -> Result<()> {
    let mut attempt = 1;
    loop {
        let tx = db.build_transaction()
            .isolation_level(IsolationLevel::Serializable)
            .start()
            .await?;
        MigrationPlan::build(&tx).await?.execute(&tx).await?;

        match tx.commit().await {
            Ok(()) => return Ok(()),
            Err(e) if e.code() == Some(&SqlState::T_R_SERIALIZATION_FAILURE)
                && attempt < COMMIT_ATTEMPTS =>
            {
                let backoff = Duration::from_millis(250 * u64::from(attempt));
                warn!("Migration commit conflicted with another instance, retrying in {backoff:?}");
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e).context("failed to commit migrations"),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::{Applied, Migration, MigrationPlan, MIGRATIONS};

    static KNOWN: &[Migration] = &[
        Migration { id: 1, name: "users", script: "create table users ();" },
        Migration { id: 2, name: "posts", script: "create table posts ();" },
    ];

    fn applied(id: i64, name: &str, script: &str) -> Applied {
        Applied { id, name: name.into(), script: script.into() }
    }

    #[test]
    fn embedded_ids_are_consecutive() {
        assert!(MIGRATIONS.iter().map(|m| m.id).eq(1..=MIGRATIONS.len() as i64));
        assert!(MIGRATIONS[0].script.contains("create table users"));
    }

    #[test]
    fn missing_migrations_are_pending() {
        let plan = MigrationPlan::compare(&[], KNOWN).unwrap();
        assert_eq!(plan.pending_count(), 2);

        let plan = MigrationPlan::compare(&[applied(1, "users", KNOWN[0].script)], KNOWN).unwrap();
        assert!(matches!(plan, MigrationPlan::Pending([m]) if m.name == "posts"));
    }

    #[test]
    fn fully_applied_is_up_to_date() {
        let rows = [applied(1, "users", KNOWN[0].script), applied(2, "posts", KNOWN[1].script)];
        let plan = MigrationPlan::compare(&rows, KNOWN).unwrap();
        assert!(matches!(plan, MigrationPlan::UpToDate));
        assert_eq!(plan.pending_count(), 0);
    }

    #[test]
    fn changed_or_unknown_migrations_are_rejected() {
        let edited = [applied(1, "users", "create table people ();")];
        assert!(MigrationPlan::compare(&edited, KNOWN).is_err());

        let newer = [
            applied(1, "users", KNOWN[0].script),
            applied(2, "posts", KNOWN[1].script),
            applied(3, "likes", "create table likes ();"),
        ];
        assert!(MigrationPlan::compare(&newer, KNOWN).is_err());
    }
}
