use std::{
    convert::Infallible,
    io,
    os::unix::process::CommandExt,
    path::{Path, PathBuf},
    process::Command,
};
use secrecy::ExposeSecret;
use tokio_postgres::IsolationLevel;

use crate::{prelude::*, config::Config};
use super::{Db, DbConfig, TlsMode, create_pool, query};


#[derive(Debug, clap::Subcommand)]
pub(crate) enum DbCommand {
    /// Drops all socialgraph tables and types, including the migration
    /// bookkeeping. Other tables in the database are left alone.
    Clear,

    /// Runs an `.sql` script with the configured database connection.
    Script {
        /// Path to a file containing an SQL script.
        script: PathBuf,
    },

    /// Applies missing migrations. `serve` does this on startup as well.
    Migrate,

    /// Starts `psql` connected to the configured database. `psql` has to be
    /// in your `PATH`.
    Console,

    /// `db clear` followed by `db migrate`.
    Reset,
}

/// Tables created by our migrations, dependents first.
const OWNED_TABLES: &[&str] = &[
    "post_categories",
    "post_tags",
    "likes",
    "comments",
    "notifications",
    "messages",
    "profiles",
    "posts",
    "tags",
    "categories",
    "users",
    "__db_migrations",
];

/// Types created by our migrations.
const OWNED_TYPES: &[&str] = &["post_status"];


pub(crate) async fn run(cmd: &DbCommand, config: &Config) -> Result<()> {
    match cmd {
        DbCommand::Console => match console(&config.db)? {},
        DbCommand::Script { script } => run_script(&*connect(&config.db).await?, script).await,
        DbCommand::Migrate => super::migrate(&mut *connect(&config.db).await?).await,
        DbCommand::Clear => clear(&mut *connect(&config.db).await?, config).await,
        DbCommand::Reset => {
            let mut db = connect(&config.db).await?;
            clear(&mut db, config).await?;
            super::migrate(&mut db).await
        }
    }
}

async fn connect(config: &DbConfig) -> Result<deadpool_postgres::Object> {
    let pool = create_pool(config).await?;
    pool.get().await.context("failed to get DB connection")
}

/// Drops every table in `OWNED_TABLES` that exists, after showing their row
/// counts and asking for confirmation.
async fn clear(db: &mut Db, config: &Config) -> Result<()> {
    let tx = db.build_transaction()
        .isolation_level(IsolationLevel::Serializable)
        .start()
        .await?;

    let existing = query::all_table_names(&*tx).await?;
    let owned = OWNED_TABLES.iter()
        .copied()
        .filter(|t| existing.iter().any(|e| e == t))
        .collect::<Vec<_>>();
    if owned.is_empty() {
        info!("No socialgraph tables in database '{}', nothing to clear", config.db.database);
        return Ok(());
    }

    println!();
    if let Ok(Ok(hostname)) = hostname::get().map(|n| n.into_string()) {
        println!("Running on: {hostname}");
    }
    println!("Database: '{}' on {}:{}", config.db.database, config.db.host, config.db.port);
    println!();
    println!("These tables will be dropped:");
    for table in &owned {
        let rows = tx.query_one(&format!("select count(*) from {table}"), &[])
            .await?
            .get::<_, i64>(0);
        println!("  - {table} ({rows} rows)");
    }
    let foreign = existing.iter()
        .filter(|t| !OWNED_TABLES.contains(&t.as_str()))
        .count();
    if foreign > 0 {
        println!("{foreign} other tables are not touched.");
    }

    println!();
    println!("All users, posts, messages and everything else will be gone. \
        Type 'yes' to continue.");
    crate::cmd::prompt_for_yes()?;

    tx.batch_execute(&format!(
        "drop table {} cascade; drop type if exists {} cascade;",
        owned.join(", "),
        OWNED_TYPES.join(", "),
    )).await.context("failed to drop tables")?;
    tx.commit().await.context("failed to commit clear transaction")?;

    info!("Dropped {} tables", owned.len());
    Ok(())
}

async fn run_script(db: &Db, script_path: &Path) -> Result<()> {
    let script = tokio::fs::read_to_string(script_path)
        .await
        .with_context(|| format!("failed to read '{}'", script_path.display()))?;

    db.batch_execute(&script).await.context("script failed")?;
    info!("Ran SQL script '{}'", script_path.display());

    Ok(())
}

/// Replaces this process with `psql`. Connection settings are passed via the
/// `PG*` environment variables, so the password never shows up in `ps`.
fn console(config: &DbConfig) -> Result<Infallible> {
    let ssl_mode = match config.tls_mode {
        TlsMode::On => "require",
        TlsMode::Off => "disable",
    };
    let error = Command::new("psql")
        .env("PGHOST", &config.host)
        .env("PGPORT", config.port.to_string())
        .env("PGUSER", &config.user)
        .env("PGPASSWORD", config.password.expose_secret())
        .env("PGDATABASE", &config.database)
        .env("PGSSLMODE", ssl_mode)
        .exec();

    let context = match error.kind() {
        io::ErrorKind::NotFound => "`psql` not found in `PATH`",
        io::ErrorKind::PermissionDenied => "no permission to run `psql`",
        _ => "failed to start `psql`",
    };
    Err(error).context(context)
}
