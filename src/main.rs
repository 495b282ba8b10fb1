//! The socialgraph server: a GraphQL API over a store of users, posts and
//! everything around them.

use clap::Parser;
use std::{env, sync::Arc};

use crate::{
    args::{Args, Command},
    config::Config,
    prelude::*,
    store::{memory::MemoryStore, Backend, StoreProvider},
};

mod api;
mod args;
mod cmd;
mod config;
mod db;
mod http;
mod logger;
mod model;
mod prelude;
mod resolver;
mod store;


#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Log error in case stdout is not connected and it is logged into a file.
        error!("{:?}", e);

        // Show a somewhat nice representation of the error
        eprintln!();
        eprintln!();
        bunt::eprintln!("{$red}▶▶▶ {$bold}Error:{/$}{/$} {[yellow+intense]}", e);
        eprintln!();
        if e.chain().len() > 1 {
            bunt::eprintln!("{$red+italic}Caused by:{/$}");
        }

        for (i, cause) in e.chain().skip(1).enumerate() {
            eprint!(" {: >1$}", "", i * 2);
            eprintln!("‣ {cause}");
        }

        std::process::exit(1);
    }
}

/// Main entry point.
async fn run() -> Result<()> {
    // Backtraces are almost always useful for debugging, so we enable them
    // unless the user explicitly configured something.
    if env::var("RUST_BACKTRACE") == Err(env::VarError::NotPresent) {
        env::set_var("RUST_BACKTRACE", "1");
    }

    let args = Args::parse();

    // Configure output via `bunt`
    bunt::set_stdout_color_choice(args.stdout_color());
    bunt::set_stderr_color_choice(args.stderr_color());


    // Dispatch subcommand.
    match &args.cmd {
        Command::Serve { shared } => {
            let config = load_config_and_init_logger(shared, &args, "serve")?;
            start_server(config).await?;
        }
        Command::Db { cmd, shared } => {
            let config = load_config_and_init_logger(shared, &args, "db")?;
            db::cmd::run(cmd, &config).await?;
        }
        Command::Check { shared } => cmd::check::run(shared, &args).await?,
        Command::WriteConfig { target } => config::write_template(target.as_ref())?,
        Command::ExportApiSchema { args } => cmd::export_api_schema::run(args)?,
    }

    Ok(())
}

async fn start_server(config: Config) -> Result<()> {
    info!("Starting socialgraph {} ...", env!("CARGO_PKG_VERSION"));
    trace!("Configuration: {:#?}", config);
    config.lint();

    let store = match config.store.backend {
        Backend::Postgres => StoreProvider::Postgres(connect_and_migrate_db(&config).await?),
        Backend::Memory => StoreProvider::Memory(Arc::new(MemoryStore::new())),
    };

    http::serve(&config.http, config.log.log_http_headers, api::root_node(), store).await
        .context("failed to start HTTP server")?;

    Ok(())
}


fn load_config_and_init_logger(shared: &args::Shared, args: &Args, cmd: &str) -> Result<Config> {
    let (config, path) = Config::load(shared.config.as_deref())?;

    // Initialize logger. Unfortunately, we can only do this here
    // after reading the config.
    logger::init(&config.log, args, cmd)?;
    info!("Loaded config from '{}'", path.display());

    Ok(config)
}

async fn connect_and_migrate_db(config: &Config) -> Result<deadpool_postgres::Pool> {
    let db = db::create_pool(&config.db).await
        .context("failed to create database connection pool (database not running?)")?;
    db::migrate(&mut *db.get().await?).await
        .context("failed to check/run DB migrations")?;
    Ok(db)
}
