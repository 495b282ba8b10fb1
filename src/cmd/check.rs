//! A subcommand making sure the config is valid and the store is reachable.
//! Useful before restarting a running server with a changed config.

use crate::{
    args::{Args, Shared},
    config::Config,
    db,
    load_config_and_init_logger,
    prelude::*,
    store::Backend,
};


pub(crate) async fn run(shared: &Shared, args: &Args) -> Result<()> {
    let config = load_config_and_init_logger(shared, args, "check")
        .context("failed to load config: cannot proceed with `check` command")?;

    info!("Starting to verify various things...");
    let server_cert = config.db.check_server_cert();
    let store = check_store(&config).await;
    info!("Done verifying various things");


    // Print summary after all log output
    let mut any_errors = false;
    println!();
    bunt::println!("{$bold+blue+intense}Summary{/$}");
    println!();
    print_outcome(&mut any_errors, "Load configuration", &Ok(()));
    print_outcome(&mut any_errors, "Database server certificate", &server_cert);
    print_outcome(&mut any_errors, "Store backend", &store);

    println!();
    if any_errors {
        bunt::println!("{$red+intense}➡  Errors have occurred!{/$}");
        std::process::exit(1);
    } else {
        bunt::println!("{$green+intense}⮕  Everything OK{/$}");
        Ok(())
    }
}

/// For PostgreSQL, connects and checks that all migrations in the database
/// are known. Nothing is written.
async fn check_store(config: &Config) -> Result<()> {
    if config.store.backend == Backend::Memory {
        debug!("In-memory store configured, nothing to connect to");
        return Ok(());
    }

    let pool = db::create_pool(&config.db).await?;
    let mut conn = pool.get().await?;
    let tx = conn.transaction().await?;
    match db::MigrationPlan::build(&tx).await?.pending_count() {
        0 => debug!("Database schema is up to date"),
        n => info!("{n} migrations will be applied by `serve`"),
    }
    tx.rollback().await?;

    Ok(())
}

fn print_outcome<T>(any_errors: &mut bool, label: &str, result: &Result<T>) {
    match result {
        Ok(_) => {
            bunt::println!(" ▸ {[bold+intense]}  {$green+bold}✔ ok{/$}", label);
        }
        Err(e) => {
            *any_errors = true;
            bunt::println!(" ▸ {[bold+intense]}  {$red+bold}✘ error{/$}", label);
            bunt::println!("      {$red}▶▶▶ {$bold}Error:{/$}{/$} {[yellow+intense]}", e);
            println!();
            if e.chain().len() > 1 {
                bunt::println!("      {$red+italic}Caused by:{/$}");
            }

            for (i, cause) in e.chain().skip(1).enumerate() {
                print!("       {: >1$}", "", i * 2);
                println!("‣ {cause}");
            }
            println!();
        }
    }
}
