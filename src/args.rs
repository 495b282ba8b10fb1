//! This module defines the command line arguments socialgraph accepts.

use std::path::PathBuf;
use termcolor::ColorChoice;

use crate::{cmd, db::cmd::DbCommand};


#[derive(Debug, clap::Parser)]
#[clap(about = "GraphQL API for a small social network.", version)]
pub(crate) struct Args {
    #[clap(subcommand)]
    pub(crate) cmd: Command,

    /// Whether to use colors in the output: "auto", "always" or "never".
    #[clap(long, global = true, default_value = "auto", value_parser = parse_color_choice)]
    pub(crate) color: ColorChoice,
}

#[derive(Debug, clap::Subcommand)]
pub(crate) enum Command {
    /// Starts the HTTP server serving the GraphQL API.
    Serve {
        #[clap(flatten)]
        shared: Shared,
    },

    /// Database operations.
    Db {
        #[clap(subcommand)]
        cmd: DbCommand,

        #[clap(flatten)]
        shared: Shared,
    },

    /// Checks the config and the connection to the store.
    ///
    /// Exits with 0 if everything is Ok, and with 1 otherwise.
    Check {
        #[clap(flatten)]
        shared: Shared,
    },

    /// Outputs a template for the configuration file (which includes
    /// descriptions of all options).
    WriteConfig {
        /// Target file. If not specified, the template is written to stdout.
        target: Option<PathBuf>,
    },

    /// Exports the API as GraphQL schema.
    ExportApiSchema {
        #[clap(flatten)]
        args: cmd::export_api_schema::Args,
    },
}

#[derive(Debug, clap::Args)]
pub(crate) struct Shared {
    /// Path to the configuration file. If this is not specified, socialgraph
    /// checks `SOCIALGRAPH_CONFIG_PATH`, then tries opening `config.toml` and
    /// `/etc/socialgraph/config.toml`.
    #[clap(short, long)]
    pub(crate) config: Option<PathBuf>,
}

impl Args {
    pub(crate) fn stdout_color(&self) -> ColorChoice {
        resolve_auto(self.color, std::io::IsTerminal::is_terminal(&std::io::stdout()))
    }

    pub(crate) fn stderr_color(&self) -> ColorChoice {
        resolve_auto(self.color, std::io::IsTerminal::is_terminal(&std::io::stderr()))
    }
}

fn resolve_auto(choice: ColorChoice, is_terminal: bool) -> ColorChoice {
    match choice {
        ColorChoice::Auto if is_terminal => ColorChoice::Auto,
        ColorChoice::Auto => ColorChoice::Never,
        other => other,
    }
}

fn parse_color_choice(s: &str) -> Result<ColorChoice, String> {
    match s {
        "auto" => Ok(ColorChoice::Auto),
        "always" => Ok(ColorChoice::Always),
        "never" => Ok(ColorChoice::Never),
        other => Err(format!("invalid color choice '{other}', expected auto, always or never")),
    }
}


#[cfg(test)]
mod tests {
    use clap::Parser;
    use termcolor::ColorChoice;

    use super::{Args, Command};

    #[test]
    fn parses_db_subcommand_with_config() {
        let args = Args::try_parse_from([
            "socialgraph", "db", "--config", "dev.toml", "script", "seed.sql",
        ]).unwrap();
        assert_eq!(args.color, ColorChoice::Auto);
        match args.cmd {
            Command::Db { shared, .. } => {
                assert_eq!(shared.config.unwrap().to_str(), Some("dev.toml"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn color_flag_is_global() {
        let args = Args::try_parse_from(["socialgraph", "check", "--color", "never"]).unwrap();
        assert_eq!(args.color, ColorChoice::Never);
        assert_eq!(args.stdout_color(), ColorChoice::Never);

        assert!(Args::try_parse_from(["socialgraph", "check", "--color", "rainbow"]).is_err());
    }
}
