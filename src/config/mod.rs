use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use confique::Config as _;

use crate::{prelude::*, store::Backend};


/// The locations where socialgraph looks for a configuration file. The first
/// existing file in this list is used.
const DEFAULT_PATHS: &[&str] = &["config.toml", "/etc/socialgraph/config.toml"];

const CONFIG_PATH_ENV: &str = "SOCIALGRAPH_CONFIG_PATH";

/// Configuration for socialgraph.
///
/// All relative paths are relative to the location of this configuration file.
#[derive(Debug, confique::Config)]
pub(crate) struct Config {
    #[config(nested)]
    pub(crate) store: crate::store::StoreConfig,

    #[config(nested)]
    pub(crate) db: crate::db::DbConfig,

    #[config(nested)]
    pub(crate) http: crate::http::HttpConfig,

    #[config(nested)]
    pub(crate) log: crate::logger::LogConfig,
}

impl Config {
    /// Loads the config from `explicit` if given. Otherwise checks
    /// `SOCIALGRAPH_CONFIG_PATH` and then the list of default locations. Returns
    /// the loaded config and the path that it was loaded from.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<(Self, PathBuf)> {
        let path = if let Some(path) = explicit {
            path.to_owned()
        } else if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            PathBuf::from(path)
        } else {
            DEFAULT_PATHS.iter()
                .map(PathBuf::from)
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!(
                    "no configuration file found. Note: we checked the following paths: {}",
                    DEFAULT_PATHS.join(", "),
                ))?
        };

        Self::load_from(&path)
            .with_context(|| format!("failed to load configuration from '{}'", path.display()))?
            .pipe(|config| Ok((config, path)))
    }

    /// Loads the configuration from a specific TOML file.
    pub(crate) fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Config::from_file(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;

        config.fix_paths(path)?;
        config.db.validate()?;

        Ok(config)
    }

    /// Checks the config for problematic things that deserve a warning, but
    /// should not prevent startup.
    pub(crate) fn lint(&self) {
        if self.store.backend == Backend::Memory {
            warn!("Using the in-memory store: all data is lost when the process exits");
        }
        if self.http.address.is_unspecified() {
            warn!("HTTP server listens on all interfaces ({}). The API has no \
                authentication, make sure that is intended.", self.http.address);
        }
    }

    /// Goes through all paths in the configuration and changes relative paths
    /// to be absolute based on the path of the configuration file itself.
    fn fix_paths(&mut self, config_path: &Path) -> Result<()> {
        fn fix_path(base_path: &Path, path: &mut PathBuf) {
            if path.is_relative() {
                *path = base_path.join(&path);
            }
        }

        let absolute_config_path = config_path.canonicalize()
            .context("failed to canonicalize config path")?;
        let base = absolute_config_path.parent()
            .ok_or_else(|| anyhow!("config file path has no parent"))?;

        if let Some(p) = &mut self.log.file {
            fix_path(base, p);
        }
        if let Some(p) = &mut self.db.server_cert {
            fix_path(base, p);
        }

        Ok(())
    }
}

/// Writes the generated TOML config template file to the given destination or
/// stdout.
pub(crate) fn write_template(path: Option<&PathBuf>) -> Result<()> {
    use confique::toml::FormatOptions;

    info!(
        "Writing configuration template to '{}'",
        path.map(|p| p.display().to_string()).unwrap_or("<stdout>".into()),
    );

    let mut options = FormatOptions::default();
    options.general.nested_field_gap = 2;
    let template = confique::toml::template::<Config>(options);
    match path {
        Some(path) => fs::write(path, template)?,
        None => io::stdout().write_all(template.as_bytes())?,
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::{db::TlsMode, store::Backend};
    use super::Config;

    fn write_config(dir: &Path, contents: &str) -> std::path::PathBuf {
        let path = dir.join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn temp_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("socialgraph-config-{}", rand::random::<u64>()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let dir = temp_dir();
        let path = write_config(&dir, "[db]\npassword = \"secret\"\n");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.store.backend, Backend::Postgres);
        assert_eq!(config.db.user, "socialgraph");
        assert_eq!(config.db.port, 5432);
        assert_eq!(config.db.tls_mode, TlsMode::On);
        assert_eq!(config.http.port, 3080);
        assert!(config.log.stdout);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn relative_paths_are_resolved_against_config_dir() {
        let dir = temp_dir();
        let path = write_config(&dir, "\
            [store]\n\
            backend = \"memory\"\n\
            [db]\n\
            password = \"secret\"\n\
            [log]\n\
            file = \"logs/socialgraph.log\"\n\
        ");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.store.backend, Backend::Memory);
        let expected = dir.canonicalize().unwrap().join("logs/socialgraph.log");
        assert_eq!(config.log.file, Some(expected));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn server_cert_without_tls_is_rejected() {
        let dir = temp_dir();
        let path = write_config(&dir, "\
            [db]\n\
            password = \"secret\"\n\
            tls_mode = \"off\"\n\
            server_cert = \"cert.pem\"\n\
        ");

        assert!(Config::load_from(&path).is_err());
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn template_mentions_every_section() {
        let template = confique::toml::template::<Config>(Default::default());
        for section in ["[store]", "[db]", "[http]", "[log]"] {
            assert!(template.contains(section), "missing {section}");
        }
    }
}
