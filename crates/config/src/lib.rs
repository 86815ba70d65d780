//! Layered configuration for whence.
//!
//! Settings are merged, later sources winning, from:
//!
//! 1. built-in defaults,
//! 2. `config.toml` then `config.yaml` in the platform config directory
//!    (`~/.config/whence` on Linux),
//! 3. a file passed explicitly (e.g. `--config`), in TOML, YAML or JSON by
//!    extension,
//! 4. `WHENCE_*` environment variables, with `__` separating nested keys
//!    (`WHENCE_FETCH__RETRIES=5`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

const APPLICATION: &str = "whence";
const ENV_PREFIX: &str = "WHENCE_";
const INDEX_FILE_NAME: &str = "executables.txt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub index: IndexConfig,
    pub fetch: FetchConfig,
    pub brew: BrewConfig,
    /// Command shown in install advice, followed by the package name.
    pub install_command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Location of the executables index. Defaults to the data directory.
    pub path: Option<PathBuf>,
    /// Where to download a prebuilt index from, if anywhere.
    pub remote_url: Option<String>,
    /// How long a downloaded index is considered fresh.
    pub max_age_secs: u64,
    /// Never refresh a downloaded index that already exists locally.
    pub skip_update: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Upper bound for one whole transfer attempt.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Extra attempts after the first one fails.
    pub retries: u32,
    /// Abort a transfer slower than this many bytes per second...
    pub low_speed_limit: u64,
    /// ...sustained for this long. Zero disables the check.
    pub low_speed_time_secs: u64,
    pub user_agent: String,
    /// `Authorization` header for archive downloads. The default is the
    /// anonymous token accepted by the GitHub container registry.
    pub authorization: Option<String>,
    /// Where downloaded archives are kept. Defaults to the cache directory.
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrewConfig {
    /// The `brew` executable. Looked up on `PATH` when unset.
    pub executable: Option<PathBuf>,
    /// Bottle tag to download, e.g. `arm64_sonoma` or `x86_64_linux`.
    /// Detected from `brew` when unset.
    pub bottle_tag: Option<String>,
    /// Taps whose packages are indexed; everything else is ignored.
    pub core_taps: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index: IndexConfig::default(),
            fetch: FetchConfig::default(),
            brew: BrewConfig::default(),
            install_command: "brew install".to_string(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { path: None, remote_url: None, max_age_secs: 24 * 60 * 60, skip_update: false }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 600,
            connect_timeout_secs: 15,
            retries: 3,
            low_speed_limit: 100,
            low_speed_time_secs: 30,
            user_agent: format!("{APPLICATION}/{}", env!("CARGO_PKG_VERSION")),
            authorization: Some("Bearer QQ==".to_string()),
            cache_dir: None,
        }
    }
}

impl Default for BrewConfig {
    fn default() -> Self {
        Self { executable: None, bottle_tag: None, core_taps: vec!["homebrew/core".to_string()] }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APPLICATION)
}

impl Config {
    /// Load configuration from every source.
    ///
    /// `explicit` must exist if given; the files in the config directory are
    /// optional.
    #[instrument(skip_all)]
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let dirs = project_dirs();
        let figment = Self::figment(dirs.as_ref().map(ProjectDirs::config_dir), explicit)?;
        Self::from_figment(figment)
    }

    fn figment(config_dir: Option<&Path>, explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(dir) = config_dir {
            tracing::debug!(directory = %dir.display(), "Looking for configuration files");
            figment = figment.merge(Toml::file(dir.join("config.toml"))).merge(Yaml::file(dir.join("config.yaml")));
        }
        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            tracing::debug!(path = %path.display(), "Using explicit configuration file");
            figment = match path.extension().and_then(|e| e.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
                Some("json") => figment.merge(Json::file_exact(path)),
                _ => figment.merge(Toml::file_exact(path)),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate configuration from an assembled [`Figment`].
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| ErrorKind::Invalid(message.to_string());
        if self.install_command.trim().is_empty() {
            exn::bail!(invalid("install_command must not be empty"));
        }
        if self.fetch.timeout_secs == 0 || self.fetch.connect_timeout_secs == 0 {
            exn::bail!(invalid("fetch timeouts must be at least one second"));
        }
        if self.fetch.low_speed_limit > 0 && self.fetch.low_speed_time_secs > self.fetch.timeout_secs {
            exn::bail!(invalid("fetch.low_speed_time_secs must not exceed fetch.timeout_secs"));
        }
        if self.brew.core_taps.is_empty() {
            exn::bail!(invalid("brew.core_taps must name at least one tap"));
        }
        if let Some(url) = &self.index.remote_url
            && !(url.starts_with("https://") || url.starts_with("http://"))
        {
            exn::bail!(ErrorKind::Invalid(format!("index.remote_url is not an HTTP(S) URL: {url}")));
        }
        Ok(())
    }

    /// The configured index path, or `executables.txt` in the data directory.
    pub fn index_path(&self) -> Result<PathBuf> {
        match &self.index.path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join(INDEX_FILE_NAME)),
        }
    }

    /// The configured archive cache, or the platform cache directory.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        match &self.fetch.cache_dir {
            Some(path) => Ok(path.clone()),
            None => {
                let dirs = project_dirs().ok_or_raise(|| ErrorKind::NoHomeDirectory("fetch.cache_dir"))?;
                Ok(dirs.cache_dir().to_path_buf())
            },
        }
    }
}

/// Per-user data directory (`~/.local/share/whence` on Linux).
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs().ok_or_raise(|| ErrorKind::NoHomeDirectory("index.path"))?.data_dir().to_path_buf())
}

impl IndexConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn low_speed_time(&self) -> Duration {
        Duration::from_secs(self.low_speed_time_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    /// Load from `jail`'s directory as the config directory, plus `explicit`.
    fn load(jail: &Jail, explicit: Option<&str>) -> Result<Config> {
        let explicit = explicit.map(|name| jail.directory().join(name));
        Config::from_figment(Config::figment(Some(jail.directory()), explicit.as_deref())?)
    }

    #[test]
    fn test_defaults_are_valid() {
        Jail::expect_with(|jail| {
            let config = load(jail, None).unwrap();
            assert_eq!(config, Config::default());
            assert_eq!(config.install_command, "brew install");
            assert_eq!(config.brew.core_taps, ["homebrew/core"]);
            Ok(())
        });
    }

    #[test]
    fn test_directory_files_layer() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "install_command = \"brew reinstall\"\n[fetch]\nretries = 1\n")?;
            jail.create_file("config.yaml", "fetch:\n  retries: 7\n")?;
            let config = load(jail, None).unwrap();
            assert_eq!(config.install_command, "brew reinstall");
            assert_eq!(config.fetch.retries, 7);
            // Untouched keys keep their defaults.
            assert_eq!(config.fetch.timeout_secs, FetchConfig::default().timeout_secs);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_overrides_directory() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[index]\npath = \"/var/lib/a.txt\"\n")?;
            jail.create_file("override.toml", "[index]\npath = \"/srv/b.txt\"\nskip_update = true\n")?;
            let config = load(jail, Some("override.toml")).unwrap();
            assert_eq!(config.index_path().unwrap(), Path::new("/srv/b.txt"));
            assert!(config.index.skip_update);
            Ok(())
        });
    }

    #[test]
    fn test_environment_overrides_files() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[fetch]\nretries = 1\n")?;
            jail.create_file("override.json", r#"{"fetch": {"retries": 2}, "install_command": "brew install -q"}"#)?;
            jail.set_env("WHENCE_FETCH__RETRIES", 9);
            jail.set_env("WHENCE_INDEX__SKIP_UPDATE", true);
            let config = load(jail, Some("override.json")).unwrap();
            assert_eq!(config.fetch.retries, 9);
            assert!(config.index.skip_update);
            assert_eq!(config.install_command, "brew install -q");
            Ok(())
        });
    }

    #[rstest]
    #[case("whence.yml", "brew:\n  bottle_tag: x86_64_linux\n")]
    #[case("whence.yaml", "brew:\n  bottle_tag: x86_64_linux\n")]
    #[case("whence.json", r#"{"brew": {"bottle_tag": "x86_64_linux"}}"#)]
    #[case("whence.conf", "[brew]\nbottle_tag = \"x86_64_linux\"\n")]
    fn test_explicit_format_by_extension(#[case] name: &str, #[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file(name, contents)?;
            let config = load(jail, Some(name)).unwrap();
            assert_eq!(config.brew.bottle_tag.as_deref(), Some("x86_64_linux"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        Jail::expect_with(|jail| {
            let err = load(jail, Some("nope.toml")).unwrap_err();
            assert!(matches!(&*err, ErrorKind::NotFound(_)));
            Ok(())
        });
    }

    #[test]
    fn test_malformed_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[fetch]\nretries = \"many\"\n")?;
            let err = load(jail, None).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Load));
            Ok(())
        });
    }

    #[test]
    fn test_malformed_environment() {
        Jail::expect_with(|jail| {
            jail.set_env("WHENCE_FETCH__RETRIES", "many");
            let err = load(jail, None).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Load));
            Ok(())
        });
    }

    #[rstest]
    #[case("install_command = \"  \"")]
    #[case("[fetch]\ntimeout_secs = 0")]
    #[case("[fetch]\ntimeout_secs = 10\nlow_speed_time_secs = 60")]
    #[case("[brew]\ncore_taps = []")]
    #[case("[index]\nremote_url = \"ftp://example.com/executables.txt\"")]
    fn test_invalid(#[case] toml: &str) {
        Jail::expect_with(|jail| {
            jail.create_file("invalid.toml", toml)?;
            let err = load(jail, Some("invalid.toml")).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.index.max_age(), Duration::from_secs(86_400));
        assert_eq!(config.fetch.low_speed_time(), Duration::from_secs(30));
    }
}
