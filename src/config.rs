//! Support for configuration options
//!
//! The configuration is an explicit object that the caller loads, tweaks and passes around.
//! Secrets are never written to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::utils::home_dir;

const CONFIG_FILE_NAME: &str = ".contacts-sync.json";
const DEFAULT_SIP_DOMAIN: &str = "sbc6.fr.sip.ovh";
const DEFAULT_EXPORT_PATH: &str = "contacts.vcf";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardDavConfig {
    pub url: String,
    pub username: String,
    #[serde(skip)]
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalTableConfig {
    pub db_path: PathBuf,
    pub sip_domain: String,
}

impl Default for LocalTableConfig {
    fn default() -> Self {
        let db_path = home_dir()
            .join(".local/share/linphone/friends.db");
        Self { db_path, sip_domain: DEFAULT_SIP_DOMAIN.to_string() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub carddav: CardDavConfig,
    pub local_table: LocalTableConfig,
    pub export_path: PathBuf,
    /// Applies to every HTTP request. A request that times out fails like any other transport failure.
    pub http_timeout_secs: u64,
    /// Whether [`Config::save`] actually writes anything
    pub remember: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            carddav: CardDavConfig::default(),
            local_table: LocalTableConfig::default(),
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            remember: false,
        }
    }
}

impl Config {
    /// `$HOME/.contacts-sync.json`
    pub fn default_path() -> PathBuf {
        home_dir().join(CONFIG_FILE_NAME)
    }

    /// Load a configuration file. A missing file gives the default configuration.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let file = match std::fs::File::open(path) {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No configuration file at {:?}, using defaults", path);
                return Ok(Self::default());
            },
            Err(err) => {
                return Err(SyncError::setup(format!("Unable to open file {:?}: {}", path, err)));
            },
            Ok(file) => file,
        };
        let config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }

    /// Store this configuration (password excluded), unless `remember` is false
    pub fn save(&self, path: &Path) -> SyncResult<()> {
        if self.remember == false {
            return Ok(());
        }
        let file = std::fs::File::create(path)
            .map_err(|err| SyncError::setup(format!("Unable to save file {:?}: {}", path, err)))?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.remember = true;
        config.carddav.url = "https://dav.example/ab/".to_string();
        config.carddav.username = "john".to_string();
        config.carddav.password = "s3cr3t".to_string();
        config.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("s3cr3t") == false);

        let retrieved = Config::load(&path).unwrap();
        assert_eq!(retrieved.carddav.url, config.carddav.url);
        assert_eq!(retrieved.carddav.password, "");
        assert_eq!(retrieved.http_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn nothing_saved_without_remember() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        Config::default().save(&path).unwrap();
        assert!(path.exists() == false);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load(Path::new("/nonexistent/config.json")).unwrap();
        assert_eq!(config.local_table.sip_domain, "sbc6.fr.sip.ovh");
        assert_eq!(config.export_path, PathBuf::from("contacts.vcf"));
    }

    #[test]
    fn partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"http_timeout_secs": 5, "local_table": {"sip_domain": "sip.example.net"}}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.local_table.sip_domain, "sip.example.net");
        assert!(config.local_table.db_path.ends_with("friends.db"));
    }
}
