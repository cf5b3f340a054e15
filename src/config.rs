//! Client configuration: where keystores live and how hard we stretch
//! passwords.

use crate::{
    crypto::base::KdfParams,
    error::{Error, Result},
    identity::Identifier,
    util::ser,
};
use serde_derive::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the storage root.
pub const STORAGE_ENV: &str = "TRSST_CLIENT_STORAGE";

/// Directory under `$HOME` used when the environment doesn't say otherwise.
pub const DEFAULT_STORAGE_DIR: &str = "trsstd";

/// Appended to an identifier to get its keystore file name.
pub const KEY_EXTENSION: &str = ".keystore";

fn default_key_extension() -> String {
    KEY_EXTENSION.into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::Setters)]
#[getset(get = "pub", set = "pub")]
pub struct ClientConfig {
    /// Keystores live here unless a call says otherwise.
    storage_root: PathBuf,
    #[serde(default = "default_key_extension")]
    key_extension: String,
    /// Argon2 parameters for new keystores. Existing keystores keep whatever
    /// they were created with.
    #[serde(default)]
    #[getset(skip)]
    kdf: KdfParams,
}

impl ClientConfig {
    /// A config rooted at `storage_root`, with everything else defaulted.
    pub fn new<P: Into<PathBuf>>(storage_root: P) -> Self {
        Self {
            storage_root: storage_root.into(),
            key_extension: default_key_extension(),
            kdf: KdfParams::default(),
        }
    }

    /// Build a config from the environment: [`STORAGE_ENV`] if it's set,
    /// otherwise `$HOME/trsstd`.
    pub fn from_env() -> Result<Self> {
        Self::from_storage_var(std::env::var_os(STORAGE_ENV))
    }

    fn from_storage_var(var: Option<OsString>) -> Result<Self> {
        let root = match var {
            Some(root) if !root.is_empty() => PathBuf::from(root),
            _ => dirs::home_dir()
                .ok_or_else(|| Error::Config("could not find a home directory".into()))?
                .join(DEFAULT_STORAGE_DIR),
        };
        Ok(Self::new(root))
    }

    /// Argon2 parameters for new keystores.
    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }

    /// Set the Argon2 parameters for new keystores. Params a keystore would
    /// refuse to open are refused here too.
    pub fn set_kdf(&mut self, kdf: KdfParams) -> Result<&mut Self> {
        kdf.check()?;
        self.kdf = kdf;
        Ok(self)
    }

    /// Where the keystore for `id` lives. `dir` replaces the storage root
    /// when given.
    pub fn key_path(&self, id: &Identifier, dir: Option<&Path>) -> PathBuf {
        let dir = dir.unwrap_or(&self.storage_root);
        dir.join(format!("{}{}", id, self.key_extension))
    }

    /// Load a config from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read(path).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = ser::deserialize_human(&contents).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        if !config.kdf.is_sane() {
            Err(Error::Config(format!("{}: kdf parameters out of range", path.display())))?;
        }
        Ok(config)
    }

    /// Save this config as YAML.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml = ser::serialize_human(self)?;
        std::fs::write(path, yaml).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}
