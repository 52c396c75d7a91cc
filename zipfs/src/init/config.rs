use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::{fs, sync::OnceCell};

use crate::Error;

pub static CONFIG: OnceCell<GlobalConfig> = OnceCell::const_new();

static CONFIG_PATH: &str = "config/config.toml";

// config
#[derive(Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    #[serde(default = "default_log_level")]
    pub log_level: usize,
    #[serde(default)]
    pub fuse: Fuse,
}

fn default_log_level() -> usize {
    2
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct Fuse {
    /// seconds for kernel to cache attributes and lookups
    pub attr_ttl: u64,
    /// permission of root and of synthesized directories
    pub root_perm: u16,
    pub block_size: u32,
    pub allow_other: bool,
}

impl Default for Fuse {
    fn default() -> Self {
        Self {
            attr_ttl: 30,
            root_perm: 0o755,
            block_size: 4096,
            allow_other: false,
        }
    }
}

/// pick config file: explicit path, then `CONFIG_PATH` env, then default path
fn config_path(path: Option<&Path>) -> PathBuf {
    match path {
        Some(path) => path.to_path_buf(),
        None => std::env::var_os("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_PATH)),
    }
}

async fn load(path: &Path) -> Result<GlobalConfig, Error> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Ok(toml::from_str("")?)
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn init(path: Option<&Path>) -> Result<(), Error> {
    let path = config_path(path);
    let config = load(&path).await?;
    CONFIG.set(config).map_err(|_| Error::ConfigSet)
}
