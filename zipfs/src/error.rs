/// Errors before the filesystem is served, all of them are fatal
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("config have been set twice")]
    ConfigSet,
    #[error("config is not loaded")]
    ConfigUnset,
    #[error("blocking task failed: {0}")]
    Runtime(#[from] tokio::task::JoinError),
}
