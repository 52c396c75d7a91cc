use std::path::Path;

use crate::Error;

pub mod config;
pub mod logger;

/// load config, then setup logger according to it
pub async fn new(config_path: Option<&Path>, debug: bool) -> Result<(), Error> {
    config::init(config_path).await?;
    logger::init(debug);
    Ok(())
}
