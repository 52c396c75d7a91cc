use std::path::PathBuf;

use clap::Parser;
use init::config::CONFIG;

pub mod archive;
pub mod error;
pub mod filesystem;
pub mod init;

pub use error::Error;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Mount a zip or tar archive as a read-only filesystem
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// config file, default to `CONFIG_PATH` env or config/config.toml
    #[arg(long)]
    config: Option<PathBuf>,
    /// trace every fuse request
    #[arg(long, default_value_t = false)]
    debug: bool,
    /// archive to mount
    archive: PathBuf,
    /// directory to mount on
    mountpoint: PathBuf,
}

async fn run(args: Args) -> Result<(), Error> {
    let config = &CONFIG.get().ok_or(Error::ConfigUnset)?.fuse;

    let path = args.archive.clone();
    let root_perm = config.root_perm;
    let index =
        tokio::task::spawn_blocking(move || archive::load(&path, root_perm as u32)).await??;
    log::info!(
        "loaded {} entries from {}",
        index.len(),
        args.archive.display()
    );

    let tree = filesystem::ArchiveTree::new(index, root_perm);
    let filesystem =
        filesystem::Filesystem::new(tree, config, args.archive.to_string_lossy());
    let mut mount_handle = filesystem.mount(&args.mountpoint).await?;
    let handle = &mut mount_handle;

    tokio::select! {
        res = handle => res?,
        _ = tokio::signal::ctrl_c() => {
            log::info!("unmounting {}", args.mountpoint.display());
            mount_handle.unmount().await?
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(err) = init::new(args.config.as_deref(), args.debug).await {
        eprintln!("fail to initialize: {}", err);
        std::process::exit(1);
    }

    if let Err(err) = run(args).await {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
