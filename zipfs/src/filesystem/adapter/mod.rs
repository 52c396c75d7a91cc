mod fuse;
mod handle;
mod reply;

pub use fuse::Filesystem;

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        archive::{
            self,
            test::{save, TarBuilder},
        },
        filesystem::ArchiveTree,
        init::config::Fuse,
    };
    use env_logger::*;
    use std::io::SeekFrom;
    use tokio::io::AsyncSeekExt;

    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "need fusermount and a writable .temp directory"]
    async fn test_mount() {
        Builder::from_default_env()
            .filter_level(log::LevelFilter::Trace)
            .try_init()
            .ok();

        let tarball = save(
            &TarBuilder::new()
                .dir("nest/")
                .file("nest/a.txt", b"hello")
                .file("o.txt", b"world")
                .finish(),
        );
        std::fs::create_dir_all("./.temp/1").unwrap();

        log::info!("mounting test tarball in .temp/1 ...");
        let index = archive::load(tarball.path(), 0o755).unwrap();
        let filesystem = Filesystem::new(ArchiveTree::new(index, 0o755), &Fuse::default(), "test");
        let mut mount_handle = filesystem.mount("./.temp/1").await.unwrap();

        let content = tokio::fs::read_to_string("./.temp/1/nest/a.txt").await.unwrap();
        assert_eq!(content, "hello");

        let mut file = tokio::fs::File::open("./.temp/1/o.txt").await.unwrap();
        let err = file.seek(SeekFrom::Start(1)).await.unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ESPIPE));
        let mut names = Vec::new();
        let mut dir = tokio::fs::read_dir("./.temp/1").await.unwrap();
        while let Some(entry) = dir.next_entry().await.unwrap() {
            names.push(entry.file_name().into_string().unwrap());
        }
        names.sort();
        assert_eq!(names, vec!["nest", "o.txt"]);
        assert!(tokio::fs::write("./.temp/1/new.txt", b"x").await.is_err());

        let handle = &mut mount_handle;
        tokio::select! {
            res = handle => res.unwrap(),
            _ = tokio::time::sleep(std::time::Duration::from_millis(100)) => {
                mount_handle.unmount().await.unwrap()
            }
        }
    }
}
