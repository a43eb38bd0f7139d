//! [`Storage`] backed by a mounted directory

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};

use super::{Storage, Volume, VolumeUsage};

/// Storage rooted at the SD card mount point
#[derive(Debug, Clone)]
pub struct LocalStorage {
    /// SD card mount point (e.g., /sd)
    root: PathBuf,
    /// Mount point of the internal filesystem
    system_root: PathBuf,
    card_present: bool,
}

impl LocalStorage {
    /// Create storage rooted at `root`, with the card reported present
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            system_root: PathBuf::from("/"),
            card_present: true,
        }
    }

    pub fn with_system_root<P: AsRef<Path>>(mut self, system_root: P) -> Self {
        self.system_root = system_root.as_ref().to_path_buf();
        self
    }

    pub fn with_card_present(mut self, present: bool) -> Self {
        self.card_present = present;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a card-relative path, ignoring any leading `/`
    pub fn resolve(&self, path: &Path) -> PathBuf {
        let relative: PathBuf = path
            .components()
            .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
            .collect();
        self.root.join(relative)
    }
}

impl Storage for LocalStorage {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn create_dir(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(self.resolve(dir))
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.resolve(dir))? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(self.resolve(path))
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut file = File::create(self.resolve(path))?;
        file.write_all(data)?;
        file.sync_all()
    }

    fn append(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.resolve(path))?;
        file.write_all(data)?;
        file.flush()
    }

    fn read_at(&self, path: &Path, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut file = File::open(self.resolve(path))?;
        file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(self.resolve(path))?.len())
    }

    fn usage(&self, volume: Volume) -> io::Result<VolumeUsage> {
        match volume {
            Volume::Internal => statvfs(&self.system_root),
            Volume::SdCard => statvfs(&self.root),
        }
    }

    fn card_present(&self) -> bool {
        self.card_present
    }
}

#[cfg(unix)]
fn statvfs(path: &Path) -> io::Result<VolumeUsage> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // SAFETY: statvfs is plain old data and is fully written on success.
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    // SAFETY: c_path is a valid NUL-terminated string and stat is a valid out pointer.
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    let total = stat.f_blocks as u64;
    let free = stat.f_bfree as u64;
    Ok(VolumeUsage {
        used_blocks: total.saturating_sub(free),
        total_blocks: total,
    })
}

#[cfg(not(unix))]
fn statvfs(_path: &Path) -> io::Result<VolumeUsage> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "filesystem statistics are only available on unix targets",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, LocalStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        (dir, storage)
    }

    #[test]
    fn test_resolve_strips_leading_slash() {
        let storage = LocalStorage::new("/sd");
        assert_eq!(storage.resolve(Path::new("/logs/log001.txt")), PathBuf::from("/sd/logs/log001.txt"));
        assert_eq!(storage.resolve(Path::new("data/a.txt")), PathBuf::from("/sd/data/a.txt"));
    }

    #[test]
    fn test_append_and_size() {
        let (_dir, storage) = storage();
        let path = Path::new("a.txt");

        storage.append(path, b"hello ").unwrap();
        storage.append(path, b"world").unwrap();

        assert_eq!(storage.read_to_string(path).unwrap(), "hello world");
        assert_eq!(storage.size(path).unwrap(), 11);
    }

    #[test]
    fn test_write_replaces_contents() {
        let (_dir, storage) = storage();
        let path = Path::new("info.txt");

        storage.write(path, b"12").unwrap();
        storage.write(path, b"3").unwrap();

        assert_eq!(storage.read_to_string(path).unwrap(), "3");
    }

    #[test]
    fn test_create_and_list_dir() {
        let (_dir, storage) = storage();
        let dir = Path::new("/logs");

        assert!(!storage.exists(dir));
        storage.create_dir(dir).unwrap();
        assert!(storage.exists(dir));

        storage.append(&dir.join("log002.txt"), b"").unwrap();
        storage.append(&dir.join("log001.txt"), b"").unwrap();

        assert_eq!(storage.list_dir(dir).unwrap(), vec!["log001.txt", "log002.txt"]);
    }

    #[test]
    fn test_read_at_offsets() {
        let (_dir, storage) = storage();
        let path = Path::new("data.bin");
        storage.append(path, b"0123456789").unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(storage.read_at(path, 2, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"2345");

        assert_eq!(storage.read_at(path, 8, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"89");

        assert_eq!(storage.read_at(path, 10, &mut buf).unwrap(), 0);
        assert_eq!(storage.read_at(path, 100, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_missing_file_errors() {
        let (_dir, storage) = storage();
        assert!(storage.size(Path::new("missing.txt")).is_err());
        assert!(storage.read_to_string(Path::new("missing.txt")).is_err());
    }

    #[test]
    fn test_card_present_flag() {
        let (_dir, storage) = storage();
        assert!(storage.card_present());
        assert!(!storage.with_card_present(false).card_present());
    }

    #[cfg(unix)]
    #[test]
    fn test_usage_reports_blocks() {
        let (_dir, storage) = storage();
        let usage = storage.usage(Volume::SdCard).unwrap();
        assert!(usage.total_blocks > 0);
        assert!(usage.used_blocks <= usage.total_blocks);
    }

    #[cfg(unix)]
    #[test]
    fn test_usage_missing_mount_errors() {
        let storage = LocalStorage::new("/nonexistent_mount_point_12345");
        assert!(storage.usage(Volume::SdCard).is_err());
    }
}
