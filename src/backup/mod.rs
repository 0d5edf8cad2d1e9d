//! Numbered backups of target configuration files.
//!
//! A backup is a byte-for-byte sibling copy named `<target>.bak<N>`, where
//! N is the smallest positive integer not already taken.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Backup errors
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(String),
}

/// Compute the first unused `.bak<N>` sibling of `target`, probing from 1.
pub fn backup_path(target: &Path) -> PathBuf {
    let mut n: u32 = 1;
    loop {
        let candidate = numbered(target, n);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Copy `target` to its first unused `.bak<N>` sibling.
///
/// The copy is byte-for-byte. When the target does not exist the copy is
/// skipped, but the computed backup name is still returned.
pub fn create_backup(target: &Path) -> Result<PathBuf, BackupError> {
    let backup = backup_path(target);
    if target.exists() {
        fs::copy(target, &backup).map_err(|e| BackupError::Io(e.to_string()))?;
    }
    Ok(backup)
}

fn numbered(target: &Path, n: u32) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(format!(".bak{}", n));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_backup_is_bak1() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("settings.conf");
        fs::write(&target, "a=1\n").unwrap();

        let backup = create_backup(&target).unwrap();

        assert_eq!(backup, dir.path().join("settings.conf.bak1"));
        assert_eq!(fs::read(&backup).unwrap(), b"a=1\n");
    }

    #[test]
    fn test_probes_past_existing_backups() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("settings.conf");
        fs::write(&target, "a=1\n").unwrap();
        for n in 1..=3 {
            fs::write(dir.path().join(format!("settings.conf.bak{}", n)), "old").unwrap();
        }

        let backup = create_backup(&target).unwrap();

        assert_eq!(backup, dir.path().join("settings.conf.bak4"));
        assert_eq!(fs::read(&backup).unwrap(), b"a=1\n");
    }

    #[test]
    fn test_missing_target_reports_name_without_copying() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("absent.conf");

        let backup = create_backup(&target).unwrap();

        assert_eq!(backup, dir.path().join("absent.conf.bak1"));
        assert!(!backup.exists());
    }

    #[test]
    fn test_copy_is_binary_safe() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("settings.conf");
        let payload: Vec<u8> = vec![0x00, 0xff, 0x7f, 0x0a, 0x80];
        fs::write(&target, &payload).unwrap();

        let backup = create_backup(&target).unwrap();

        assert_eq!(fs::read(&backup).unwrap(), payload);
    }
}
