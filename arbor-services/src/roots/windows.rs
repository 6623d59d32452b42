use super::{RootEnumerator, RootError};
use async_trait::async_trait;
use std::path::PathBuf;

/// Drive returned when the drive source fails.
const FALLBACK_DRIVE: &str = "C:\\";

/// Source of fixed-disk drive letters.
pub trait DriveSource: Send + Sync {
    /// Upper-case letters of the mounted fixed disks, in letter order.
    fn fixed_drives(&self) -> Result<Vec<char>, RootError>;
}

/// Drive letters from `GetLogicalDrives` filtered to `DRIVE_FIXED`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDriveSource;

#[cfg(windows)]
impl DriveSource for NativeDriveSource {
    fn fixed_drives(&self) -> Result<Vec<char>, RootError> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{GetDriveTypeW, GetLogicalDrives};

        const DRIVE_FIXED: u32 = 3;

        let mask = unsafe { GetLogicalDrives() };
        if mask == 0 {
            return Err(RootError::Drives(std::io::Error::last_os_error().to_string()));
        }

        let mut drives = Vec::new();
        for i in 0..26u8 {
            if mask & (1 << i) == 0 {
                continue;
            }
            let letter = (b'A' + i) as char;
            let root: Vec<u16> = OsStr::new(&format!("{}:\\", letter))
                .encode_wide()
                .chain(std::iter::once(0))
                .collect();
            let drive_type = unsafe { GetDriveTypeW(root.as_ptr()) };
            if drive_type == DRIVE_FIXED {
                drives.push(letter);
            }
        }
        Ok(drives)
    }
}

#[cfg(not(windows))]
impl DriveSource for NativeDriveSource {
    fn fixed_drives(&self) -> Result<Vec<char>, RootError> {
        Err(RootError::Drives("drive letters are only available on Windows".into()))
    }
}

/// Windows roots: one entry per fixed disk.
#[derive(Debug, Clone)]
pub struct WindowsRoots<S> {
    source: S,
}

impl<S: DriveSource> WindowsRoots<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S: DriveSource> RootEnumerator for WindowsRoots<S> {
    async fn roots(&self) -> Result<Vec<PathBuf>, RootError> {
        match self.source.fixed_drives() {
            Ok(letters) if !letters.is_empty() => Ok(letters
                .into_iter()
                .map(|letter| PathBuf::from(format!("{}:\\", letter.to_ascii_uppercase())))
                .collect()),
            Ok(_) => {
                log::warn!("no fixed drives reported, falling back to {}", FALLBACK_DRIVE);
                Ok(vec![PathBuf::from(FALLBACK_DRIVE)])
            },
            Err(e) => {
                log::warn!("{}, falling back to {}", e, FALLBACK_DRIVE);
                Ok(vec![PathBuf::from(FALLBACK_DRIVE)])
            },
        }
    }

    fn name(&self) -> &'static str {
        "windows"
    }
}
