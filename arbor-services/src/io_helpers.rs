// SPDX-License-Identifier: LGPL-3.0-only

//! Async I/O helpers using smol::unblock for non-blocking file operations

use std::io;
use std::path::Path;

/// Run a blocking filesystem closure on the blocking thread pool.
///
/// Safe to await from tokio or any other runtime.
pub async fn unblock<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    smol::unblock(f).await
}

/// Read the entire contents of a file into a string asynchronously.
pub async fn read_file_to_string(path: &Path) -> io::Result<String> {
    let path = path.to_path_buf();
    smol::unblock(move || std::fs::read_to_string(path)).await
}

/// Copy `src` to `dst`, descending into directories.
///
/// `src` itself is resolved; symlinks found inside it are recreated as links.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    let metadata = std::fs::metadata(src)?;
    copy_entry_with(src, dst, metadata.file_type())
}

fn copy_entry_with(src: &Path, dst: &Path, file_type: std::fs::FileType) -> io::Result<()> {
    if file_type.is_symlink() {
        return copy_link(src, dst);
    }
    if !file_type.is_dir() {
        std::fs::copy(src, dst)?;
        return Ok(());
    }

    std::fs::create_dir(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        copy_entry_with(&entry.path(), &dst.join(entry.file_name()), entry.file_type()?)?;
    }
    Ok(())
}

#[cfg(unix)]
fn copy_link(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(std::fs::read_link(src)?, dst)
}

#[cfg(windows)]
fn copy_link(src: &Path, dst: &Path) -> io::Result<()> {
    let target = std::fs::read_link(src)?;
    if std::fs::metadata(src).map(|m| m.is_dir()).unwrap_or(false) {
        std::os::windows::fs::symlink_dir(target, dst)
    } else {
        std::os::windows::fs::symlink_file(target, dst)
    }
}
