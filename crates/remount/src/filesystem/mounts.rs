//! Mount and block device syscalls.

use std::io;
use std::path::Path;

/// Remount `target` read-write.
///
/// The kernel ignores the source and type for `MS_REMOUNT`; `device` and
/// `fs_type` are only logged. `EINVAL` usually means `target` is not the
/// root of a mount.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn remount_read_write(device: &str, target: &str, fs_type: &str) -> io::Result<()> {
    use rustix::mount::{MountFlags, mount_remount};

    tracing::debug!(device, target, fs_type, "mount(MS_REMOUNT)");

    mount_remount(target, MountFlags::empty(), "")?;
    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub fn remount_read_write(_device: &str, _target: &str, _fs_type: &str) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "remount"))
}

/// Mount an overlay filesystem at `target` with `options` as mount data.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn mount_overlay(target: &Path, options: &str) -> io::Result<()> {
    use rustix::mount::{MountFlags, mount};
    use std::ffi::CString;

    tracing::debug!(target = %target.display(), options, "mount(overlay)");

    let options_c = CString::new(options)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "overlay options contain a NUL byte"))?;
    mount(c"overlay", target, c"overlay", MountFlags::NOATIME, options_c.as_c_str())?;
    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub fn mount_overlay(_target: &Path, _options: &str) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "overlayfs"))
}

/// Set or clear the kernel read-only bit of a block device.
#[cfg(any(target_os = "linux", target_os = "android"))]
#[allow(unsafe_code)]
pub fn set_block_read_only(device: &Path, read_only: bool) -> io::Result<()> {
    use rustix::ioctl::{Setter, ioctl, opcode};

    /// `BLKROSET` from `<linux/fs.h>`.
    const BLKROSET: rustix::ioctl::Opcode = opcode::none(0x12, 93);

    let file = std::fs::File::open(device)?;
    let flag = std::ffi::c_int::from(read_only);

    // Safety: BLKROSET reads one C int through the argument pointer, which is
    // exactly what `Setter<_, c_int>` passes.
    unsafe { ioctl(&file, Setter::<BLKROSET, std::ffi::c_int>::new(flag)) }?;
    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub fn set_block_read_only(_device: &Path, _read_only: bool) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "BLKROSET"))
}
