//! Linux shared memory attachment (System V and POSIX).
//!
//! Both backends attach to an object created by the device process; neither
//! ever creates, resizes or removes it. The object size is checked against
//! the expected layout size before any byte is mapped.

use crate::error::{ShmError, ShmResult};
use memmap2::{MmapMut, MmapOptions};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::mman::shm_open;
use nix::sys::stat::Mode;
use nix::unistd::getpid;
use omni::shm::SegmentId;
use std::fs::File;
use std::ptr::NonNull;

/// An attached segment, whichever backend produced it.
pub enum Mapping {
    /// System V attachment (`shmat`).
    SysV(SysVAttachment),
    /// POSIX object mapped with `mmap`.
    Posix(MmapMut),
}

impl Mapping {
    /// Base address of the segment.
    pub fn as_ptr(&self) -> *const u8 {
        match self {
            Self::SysV(seg) => seg.addr.as_ptr() as *const u8,
            Self::Posix(mmap) => mmap.as_ptr(),
        }
    }

    /// Mutable base address of the segment.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        match self {
            Self::SysV(seg) => seg.addr.as_ptr(),
            Self::Posix(mmap) => mmap.as_mut_ptr(),
        }
    }

    /// Segment size in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::SysV(seg) => seg.len,
            Self::Posix(mmap) => mmap.len(),
        }
    }

    /// Whether the segment is zero-sized.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// System V segment attached with `shmat`, detached on drop.
pub struct SysVAttachment {
    shmid: libc::c_int,
    addr: NonNull<u8>,
    len: usize,
}

// SAFETY: The attachment is a process-wide mapping; moving the owner to
// another thread does not invalidate it. Mutation goes through `&mut`.
unsafe impl Send for SysVAttachment {}

impl Drop for SysVAttachment {
    fn drop(&mut self) {
        // SAFETY: `addr` was returned by a successful `shmat` and is detached
        // exactly once, here.
        let rc = unsafe { libc::shmdt(self.addr.as_ptr() as *const libc::c_void) };
        if rc != 0 {
            tracing::warn!(shmid = self.shmid, "shmdt failed: {}", Errno::last().desc());
        }
    }
}

/// Attach to an existing segment and verify its size.
pub fn attach(id: &SegmentId, expected_size: usize) -> ShmResult<Mapping> {
    match id {
        SegmentId::SysV(key) => attach_sysv(*key, expected_size, id).map(Mapping::SysV),
        SegmentId::Posix(name) => attach_posix(name, expected_size, id).map(Mapping::Posix),
    }
}

fn attach_sysv(key: i32, expected_size: usize, id: &SegmentId) -> ShmResult<SysVAttachment> {
    // Size 0 and no IPC_CREAT: look up an existing segment only.
    // SAFETY: Plain syscall wrapper, no pointers involved.
    let shmid = unsafe { libc::shmget(key as libc::key_t, 0, 0) };
    if shmid < 0 {
        return Err(translate_errno(Errno::last(), id));
    }

    // SAFETY: `shmid_ds` is a plain C struct; all-zeros is valid, and the
    // kernel fills it on success.
    let mut ds: libc::shmid_ds = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::shmctl(shmid, libc::IPC_STAT, &mut ds) };
    if rc < 0 {
        return Err(translate_errno(Errno::last(), id));
    }
    check_size(ds.shm_segsz as usize, expected_size, id)?;

    // SAFETY: Attaches at a kernel-chosen address; the result is checked
    // against the documented `(void*)-1` failure value.
    let addr = unsafe { libc::shmat(shmid, std::ptr::null(), 0) };
    if addr as isize == -1 {
        return Err(translate_errno(Errno::last(), id));
    }
    let addr = NonNull::new(addr as *mut u8).ok_or_else(|| ShmError::AttachFailed {
        segment: id.to_string(),
        reason: "shmat returned a null address".to_string(),
    })?;

    Ok(SysVAttachment {
        shmid,
        addr,
        len: expected_size,
    })
}

fn attach_posix(name: &str, expected_size: usize, id: &SegmentId) -> ShmResult<MmapMut> {
    let fd = shm_open(name, OFlag::O_RDWR, Mode::empty()).map_err(|e| translate_errno(e, id))?;
    let file = File::from(fd);

    let actual = file
        .metadata()
        .map_err(|e| ShmError::AttachFailed {
            segment: id.to_string(),
            reason: e.to_string(),
        })?
        .len() as usize;
    check_size(actual, expected_size, id)?;

    // SAFETY: The object is owned by the device process and is never
    // truncated while attached; all access goes through bounds-checked
    // copies in `SegmentHandle`.
    let mmap = unsafe { MmapOptions::new().len(expected_size).map_mut(&file) }.map_err(|e| {
        ShmError::AttachFailed {
            segment: id.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(mmap)
}

fn check_size(actual: usize, expected: usize, id: &SegmentId) -> ShmResult<()> {
    if actual != expected {
        return Err(ShmError::SizeMismatch {
            segment: id.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn translate_errno(errno: Errno, id: &SegmentId) -> ShmError {
    match errno {
        Errno::ENOENT => ShmError::NotFound {
            segment: id.to_string(),
        },
        Errno::EACCES | Errno::EPERM => ShmError::PermissionDenied {
            segment: id.to_string(),
        },
        other => ShmError::AttachFailed {
            segment: id.to_string(),
            reason: other.desc().to_string(),
        },
    }
}

/// Get current process ID
pub fn current_pid() -> u32 {
    getpid().as_raw() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_translation() {
        let id = SegmentId::SysV(1);
        assert!(matches!(
            translate_errno(Errno::ENOENT, &id),
            ShmError::NotFound { .. }
        ));
        assert!(matches!(
            translate_errno(Errno::EACCES, &id),
            ShmError::PermissionDenied { .. }
        ));
        match translate_errno(Errno::EINVAL, &id) {
            ShmError::AttachFailed { segment, reason } => {
                assert_eq!(segment, "sysv:1");
                assert!(!reason.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn size_check() {
        let id = SegmentId::posix("omni");
        assert!(check_size(624, 624, &id).is_ok());
        assert_eq!(
            check_size(496, 624, &id),
            Err(ShmError::SizeMismatch {
                segment: "posix:/omni".into(),
                expected: 624,
                actual: 496,
            })
        );
    }

    #[test]
    fn missing_posix_object_is_not_found() {
        let id = SegmentId::posix(format!("omni_missing_{}", current_pid()));
        assert!(matches!(attach(&id, 624), Err(ShmError::NotFound { .. })));
    }
}
