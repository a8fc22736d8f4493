//! Test producers standing in for the device process.
//!
//! Each producer creates its own segment, owns it for the test's duration,
//! and removes it on drop.

#![allow(dead_code)]

use memmap2::{MmapMut, MmapOptions};
use nix::fcntl::OFlag;
use nix::sys::mman::{shm_open, shm_unlink};
use nix::sys::stat::Mode;
use omni::shm::SegmentId;
use omni::shm::codec::ShmRecord;
use omni::shm::layout::{
    ButtonEvent, Feedback, JointState, OmniState, ReadMessage, SegmentLayout, Vector3d,
};
use std::fs::File;

/// Segment image accessors shared by both producers.
pub trait Producer {
    /// Whole segment image.
    fn bytes(&self) -> &[u8];
    /// Whole segment image, writable.
    fn bytes_mut(&mut self) -> &mut [u8];
    /// Identifier a client attaches with.
    fn id(&self) -> SegmentId;

    /// Overwrite the read block with `msg`.
    fn publish(&mut self, msg: &ReadMessage) {
        self.bytes_mut()[SegmentLayout::read_range()].copy_from_slice(msg.as_bytes());
    }

    /// Current content of the read block.
    fn read_block(&self) -> Vec<u8> {
        self.bytes()[SegmentLayout::read_range()].to_vec()
    }

    /// Feedback last written by a client.
    fn feedback(&self) -> Feedback {
        Feedback::from_bytes(&self.bytes()[SegmentLayout::write_range()])
            .expect("write block decodes")
    }
}

/// POSIX shared memory producer.
pub struct PosixProducer {
    name: String,
    mmap: MmapMut,
}

impl PosixProducer {
    /// Create a full-size segment unique to this process and `tag`.
    pub fn create(tag: &str) -> Self {
        Self::with_size(tag, SegmentLayout::TOTAL_SIZE)
    }

    /// Create a segment of an arbitrary size.
    pub fn with_size(tag: &str, size: usize) -> Self {
        let name = format!("/omni_test_{tag}_{}", std::process::id());
        let _ = shm_unlink(name.as_str());

        let fd = shm_open(
            name.as_str(),
            OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_RDWR,
            Mode::S_IRUSR | Mode::S_IWUSR,
        )
        .expect("shm_open");
        let file = File::from(fd);
        file.set_len(size as u64).expect("set_len");

        let mmap = unsafe { MmapOptions::new().len(size).map_mut(&file) }.expect("mmap");
        Self { name, mmap }
    }
}

impl Producer for PosixProducer {
    fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.mmap
    }

    fn id(&self) -> SegmentId {
        SegmentId::posix(self.name.clone())
    }
}

impl Drop for PosixProducer {
    fn drop(&mut self) {
        let _ = shm_unlink(self.name.as_str());
    }
}

/// System V shared memory producer, the device process's native form.
pub struct SysVProducer {
    key: i32,
    shmid: libc::c_int,
    addr: *mut u8,
    len: usize,
}

impl SysVProducer {
    /// Create a full-size segment on a key derived from the pid and `salt`.
    pub fn create(salt: i32) -> Self {
        let len = SegmentLayout::TOTAL_SIZE;
        let base = 0x4f4d_0000 | ((std::process::id() as i32 & 0xff) << 8);

        for attempt in 0..64 {
            let key = base | ((salt * 64 + attempt) & 0xff);
            let shmid = unsafe {
                libc::shmget(
                    key as libc::key_t,
                    len,
                    libc::IPC_CREAT | libc::IPC_EXCL | 0o600,
                )
            };
            if shmid < 0 {
                continue;
            }

            let addr = unsafe { libc::shmat(shmid, std::ptr::null(), 0) };
            assert_ne!(addr as isize, -1, "shmat failed");
            return Self {
                key,
                shmid,
                addr: addr as *mut u8,
                len,
            };
        }
        panic!("no free System V key for salt {salt}");
    }
}

impl Producer for SysVProducer {
    fn bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.addr, self.len) }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.addr, self.len) }
    }

    fn id(&self) -> SegmentId {
        SegmentId::sysv(self.key)
    }
}

impl Drop for SysVProducer {
    fn drop(&mut self) {
        unsafe {
            libc::shmdt(self.addr as *const libc::c_void);
            libc::shmctl(self.shmid, libc::IPC_RMID, std::ptr::null_mut());
        }
    }
}

/// Joint state used by the end-to-end scenarios.
pub fn sample_joints() -> JointState {
    JointState {
        stamp: 1,
        waist: 0.1,
        shoulder: 0.2,
        elbow: 0.3,
        wrist1: 0.4,
        wrist2: 0.5,
        wrist3: 0.6,
    }
}

/// Read message with the sample joints, grey button pressed, and a device
/// transform rotated 90° about Z and translated to (1, 2, 3).
pub fn sample_message() -> ReadMessage {
    let mut omnistate = OmniState::default();
    omnistate.position = Vector3d::new(10.0, -20.0, 30.0);
    omnistate.buttons = [1, 0];
    omnistate.lock = 1;
    omnistate.transform = [
        0.0, 1.0, 0.0, 0.0, // column 0
        -1.0, 0.0, 0.0, 0.0, // column 1
        0.0, 0.0, 1.0, 0.0, // column 2
        1.0, 2.0, 3.0, 1.0, // column 3
    ];

    ReadMessage {
        omnistate,
        jointstate: sample_joints(),
        buttonevent: ButtonEvent {
            grey_button: 1,
            white_button: 0,
        },
    }
}
