//! Arena of flat `f64` buffers and the ownership rules that guard them.
//!
//! Every matrix or vector is a [`Handle`] into a [`Storage`]. A handle either
//! owns its buffer or is a view that borrows a range of an owner's buffer.
//! Creating a view bumps the owner's reference count; releasing it drops the
//! count again. Releasing an owner while views are live is reported as an
//! ownership violation and the buffer is kept until the last view goes, so a
//! view can never outlive the memory it points into.
//!
//! Handles are not `Clone`, and [`Storage::release`] takes them by value, so a
//! handle cannot be released twice.

use crate::config::Config;
use crate::error::{LResult, LinalgError};
use std::alloc::Layout;
use std::fmt;
use std::sync::atomic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    Allocation,
    CapacityOverflow,
}

impl fmt::Display for FatalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalKind::Allocation => f.write_str("memory allocation failed"),
            FatalKind::CapacityOverflow => f.write_str("capacity overflow"),
        }
    }
}

/// Reports an unrecoverable condition and terminates the current thread.
#[cold]
pub fn report_fatal(kind: FatalKind, message: &str) -> ! {
    log::error!("{}: {}", kind, message);
    panic!("{}: {}", kind, message);
}

/// How the caller intends to use a fresh buffer. Both variants hand back
/// zero-filled memory; `Uninit` only means the caller will overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Init {
    Uninit,
    Zeroed,
}

fn alloc_buffer(n: usize) -> Vec<f64> {
    if Layout::array::<f64>(n).is_err() {
        report_fatal(
            FatalKind::CapacityOverflow,
            &format!("cannot lay out {} f64 elements", n),
        );
    }
    let mut v: Vec<f64> = Vec::new();
    if v.try_reserve_exact(n).is_err() {
        report_fatal(
            FatalKind::Allocation,
            &format!("failed to reserve {} f64 elements", n),
        );
    }
    v.resize(n, 0.0);
    v
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StorageId(usize);

impl StorageId {
    fn new() -> Self {
        static COUNTER: atomic::AtomicUsize = atomic::AtomicUsize::new(1);
        Self(COUNTER.fetch_add(1, atomic::Ordering::Relaxed))
    }
}

/// Names one buffer of one [`Storage`]. Ids from another storage, or for a
/// slot that has since been reused, are rejected as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId {
    storage: StorageId,
    index: usize,
    generation: u32,
}

impl BufferId {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Whether a handle owns its buffer, and if not, which buffer it borrows from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owner,
    View { owner: BufferId },
}

#[derive(Debug)]
pub struct Handle {
    buffer: BufferId,
    offset: usize,
    len: usize,
    ownership: Ownership,
}

impl Handle {
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub fn owns_memory(&self) -> bool {
        self.ownership == Ownership::Owner
    }

    /// The owning buffer of a view, `None` for owners.
    pub fn memory_owner(&self) -> Option<BufferId> {
        match self.ownership {
            Ownership::Owner => None,
            Ownership::View { owner } => Some(owner),
        }
    }
}

/// Shared surface of matrices and vectors.
pub trait LinalgObj {
    fn handle(&self) -> &Handle;

    fn owns_memory(&self) -> bool {
        self.handle().owns_memory()
    }

    fn memory_owner(&self) -> Option<BufferId> {
        self.handle().memory_owner()
    }

    /// Live views chained to this object. Always zero for views.
    fn ref_count(&self, storage: &Storage) -> LResult<usize> {
        storage.ref_count(self.handle())
    }
}

struct Buffer {
    data: Vec<f64>,
    ref_count: usize,
    // owner handle is gone, reclaim once the last view is released
    orphaned: bool,
}

struct Slot {
    generation: u32,
    buffer: Option<Buffer>,
}

pub struct Storage {
    id: StorageId,
    slots: Vec<Slot>,
    free: Vec<usize>,
    config: Config,
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            id: StorageId::new(),
            slots: Vec::new(),
            free: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Number of buffers currently allocated.
    pub fn live_buffers(&self) -> usize {
        self.slots.iter().filter(|s| s.buffer.is_some()).count()
    }

    pub fn is_live(&self, id: BufferId) -> bool {
        self.buffer(id).is_ok()
    }

    pub fn allocate_owned(&mut self, n: usize, init: Init) -> Handle {
        log::debug!("allocate {} elements ({:?})", n, init);
        self.insert(alloc_buffer(n))
    }

    /// Takes ownership of already computed data.
    pub fn allocate_from(&mut self, data: Vec<f64>) -> Handle {
        log::debug!("adopt buffer of {} elements", data.len());
        self.insert(data)
    }

    fn insert(&mut self, data: Vec<f64>) -> Handle {
        let len = data.len();
        let buffer = Buffer {
            data,
            ref_count: 0,
            orphaned: false,
        };
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.buffer = Some(buffer);
                BufferId {
                    storage: self.id,
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    buffer: Some(buffer),
                });
                BufferId {
                    storage: self.id,
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };
        Handle {
            buffer: id,
            offset: 0,
            len,
            ownership: Ownership::Owner,
        }
    }

    pub fn create_view(&mut self, owner: &Handle, offset: usize, len: usize) -> LResult<Handle> {
        if !owner.owns_memory() {
            return Err(LinalgError::ViewOfView);
        }
        let end = offset.checked_add(len).ok_or(LinalgError::DimensionMismatch {
            op: "create_view",
            expected: owner.len,
            got: usize::MAX,
        })?;
        if end > owner.len {
            return Err(LinalgError::DimensionMismatch {
                op: "create_view",
                expected: owner.len,
                got: end,
            });
        }
        let buf = self.buffer_mut(owner.buffer)?;
        buf.ref_count += 1;
        log::debug!(
            "view [{}..{}) of buffer {} (refs {})",
            offset,
            end,
            owner.buffer.index,
            buf.ref_count
        );
        Ok(Handle {
            buffer: owner.buffer,
            offset: owner.offset + offset,
            len,
            ownership: Ownership::View {
                owner: owner.buffer,
            },
        })
    }

    /// Releases a handle. Owners need a zero reference count. Otherwise an
    /// ownership violation is returned and the buffer stays allocated until
    /// its last view is released, so outstanding views remain valid.
    pub fn release(&mut self, h: Handle) -> LResult<()> {
        match h.ownership {
            Ownership::Owner => {
                let buf = self.buffer_mut(h.buffer)?;
                if buf.ref_count != 0 {
                    buf.orphaned = true;
                    log::error!(
                        "release of buffer {} with {} live view(s)",
                        h.buffer.index,
                        buf.ref_count
                    );
                    return Err(LinalgError::OwnershipViolation {
                        live_views: buf.ref_count,
                    });
                }
                self.reclaim(h.buffer.index);
                Ok(())
            }
            Ownership::View { owner } => {
                let buf = self.buffer_mut(owner)?;
                // views are never viewed, so only the owner's count moves
                buf.ref_count -= 1;
                log::debug!(
                    "released view of buffer {} (refs {})",
                    owner.index,
                    buf.ref_count
                );
                if buf.ref_count == 0 && buf.orphaned {
                    self.reclaim(owner.index);
                }
                Ok(())
            }
        }
    }

    fn reclaim(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        slot.buffer = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        log::debug!("released buffer {}", index);
    }

    pub fn ref_count(&self, h: &Handle) -> LResult<usize> {
        let buf = self.buffer(h.buffer)?;
        match h.ownership {
            Ownership::Owner => Ok(buf.ref_count),
            Ownership::View { .. } => Ok(0),
        }
    }

    pub fn slice(&self, h: &Handle) -> LResult<&[f64]> {
        let buf = self.buffer(h.buffer)?;
        buf.data
            .get(h.offset..h.offset + h.len)
            .ok_or(LinalgError::StaleHandle {
                index: h.buffer.index,
            })
    }

    pub fn slice_mut(&mut self, h: &Handle) -> LResult<&mut [f64]> {
        let buf = self.buffer_mut(h.buffer)?;
        buf.data
            .get_mut(h.offset..h.offset + h.len)
            .ok_or(LinalgError::StaleHandle {
                index: h.buffer.index,
            })
    }

    /// Applies `f(dst[i], src[i])` over two equally long handles, which may
    /// alias the same buffer.
    pub(crate) fn zip_mut<F>(&mut self, dst: &Handle, src: &Handle, mut f: F) -> LResult<()>
    where
        F: FnMut(&mut f64, f64),
    {
        if dst.len != src.len {
            return Err(LinalgError::DimensionMismatch {
                op: "zip",
                expected: dst.len,
                got: src.len,
            });
        }
        if dst.buffer == src.buffer {
            let data = &mut self.buffer_mut(dst.buffer)?.data;
            for i in 0..dst.len {
                let s = data[src.offset + i];
                f(&mut data[dst.offset + i], s);
            }
            return Ok(());
        }
        let (d, s) = self.pair_mut(dst.buffer, src.buffer)?;
        let d = &mut d.data[dst.offset..dst.offset + dst.len];
        let s = &s.data[src.offset..src.offset + src.len];
        d.iter_mut().zip(s.iter()).for_each(|(x, &y)| f(x, y));
        Ok(())
    }

    /// Writes `src` into `dst` at `start, start + stride, ...`.
    pub(crate) fn scatter(
        &mut self,
        dst: &Handle,
        start: usize,
        stride: usize,
        src: &Handle,
    ) -> LResult<()> {
        if src.len > 0 && start + (src.len - 1) * stride >= dst.len {
            return Err(LinalgError::DimensionMismatch {
                op: "scatter",
                expected: dst.len,
                got: start + (src.len - 1) * stride + 1,
            });
        }
        if dst.buffer == src.buffer {
            let values = self.slice(src)?.to_vec();
            let d = self.slice_mut(dst)?;
            for (i, v) in values.into_iter().enumerate() {
                d[start + i * stride] = v;
            }
            return Ok(());
        }
        let (d, s) = self.pair_mut(dst.buffer, src.buffer)?;
        let d = &mut d.data[dst.offset..dst.offset + dst.len];
        let s = &s.data[src.offset..src.offset + src.len];
        for (i, &v) in s.iter().enumerate() {
            d[start + i * stride] = v;
        }
        Ok(())
    }

    fn pair_mut(&mut self, a: BufferId, b: BufferId) -> LResult<(&mut Buffer, &Buffer)> {
        debug_assert_ne!(a.index, b.index);
        self.buffer(a)?;
        self.buffer(b)?;
        let (lo, hi) = self.slots.split_at_mut(a.index.max(b.index));
        let (a_slot, b_slot) = if a.index < b.index {
            (&mut lo[a.index], &hi[0])
        } else {
            (&mut hi[0], &lo[b.index])
        };
        match (a_slot.buffer.as_mut(), b_slot.buffer.as_ref()) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(LinalgError::StaleHandle { index: a.index }),
        }
    }

    fn buffer(&self, id: BufferId) -> LResult<&Buffer> {
        if id.storage != self.id {
            return Err(LinalgError::StaleHandle { index: id.index });
        }
        match self.slots.get(id.index) {
            Some(Slot {
                generation,
                buffer: Some(buf),
            }) if *generation == id.generation => Ok(buf),
            _ => Err(LinalgError::StaleHandle { index: id.index }),
        }
    }

    fn buffer_mut(&mut self, id: BufferId) -> LResult<&mut Buffer> {
        if id.storage != self.id {
            return Err(LinalgError::StaleHandle { index: id.index });
        }
        match self.slots.get_mut(id.index) {
            Some(Slot {
                generation,
                buffer: Some(buf),
            }) if *generation == id.generation => Ok(buf),
            _ => Err(LinalgError::StaleHandle { index: id.index }),
        }
    }
}
