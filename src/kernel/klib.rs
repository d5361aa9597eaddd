// CLASSIFICATION: COMMUNITY
// Filename: klib.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Small helper library other modules link against: a virtual to physical
//! page walk and an integer power function.

use std::collections::BTreeMap;

use log::{info, warn};

use crate::kernel::errno::{KResult, KernelError};

pub const PAGE_SHIFT: u32 = 12;
pub const PAGE_SIZE: u64 = 1 << PAGE_SHIFT;

const PAGE_HEADER: &str = "-pg#-  --------va--------   ----pa----   -PFN--";

/// Address translation used by the page walk.
pub trait VirtToPhys {
    fn virt_to_phys(&self, va: u64) -> Option<u64>;
}

/// Direct map: a contiguous virtual window over physical memory at a fixed
/// offset.
#[derive(Clone, Copy, Debug)]
pub struct LinearMap {
    virt_base: u64,
    phys_base: u64,
    len: u64,
}

impl LinearMap {
    pub fn new(virt_base: u64, phys_base: u64, len: u64) -> Self {
        LinearMap {
            virt_base,
            phys_base,
            len,
        }
    }
}

impl VirtToPhys for LinearMap {
    fn virt_to_phys(&self, va: u64) -> Option<u64> {
        let off = va.checked_sub(self.virt_base)?;
        (off < self.len).then(|| self.phys_base + off)
    }
}

/// Page-granular mapping, as a vmalloc area would have.
#[derive(Clone, Debug, Default)]
pub struct PageMap {
    frames: BTreeMap<u64, u64>,
}

impl PageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map the page at `va` to the frame at `pa`. Both must be page aligned.
    pub fn map(&mut self, va: u64, pa: u64) -> KResult<()> {
        if va % PAGE_SIZE != 0 || pa % PAGE_SIZE != 0 {
            return Err(KernelError::InvalidArgument("unaligned page mapping"));
        }
        self.frames.insert(va >> PAGE_SHIFT, pa >> PAGE_SHIFT);
        Ok(())
    }
}

impl VirtToPhys for PageMap {
    fn virt_to_phys(&self, va: u64) -> Option<u64> {
        self.frames
            .get(&(va >> PAGE_SHIFT))
            .map(|pfn| (pfn << PAGE_SHIFT) | (va & (PAGE_SIZE - 1)))
    }
}

/// One page of a walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRow {
    pub index: usize,
    pub va: u64,
    pub pa: u64,
    pub pfn: u64,
    /// Set only when contiguity checking is on and this frame does not
    /// follow the previous one.
    pub noncontiguous: bool,
}

/// Walk `len` bytes from `kaddr` page by page, logging and returning the
/// virtual address, physical address and PFN of each page.
pub fn show_phy_pages<M: VirtToPhys + ?Sized>(
    mapper: &M,
    kaddr: u64,
    len: usize,
    contiguity_check: bool,
) -> KResult<Vec<PageRow>> {
    if mapper.virt_to_phys(kaddr).is_none() {
        warn!("show_phy_pages(): invalid virtual address (0x{:x})", kaddr);
        return Err(KernelError::BadAddress(kaddr));
    }
    info!(
        "show_phy_pages(): start kaddr 0x{:x}, len {}, contiguity_check is {}",
        kaddr,
        len,
        if contiguity_check { "on" } else { "off" }
    );
    info!("{}", PAGE_HEADER);

    let len = len as u64;
    let pages = len / PAGE_SIZE + u64::from(len % PAGE_SIZE != 0);
    // Rows are pushed as pages resolve; `len` may run past the mapping.
    let mut rows = Vec::new();
    let mut prev_pfn = 0u64;
    for i in 0..pages {
        let va = i
            .checked_mul(PAGE_SIZE)
            .and_then(|off| kaddr.checked_add(off))
            .ok_or(KernelError::BadAddress(kaddr))?;
        let pa = mapper.virt_to_phys(va).ok_or(KernelError::BadAddress(va))?;
        let pfn = pa >> PAGE_SHIFT;

        let noncontiguous = contiguity_check && i > 0 && pfn != prev_pfn + 1;
        if noncontiguous {
            warn!(" *** physical NON-contiguity detected ***");
        }
        info!("{:05}  0x{:016x}   0x{:x}   {}", i, va, pa, pfn);
        if contiguity_check {
            prev_pfn = pfn;
        }
        rows.push(PageRow {
            index: i as usize,
            va,
            pa,
            pfn,
            noncontiguous,
        });
    }
    Ok(rows)
}

/// `base` to the power of `exponent`.
///
/// A zero base yields 0 for any exponent. Negative inputs are rejected and
/// results that do not fit a `u64` report `Overflow`.
pub fn powerof(base: i32, exponent: i32) -> KResult<u64> {
    if base == 0 {
        return Ok(0);
    }
    if base < 0 || exponent < 0 {
        return Err(KernelError::InvalidArgument("negative base or exponent"));
    }
    let base = base as u64;
    (0..exponent).try_fold(1u64, |acc, _| acc.checked_mul(base).ok_or(KernelError::Overflow))
}
