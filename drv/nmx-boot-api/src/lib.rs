// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! API crate for the NMx boot-time bring-up programs.
//!
//! This holds the register map, the result and error types shared by the
//! bring-up procedures, and the traits through which they reach the hosting
//! bootloader: [`Mmio`] for register access, [`Delay`] for busy-waits, and
//! [`Env`] for the environment variables the next boot stage reads.

#![cfg_attr(not(test), no_std)]

pub mod regs;

pub use regs::{DevcfgIntSts, PhaseReg, PhaseShape, PllDomain, PllReset};

use vcell::VolatileCell;

/// Reference board ID for the CPRI RF board.
pub const CPRI_BOARD_ID: u32 = 0x4100;

/// Environment variable holding the board check result.
pub const BOARD_ID_CHECK_VAR: &str = "board_id_check";
/// Environment variable selecting the boot path.
pub const BOOT_TYPE_VAR: &str = "shboottype";

/// Time to wait before trusting PL_DONE, in microseconds.
pub const PL_SETTLE_US: u32 = 100 * 1000;
/// Settle time after each PLL phase-block write, in microseconds.
pub const PLL_SETTLE_US: u32 = 1;

////////////////////////////////////////////////////////////////////////////////

/// Trait implementing raw access to memory-mapped registers.
///
/// Every call must reach the bus, in program order: implementations may not
/// cache, merge or elide accesses.
pub trait Mmio {
    fn read32(&mut self, addr: u32) -> u32;

    fn write32(&mut self, addr: u32, value: u32);

    /// Performs a read-modify-write, returning the values read and written.
    fn modify32<F>(&mut self, addr: u32, f: F) -> (u32, u32)
    where
        F: FnOnce(u32) -> u32,
    {
        let before = self.read32(addr);
        let after = f(before);
        self.write32(addr, after);
        (before, after)
    }
}

impl<M: Mmio> Mmio for &mut M {
    fn read32(&mut self, addr: u32) -> u32 {
        (**self).read32(addr)
    }

    fn write32(&mut self, addr: u32, value: u32) {
        (**self).write32(addr, value)
    }
}

/// Register access through physical addresses.
///
/// The bootloader runs with the MMU either off or identity-mapped and the
/// device regions uncached, so a physical address is directly usable as a
/// pointer.
pub struct PhysMmio {
    _private: (),
}

impl PhysMmio {
    /// # Safety
    ///
    /// The caller must ensure that every address handed to this `PhysMmio`
    /// is a mapped, uncached device register, and that nothing else is
    /// touching those registers for as long as it is in use.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }

    fn cell(addr: u32) -> &'static VolatileCell<u32> {
        // Safety: by the contract on `new`, `addr` is a mapped device
        // register, and `VolatileCell<u32>` is `repr(transparent)` over it.
        unsafe { &*(addr as usize as *const VolatileCell<u32>) }
    }
}

impl Mmio for PhysMmio {
    #[inline(always)]
    fn read32(&mut self, addr: u32) -> u32 {
        Self::cell(addr).get()
    }

    #[inline(always)]
    fn write32(&mut self, addr: u32, value: u32) {
        Self::cell(addr).set(value)
    }
}

/// Busy-wait delay provided by the host.
pub trait Delay {
    /// Blocks for at least `us` microseconds.
    fn delay_us(&mut self, us: u32);
}

/// Persistent environment provided by the host.
pub trait Env {
    fn set(&mut self, name: &str, value: &str);
}

////////////////////////////////////////////////////////////////////////////////

/// Things that end a bring-up procedure early.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BootCheckError {
    /// PL_DONE was clear after the settle delay; `status` is the raw
    /// DEVCFG_INT_STS value.
    ProgrammableLogicNotReady { status: u32 },
    /// The board ID register failed the masking comparison.
    BoardIdentityMismatch { id: u32 },
}

/// Exit code handed back to the bootloader.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum ReturnCode {
    Ok = 0,
    Error = 1,
}

impl<T> From<&Result<T, BootCheckError>> for ReturnCode {
    fn from(r: &Result<T, BootCheckError>) -> Self {
        match r {
            Ok(_) => ReturnCode::Ok,
            Err(_) => ReturnCode::Error,
        }
    }
}

impl From<ReturnCode> for i32 {
    fn from(rc: ReturnCode) -> Self {
        rc as i32
    }
}

/// Result of comparing the board ID register against [`CPRI_BOARD_ID`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoardIdentity {
    Match,
    NoMatch,
}

/// How the board ID register is compared against [`CPRI_BOARD_ID`].
///
/// The two bring-up programs have historically disagreed about this, so the
/// policy is a parameter rather than a constant. Which one new boards should
/// use is still open.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoardIdPolicy {
    /// The low 12 bits must equal the reference's low 12 bits.
    LowBits12,
    /// Everything above the low byte must equal the reference.
    IgnoreLowByte,
    /// Every bit set in the reference must be set in the register. This is
    /// the literal test the board check program has shipped with.
    AllReferenceBits,
}

impl BoardIdPolicy {
    pub const fn mask(self) -> u32 {
        match self {
            BoardIdPolicy::LowBits12 => 0xFFF,
            BoardIdPolicy::IgnoreLowByte => !0xFF,
            BoardIdPolicy::AllReferenceBits => CPRI_BOARD_ID,
        }
    }

    pub const fn classify(self, raw: u32) -> BoardIdentity {
        let mask = self.mask();
        if raw & mask == CPRI_BOARD_ID & mask {
            BoardIdentity::Match
        } else {
            BoardIdentity::NoMatch
        }
    }
}

/// Boot path for the next stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BootType {
    Normal,
    Fallback,
}

impl BootType {
    pub const fn as_str(self) -> &'static str {
        match self {
            BootType::Normal => "normal",
            BootType::Fallback => "fallback",
        }
    }
}

/// Strings written to [`BOARD_ID_CHECK_VAR`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OutcomeCodes {
    pub pass: &'static str,
    pub fail: &'static str,
    pub pl_load_fail: &'static str,
}

impl OutcomeCodes {
    /// Codes read by the board check consumers.
    pub const NUMERIC: Self = Self {
        pass: "0",
        fail: "1",
        pl_load_fail: "2",
    };

    /// Codes read by the PLL reconfigure consumers.
    pub const NAMED: Self = Self {
        pass: "pass",
        fail: "fail",
        pl_load_fail: "2",
    };

    pub fn for_result<T>(&self, r: &Result<T, BootCheckError>) -> &'static str {
        match r {
            Ok(_) => self.pass,
            Err(BootCheckError::ProgrammableLogicNotReady { .. }) => {
                self.pl_load_fail
            }
            Err(BootCheckError::BoardIdentityMismatch { .. }) => self.fail,
        }
    }
}

/// What the outcome publisher writes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OutcomeReport {
    pub codes: OutcomeCodes,
    /// Whether [`BOOT_TYPE_VAR`] is written alongside the check result.
    pub publish_boot_type: bool,
}
