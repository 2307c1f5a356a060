// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Physical register map for the NMx controller and the Zynq PS registers it
//! depends on.
//!
//! Addresses here are bit-exact with the FPGA images in the field; don't
//! "tidy" them.

use static_assertions::const_assert_eq;

/// Zynq DEVCFG interrupt status register. PL_DONE is only meaningful once the
/// bitstream load has had time to finish.
pub const DEVCFG_INT_STS: u32 = 0xF800_700C;

/// RF board I/O block, mapped by the PL.
pub const RF_BOARD_IO_BASE: u32 = 0x43C0_0000;
pub const BOARD_ID_OFFSET: u32 = 0x10;
pub const BOARD_ID: u32 = RF_BOARD_IO_BASE + BOARD_ID_OFFSET;

/// NMx I/O window shared with the companion processor.
pub const NMX_IO_BASE: u32 = 0x4800_0000;
pub const NMX_IO_SIZE: u32 = 0x1_0000;

/// CPU0 run-level register, polled by the companion processor.
pub const RUN_LEVEL: u32 = NMX_IO_BASE + 0x8;
pub const PLL_LOAD_COMPLETE: u32 = 0x1;

/// NMx FPGA PLL reset register.
pub const PLL_RESET: u32 = 0x4820_0000;
pub const PLL_RESET_SIZE: u32 = 0x1000;

/// NMx FPGA PLL clock phase register block.
pub const PLL_PHASE_BASE: u32 = 0x4900_0000;
pub const PLL_A_ENABLE_OFFSET: u32 = 0x100;
pub const PLL_B_ENABLE_OFFSET: u32 = 0x300;

/// Value written to each PLL enable register.
pub const PLL_ENABLE_ALL: u32 = 0xFFFF;

// Every register is a naturally aligned word.
const_assert_eq!(DEVCFG_INT_STS % 4, 0);
const_assert_eq!(BOARD_ID % 4, 0);
const_assert_eq!(RUN_LEVEL % 4, 0);
const_assert_eq!(PLL_RESET % 4, 0);

bitflags::bitflags! {
    /// Bits of interest in [`DEVCFG_INT_STS`].
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct DevcfgIntSts: u32 {
        /// PL configuration done.
        const PL_DONE = 1 << 2;
    }

    /// Bits of [`PLL_RESET`]. Set to assert reset, clear to release.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct PllReset: u32 {
        const PLL_A = 1 << 0;
        const PLL_B = 1 << 1;
    }
}

/// One of the two NMx FPGA PLLs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PllDomain {
    A,
    B,
}

impl PllDomain {
    pub const ALL: [PllDomain; 2] = [PllDomain::A, PllDomain::B];

    pub const fn enable_addr(self) -> u32 {
        PLL_PHASE_BASE
            + match self {
                PllDomain::A => PLL_A_ENABLE_OFFSET,
                PllDomain::B => PLL_B_ENABLE_OFFSET,
            }
    }

    pub const fn reset_bit(self) -> PllReset {
        match self {
            PllDomain::A => PllReset::PLL_A,
            PllDomain::B => PllReset::PLL_B,
        }
    }
}

/// Layout of a clock phase register.
///
/// The phase registers are 16 bits wide. The preserve masks only cover the
/// low half, so a read-modify-write leaves bits 16-31 clear.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PhaseShape {
    /// Phase in bits 13-15; bits 0-12 are kept.
    Register1,
    /// Phase in bits 0-4; bits 5-15 are kept.
    Register2,
}

impl PhaseShape {
    pub const fn shift(self) -> u32 {
        match self {
            PhaseShape::Register1 => 13,
            PhaseShape::Register2 => 0,
        }
    }

    pub const fn field_mask(self) -> u32 {
        match self {
            PhaseShape::Register1 => 0xE000,
            PhaseShape::Register2 => 0x001F,
        }
    }

    pub const fn preserve_mask(self) -> u32 {
        match self {
            PhaseShape::Register1 => 0x1FFF,
            PhaseShape::Register2 => 0xFFE0,
        }
    }

    /// Largest phase value the field can hold.
    pub const fn max_phase(self) -> u8 {
        (self.field_mask() >> self.shift()) as u8
    }

    /// Computes the new register contents given the current contents.
    ///
    /// A phase wider than the field is truncated to the field.
    pub const fn apply(self, current: u32, phase: u8) -> u32 {
        (current & self.preserve_mask())
            | (((phase as u32) << self.shift()) & self.field_mask())
    }

    /// Extracts the phase field from register contents.
    pub const fn phase_of(self, value: u32) -> u8 {
        ((value & self.field_mask()) >> self.shift()) as u8
    }
}

const_assert_eq!(
    PhaseShape::Register1.field_mask() & PhaseShape::Register1.preserve_mask(),
    0
);
const_assert_eq!(
    PhaseShape::Register2.field_mask() & PhaseShape::Register2.preserve_mask(),
    0
);
const_assert_eq!(
    PhaseShape::Register1.field_mask() | PhaseShape::Register1.preserve_mask(),
    0xFFFF
);
const_assert_eq!(
    PhaseShape::Register2.field_mask() | PhaseShape::Register2.preserve_mask(),
    0xFFFF
);

/// The clock phase registers, named by the link they align.
///
/// "Module" registers sit between the NMx module and its controller on PLL A.
/// "Product B" registers sit between the module and product B; RX1/RX2 live
/// in PLL B's 0x200 window, while TX1/TX2 are wired into PLL A's window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PhaseReg {
    ModuleRx1,
    ModuleRx2,
    ModuleTx1,
    ModuleTx2,
    ProdBRx1,
    ProdBRx2,
    ProdBTx1,
    ProdBTx2,
}

impl PhaseReg {
    pub const fn offset(self) -> u32 {
        match self {
            PhaseReg::ModuleRx1 => 0x20,
            PhaseReg::ModuleRx2 => 0x24,
            PhaseReg::ModuleTx1 => 0x28,
            PhaseReg::ModuleTx2 => 0x2C,
            PhaseReg::ProdBRx1 => 0x220,
            PhaseReg::ProdBRx2 => 0x224,
            PhaseReg::ProdBTx1 => 0x38,
            PhaseReg::ProdBTx2 => 0x3C,
        }
    }

    pub const fn addr(self) -> u32 {
        PLL_PHASE_BASE + self.offset()
    }

    pub const fn shape(self) -> PhaseShape {
        match self {
            PhaseReg::ModuleRx1
            | PhaseReg::ModuleTx1
            | PhaseReg::ProdBRx1
            | PhaseReg::ProdBTx1 => PhaseShape::Register1,
            PhaseReg::ModuleRx2
            | PhaseReg::ModuleTx2
            | PhaseReg::ProdBRx2
            | PhaseReg::ProdBTx2 => PhaseShape::Register2,
        }
    }
}
