// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! NMx FPGA PLL clock phase programming.
//!
//! The NMx module and the product logic on the other side of its links are
//! clocked from two PLLs in the NMx FPGA. Out of configuration the PLL output
//! phases are arbitrary, and a link whose RX or TX clock lands on the wrong
//! phase trains up fine and then drops data. This module loads the phase
//! select fields with values characterized on the bench.
//!
//! # Ordering
//!
//! Both PLLs must be enabled before any phase register is touched, and each
//! write needs a short settle before the next one. The phase select field
//! shares its register with other configuration, so every phase write is a
//! read-modify-write.
//!
//! The new phases only take effect once the PLLs are reset, which is the job
//! of [`crate::reset`]. Until then the run-level register must not say that
//! the PLLs are loaded.

use drv_nmx_boot_api::{
    regs, Delay, Mmio, PhaseReg, PllDomain, PLL_SETTLE_US,
};
use ringbuf::{ringbuf, ringbuf_entry};
use static_assertions::const_assert;

#[derive(Copy, Clone, Debug, PartialEq)]
enum Trace {
    None,
    Enabled(PllDomain),
    Phase {
        reg: PhaseReg,
        before: u32,
        after: u32,
    },
    Done,
}
ringbuf!(Trace, 16, Trace::None);

/// One phase register and the phase to load into it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PhaseSetting {
    pub reg: PhaseReg,
    pub phase: u8,
}

impl PhaseSetting {
    pub const fn new(reg: PhaseReg, phase: u8) -> Self {
        Self { reg, phase }
    }
}

/// The full set of phase writes, applied in order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PhaseTable {
    pub settings: [PhaseSetting; 8],
}

impl PhaseTable {
    /// Phases for the NMx module on the CPRI board.
    pub const NMX: Self = Self {
        settings: [
            // Module <--> controller
            PhaseSetting::new(PhaseReg::ModuleRx1, 4),
            PhaseSetting::new(PhaseReg::ModuleRx2, 0),
            PhaseSetting::new(PhaseReg::ModuleTx1, 6),
            PhaseSetting::new(PhaseReg::ModuleTx2, 0),
            // Module <--> product B
            PhaseSetting::new(PhaseReg::ProdBRx1, 2),
            PhaseSetting::new(PhaseReg::ProdBRx2, 0),
            PhaseSetting::new(PhaseReg::ProdBTx1, 2),
            PhaseSetting::new(PhaseReg::ProdBTx2, 0),
        ],
    };

    /// Checks that every phase fits its register's field.
    pub const fn fits(&self) -> bool {
        let mut i = 0;
        while i < self.settings.len() {
            let s = self.settings[i];
            if s.phase > s.reg.shape().max_phase() {
                return false;
            }
            i += 1;
        }
        true
    }
}

const_assert!(PhaseTable::NMX.fits());

/// Enables both PLLs and loads every phase in `table`.
///
/// Must only run after the PL load and board checks have passed: the phase
/// block is PL logic, and on the wrong board these addresses belong to
/// something else.
pub fn program_phases<M: Mmio, D: Delay>(
    mmio: &mut M,
    delay: &mut D,
    table: &PhaseTable,
) {
    for domain in PllDomain::ALL {
        mmio.write32(domain.enable_addr(), regs::PLL_ENABLE_ALL);
        ringbuf_entry!(Trace::Enabled(domain));
    }
    delay.delay_us(PLL_SETTLE_US);

    for s in &table.settings {
        set_phase(mmio, delay, s.reg, s.phase);
    }
    ringbuf_entry!(Trace::Done);
}

/// Read-modify-writes a single phase field, then settles.
pub fn set_phase<M: Mmio, D: Delay>(
    mmio: &mut M,
    delay: &mut D,
    reg: PhaseReg,
    phase: u8,
) {
    let shape = reg.shape();
    let (before, after) =
        mmio.modify32(reg.addr(), |v| shape.apply(v, phase));
    ringbuf_entry!(Trace::Phase { reg, before, after });
    delay.delay_us(PLL_SETTLE_US);
}
