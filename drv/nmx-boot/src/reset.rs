// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PLL reset pulse and run-level handoff.

use drv_nmx_boot_api::{regs, Mmio, PllDomain, PllReset};
use ringbuf::{ringbuf, ringbuf_entry};

#[derive(Copy, Clone, Debug, PartialEq)]
enum Trace {
    None,
    ResetAsserted(PllReset),
    ResetReleased,
    RunLevel(u32),
}
ringbuf!(Trace, 4, Trace::None);

/// Pulses reset on both PLLs so they relock with the new phases, then tells
/// the companion processor that the PLLs are loaded.
///
/// Assert and release are back to back, and nothing reads the reset register
/// back. The FPGA is expected to latch the pulse synchronously; if a board
/// ever needs a minimum pulse width, it has to be added here.
pub fn pulse_resets_and_signal<M: Mmio>(mmio: &mut M) {
    let all = PllDomain::ALL
        .iter()
        .fold(PllReset::empty(), |acc, d| acc | d.reset_bit());

    mmio.write32(regs::PLL_RESET, all.bits());
    ringbuf_entry!(Trace::ResetAsserted(all));
    mmio.write32(regs::PLL_RESET, PllReset::empty().bits());
    ringbuf_entry!(Trace::ResetReleased);

    mmio.write32(regs::RUN_LEVEL, regs::PLL_LOAD_COMPLETE);
    ringbuf_entry!(Trace::RunLevel(regs::PLL_LOAD_COMPLETE));
}
