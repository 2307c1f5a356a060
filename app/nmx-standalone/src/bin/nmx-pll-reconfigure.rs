// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Standalone NMx PLL clock phase loader.
//!
//! Checks the board, sets `board_id_check`, and on a CPRI board loads the
//! NMx FPGA PLL clock phases, pulses the PLL resets, and raises the CPU0 run
//! level for the companion processor.

#![no_std]
#![no_main]

use core::ffi::{c_char, c_int};

#[no_mangle]
pub unsafe extern "C" fn main(_argc: c_int, argv: *const *const c_char) -> c_int {
    nmx_standalone::enter(argv, drv_nmx_boot::nmx_pll_reconfigure)
}
