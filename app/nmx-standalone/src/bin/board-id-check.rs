// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Standalone board check: sets `board_id_check` and `shboottype`.

#![no_std]
#![no_main]

use core::ffi::{c_char, c_int};

#[no_mangle]
pub unsafe extern "C" fn main(_argc: c_int, argv: *const *const c_char) -> c_int {
    nmx_standalone::enter(argv, drv_nmx_boot::board_id_check)
}
