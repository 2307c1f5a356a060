// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Glue for running the NMx bring-up procedures as U-Boot standalone
//! applications.
//!
//! U-Boot exposes a small jump table to standalone programs (`exports.h`);
//! the symbols declared here resolve against U-Boot's `stubs.o`, which must
//! be linked into the image. Load the result at the board's
//! `CONFIG_STANDALONE_LOAD_ADDR` and start it with `go`.
//!
//! U-Boot propagates the program's return value as the exit status of `go`,
//! so boot scripts can branch on it as well as on the environment variables
//! it sets.

#![no_std]

use core::ffi::{c_char, c_int, c_ulong};

use drv_nmx_boot_api::{Delay, Env, PhysMmio, ReturnCode};

mod ffi {
    use core::ffi::{c_char, c_int, c_ulong};

    extern "C" {
        pub fn app_startup(argv: *const *const c_char);
        pub fn udelay(usec: c_ulong);
        pub fn env_set(varname: *const c_char, value: *const c_char) -> c_int;
    }
}

/// Longest name or value we will hand to `env_set`, including the NUL.
const ENV_STR_MAX: usize = 32;

/// U-Boot's services, as seen by the bring-up procedures.
pub struct UBoot {
    _private: (),
}

impl UBoot {
    /// Runs U-Boot's standalone startup (jump table setup and ABI version
    /// check). This must happen before any other export is called.
    ///
    /// # Safety
    ///
    /// Must be called exactly once, with the `argv` U-Boot passed to the
    /// program entry point.
    pub unsafe fn startup(argv: *const *const c_char) -> Self {
        ffi::app_startup(argv);
        Self { _private: () }
    }
}

impl Delay for UBoot {
    fn delay_us(&mut self, us: u32) {
        // Safety: `startup` has run.
        unsafe { ffi::udelay(us as c_ulong) }
    }
}

impl Env for UBoot {
    fn set(&mut self, name: &str, value: &str) {
        // Names and values are all short compile-time strings; one that
        // doesn't fit is a bug, and leaving the variable unset makes the next
        // stage take its default path.
        let (Some(name), Some(value)) = (c_string(name), c_string(value))
        else {
            return;
        };
        // Safety: `startup` has run, and both buffers are NUL-terminated and
        // outlive the call.
        unsafe {
            ffi::env_set(
                name.as_ptr() as *const c_char,
                value.as_ptr() as *const c_char,
            );
        }
    }
}

fn c_string(s: &str) -> Option<heapless::Vec<u8, ENV_STR_MAX>> {
    if s.as_bytes().contains(&0) {
        return None;
    }
    let mut buf = heapless::Vec::new();
    buf.extend_from_slice(s.as_bytes()).ok()?;
    buf.push(0).ok()?;
    Some(buf)
}

/// Common entry point: starts up U-Boot services, runs `procedure` against
/// the physical register map, and converts the result to an exit status.
///
/// # Safety
///
/// Must be called once, from the program entry point, with U-Boot's `argv`.
pub unsafe fn enter(
    argv: *const *const c_char,
    procedure: fn(&mut UBoot, &mut PhysMmio) -> ReturnCode,
) -> c_int {
    let mut host = UBoot::startup(argv);
    // Safety: U-Boot runs single-threaded with the MMU identity-mapping the
    // PS and PL register windows as device memory, and nothing else in the
    // system is running while we are.
    let mut mmio = PhysMmio::new();
    c_int::from(procedure(&mut host, &mut mmio))
}

#[cfg(target_os = "none")]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo<'_>) -> ! {
    // There is no unwinding back into U-Boot; park the core so the state is
    // inspectable over JTAG.
    loop {
        core::hint::spin_loop();
    }
}
