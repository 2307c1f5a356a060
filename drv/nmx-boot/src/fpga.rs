// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PL load check.

use drv_nmx_boot_api::{
    regs, BootCheckError, Delay, DevcfgIntSts, Mmio, PL_SETTLE_US,
};
use ringbuf::{ringbuf, ringbuf_entry};

#[derive(Copy, Clone, Debug, PartialEq)]
enum Trace {
    None,
    Settle(u32),
    Status(u32),
    NotReady,
}
ringbuf!(Trace, 4, Trace::None);

/// Waits out the PL settle time, then checks PL_DONE exactly once.
///
/// Nothing that lives in the PL may be touched unless this succeeds.
pub fn verify_pl_loaded<M: Mmio, D: Delay>(
    mmio: &mut M,
    delay: &mut D,
) -> Result<(), BootCheckError> {
    ringbuf_entry!(Trace::Settle(PL_SETTLE_US));
    delay.delay_us(PL_SETTLE_US);

    let status = mmio.read32(regs::DEVCFG_INT_STS);
    ringbuf_entry!(Trace::Status(status));

    if DevcfgIntSts::from_bits_retain(status).contains(DevcfgIntSts::PL_DONE) {
        Ok(())
    } else {
        ringbuf_entry!(Trace::NotReady);
        Err(BootCheckError::ProgrammableLogicNotReady { status })
    }
}
