// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Board identification.
//!
//! The board ID register lives in the PL, so it is garbage until the PL load
//! check has passed.

use drv_nmx_boot_api::{
    regs, BoardIdPolicy, BoardIdentity, BootCheckError, Mmio,
};
use ringbuf::{ringbuf, ringbuf_entry};

#[derive(Copy, Clone, Debug, PartialEq)]
enum Trace {
    None,
    BoardId {
        raw: u32,
        policy: BoardIdPolicy,
        identity: BoardIdentity,
    },
}
ringbuf!(Trace, 4, Trace::None);

/// Reads the board ID register once and classifies it under `policy`.
pub fn identify_board<M: Mmio>(
    mmio: &mut M,
    policy: BoardIdPolicy,
) -> (u32, BoardIdentity) {
    let raw = mmio.read32(regs::BOARD_ID);
    let identity = policy.classify(raw);
    ringbuf_entry!(Trace::BoardId {
        raw,
        policy,
        identity
    });
    (raw, identity)
}

/// Like [`identify_board`], but a mismatch is an error. Returns the raw
/// register value on a match.
pub fn check_board<M: Mmio>(
    mmio: &mut M,
    policy: BoardIdPolicy,
) -> Result<u32, BootCheckError> {
    match identify_board(mmio, policy) {
        (raw, BoardIdentity::Match) => Ok(raw),
        (id, BoardIdentity::NoMatch) => {
            Err(BootCheckError::BoardIdentityMismatch { id })
        }
    }
}
