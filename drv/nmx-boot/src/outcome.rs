// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Publishes the result of the board checks for the next boot stage.

use drv_nmx_boot_api::{
    BootCheckError, BootType, Env, OutcomeReport, ReturnCode, BOARD_ID_CHECK_VAR,
    BOOT_TYPE_VAR,
};
use ringbuf::{ringbuf, ringbuf_entry};

#[derive(Copy, Clone, Debug, PartialEq)]
enum Trace {
    None,
    Published {
        code: &'static str,
        boot_type: Option<BootType>,
        rc: ReturnCode,
    },
}
ringbuf!(Trace, 4, Trace::None);

/// Writes `board_id_check` (and `shboottype`, if `report` asks for it) for
/// `result`, returning the matching exit code.
///
/// Only a passing check selects the normal boot path.
pub fn publish<E: Env, T>(
    env: &mut E,
    report: &OutcomeReport,
    result: &Result<T, BootCheckError>,
) -> ReturnCode {
    let code = report.codes.for_result(result);
    env.set(BOARD_ID_CHECK_VAR, code);

    let boot_type = if report.publish_boot_type {
        let bt = match result {
            Ok(_) => BootType::Normal,
            Err(_) => BootType::Fallback,
        };
        env.set(BOOT_TYPE_VAR, bt.as_str());
        Some(bt)
    } else {
        None
    };

    let rc = ReturnCode::from(result);
    ringbuf_entry!(Trace::Published {
        code,
        boot_type,
        rc
    });
    rc
}
