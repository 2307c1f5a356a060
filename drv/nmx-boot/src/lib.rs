// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boot-time bring-up for the NMx controller.
//!
//! Two procedures run from the bootloader before the OS is started:
//!
//! - [`board_id_check`] confirms the PL is loaded and that this is a CPRI
//!   board, and picks the boot path (`shboottype`) for the next stage.
//! - [`nmx_pll_reconfigure`] runs the same checks and, if they pass, aligns
//!   the NMx FPGA PLL clock phases and hands off to the companion processor.
//!
//! Both are the same sequence with different [`ProcedureConfig`]s:
//!
//! 1. wait for the PL to settle and check PL_DONE ([`fpga`]),
//! 2. read and classify the board ID ([`board_id`]),
//! 3. publish the result to the environment ([`outcome`]),
//! 4. if configured and the checks passed, program the PLL phases ([`pll`])
//!    and pulse the PLL resets ([`reset`]).
//!
//! A failed check ends the procedure at step 3. Nothing in the PLL blocks is
//! touched unless both checks have passed.

#![cfg_attr(not(test), no_std)]

pub mod board_id;
pub mod fpga;
pub mod outcome;
pub mod pll;
pub mod reset;

#[cfg(test)]
mod fake;

use drv_nmx_boot_api::{
    BoardIdPolicy, BootCheckError, Delay, Env, Mmio, OutcomeCodes,
    OutcomeReport, ReturnCode,
};
use ringbuf::{ringbuf, ringbuf_entry};

pub use pll::{PhaseSetting, PhaseTable};

#[derive(Copy, Clone, Debug, PartialEq)]
enum Trace {
    None,
    Start(BoardIdPolicy),
    Checked(Result<u32, BootCheckError>),
    PllsLoaded,
    Exit(ReturnCode),
}
ringbuf!(Trace, 8, Trace::None);

/// What a bring-up procedure checks and does.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProcedureConfig {
    /// How the board ID is matched.
    pub policy: BoardIdPolicy,
    /// What gets written to the environment.
    pub outcome: OutcomeReport,
    /// Phases to load once the checks pass; `None` stops after publishing.
    pub phases: Option<PhaseTable>,
}

impl ProcedureConfig {
    pub const BOARD_ID_CHECK: Self = Self {
        policy: BoardIdPolicy::LowBits12,
        outcome: OutcomeReport {
            codes: OutcomeCodes::NUMERIC,
            publish_boot_type: true,
        },
        phases: None,
    };

    pub const NMX_PLL_RECONFIGURE: Self = Self {
        policy: BoardIdPolicy::IgnoreLowByte,
        outcome: OutcomeReport {
            codes: OutcomeCodes::NAMED,
            publish_boot_type: false,
        },
        phases: Some(PhaseTable::NMX),
    };
}

/// Runs the PL load and board checks, in that order, stopping at the first
/// failure. Returns the raw board ID on success.
pub fn check<M: Mmio, D: Delay>(
    mmio: &mut M,
    delay: &mut D,
    policy: BoardIdPolicy,
) -> Result<u32, BootCheckError> {
    fpga::verify_pl_loaded(mmio, delay)?;
    board_id::check_board(mmio, policy)
}

/// Runs a bring-up procedure described by `config`.
pub fn run<H, M>(host: &mut H, mmio: &mut M, config: &ProcedureConfig) -> ReturnCode
where
    H: Delay + Env,
    M: Mmio,
{
    ringbuf_entry!(Trace::Start(config.policy));

    let result = check(mmio, host, config.policy);
    ringbuf_entry!(Trace::Checked(result));

    let rc = outcome::publish(host, &config.outcome, &result);

    if result.is_ok() {
        if let Some(table) = &config.phases {
            pll::program_phases(mmio, host, table);
            reset::pulse_resets_and_signal(mmio);
            ringbuf_entry!(Trace::PllsLoaded);
        }
    }

    ringbuf_entry!(Trace::Exit(rc));
    rc
}

/// Checks the board and selects the boot path for the next stage.
pub fn board_id_check<H, M>(host: &mut H, mmio: &mut M) -> ReturnCode
where
    H: Delay + Env,
    M: Mmio,
{
    run(host, mmio, &ProcedureConfig::BOARD_ID_CHECK)
}

/// Checks the board, then loads the NMx PLL clock phases.
pub fn nmx_pll_reconfigure<H, M>(host: &mut H, mmio: &mut M) -> ReturnCode
where
    H: Delay + Env,
    M: Mmio,
{
    run(host, mmio, &ProcedureConfig::NMX_PLL_RECONFIGURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{new_log, touched, writes, Event, FakeHost, FakeMmio};
    use drv_nmx_boot_api::{regs, PhaseReg};
    use proptest::prelude::*;

    const NOISY_DONE: u32 = 0x0000_0004 | 0x8000_0030;

    fn is_pll_addr(addr: u32) -> bool {
        (regs::PLL_PHASE_BASE..regs::PLL_PHASE_BASE + 0x1000).contains(&addr)
            || addr == regs::PLL_RESET
            || addr == regs::RUN_LEVEL
    }

    #[test]
    fn board_id_check_pass() {
        let log = new_log();
        let mut mmio = FakeMmio::new(&log)
            .with(regs::DEVCFG_INT_STS, NOISY_DONE)
            .with(regs::BOARD_ID, 0x4100);
        let mut host = FakeHost::new(&log);

        assert_eq!(board_id_check(&mut host, &mut mmio), ReturnCode::Ok);
        assert_eq!(host.var("board_id_check"), Some("0"));
        assert_eq!(host.var("shboottype"), Some("normal"));
        assert_eq!(touched(&log), vec![regs::DEVCFG_INT_STS, regs::BOARD_ID]);
    }

    #[test]
    fn board_id_check_wrong_board() {
        let log = new_log();
        let mut mmio = FakeMmio::new(&log)
            .with(regs::DEVCFG_INT_STS, 0x4)
            .with(regs::BOARD_ID, 0x4105);
        let mut host = FakeHost::new(&log);

        assert_eq!(board_id_check(&mut host, &mut mmio), ReturnCode::Error);
        assert_eq!(host.var("board_id_check"), Some("1"));
        assert_eq!(host.var("shboottype"), Some("fallback"));
    }

    #[test]
    fn board_id_check_pl_not_loaded() {
        let log = new_log();
        let mut mmio = FakeMmio::new(&log).with(regs::BOARD_ID, 0x4100);
        let mut host = FakeHost::new(&log);

        assert_eq!(board_id_check(&mut host, &mut mmio), ReturnCode::Error);
        assert_eq!(host.var("board_id_check"), Some("2"));
        assert_eq!(host.var("shboottype"), Some("fallback"));
        assert_eq!(touched(&log), vec![regs::DEVCFG_INT_STS]);
    }

    #[test]
    fn pll_reconfigure_end_to_end() {
        let log = new_log();
        let mut mmio = FakeMmio::new(&log)
            .with(regs::DEVCFG_INT_STS, NOISY_DONE)
            .with(regs::BOARD_ID, 0x4100)
            .with(regs::PLL_RESET, 0x3);
        for reg in [PhaseReg::ModuleRx1, PhaseReg::ProdBRx2] {
            mmio = mmio.with(reg.addr(), 0x5A5A);
        }
        let mut host = FakeHost::new(&log);

        assert_eq!(nmx_pll_reconfigure(&mut host, &mut mmio), ReturnCode::Ok);
        assert_eq!(host.var("board_id_check"), Some("pass"));
        assert_eq!(host.var("shboottype"), None);

        for s in &PhaseTable::NMX.settings {
            let value = mmio.get(s.reg.addr());
            assert_eq!(s.reg.shape().phase_of(value), s.phase, "{:?}", s.reg);
        }
        // 0x5A5A & 0x1FFF | 4 << 13
        assert_eq!(mmio.get(PhaseReg::ModuleRx1.addr()), 0x9A5A);
        // 0x5A5A & 0xFFE0
        assert_eq!(mmio.get(PhaseReg::ProdBRx2.addr()), 0x5A40);
        assert_eq!(mmio.get(regs::PLL_RESET), 0);
        assert_eq!(mmio.get(regs::RUN_LEVEL), 0x1);

        // The environment is written before anything in the PLL blocks.
        let events = log.borrow();
        let set_at = events
            .iter()
            .position(|e| matches!(e, Event::SetEnv(..)))
            .unwrap();
        let first_pll = events
            .iter()
            .position(|e| matches!(e, Event::Write { addr, .. } if is_pll_addr(*addr)))
            .unwrap();
        assert!(set_at < first_pll);

        // And the run level is the very last thing written.
        assert_eq!(
            writes(&log).last(),
            Some(&(regs::RUN_LEVEL, regs::PLL_LOAD_COMPLETE))
        );
    }

    #[test]
    fn pll_reconfigure_full_sequence() {
        let log = new_log();
        let mut mmio = FakeMmio::new(&log)
            .with(regs::DEVCFG_INT_STS, 0x4)
            .with(regs::BOARD_ID, 0x41FF);
        let mut host = FakeHost::new(&log);
        assert_eq!(nmx_pll_reconfigure(&mut host, &mut mmio), ReturnCode::Ok);

        let mut expect = vec![
            Event::Delay(100_000),
            Event::Read {
                addr: 0xF800_700C,
                value: 0x4,
            },
            Event::Read {
                addr: 0x43C0_0010,
                value: 0x41FF,
            },
            Event::SetEnv("board_id_check".into(), "pass".into()),
            Event::Write {
                addr: 0x4900_0100,
                value: 0xFFFF,
            },
            Event::Write {
                addr: 0x4900_0300,
                value: 0xFFFF,
            },
            Event::Delay(1),
        ];
        for s in &PhaseTable::NMX.settings {
            let addr = s.reg.addr();
            expect.push(Event::Read { addr, value: 0 });
            expect.push(Event::Write {
                addr,
                value: s.reg.shape().apply(0, s.phase),
            });
            expect.push(Event::Delay(1));
        }
        expect.extend([
            Event::Write {
                addr: 0x4820_0000,
                value: 0x3,
            },
            Event::Write {
                addr: 0x4820_0000,
                value: 0,
            },
            Event::Write {
                addr: 0x4800_0008,
                value: 0x1,
            },
        ]);
        assert_eq!(*log.borrow(), expect);
    }

    #[test]
    fn pll_reconfigure_pl_not_loaded() {
        let log = new_log();
        let mut mmio = FakeMmio::new(&log)
            .with(regs::DEVCFG_INT_STS, 0x0)
            .with(regs::BOARD_ID, 0x4100);
        let mut host = FakeHost::new(&log);

        assert_eq!(
            nmx_pll_reconfigure(&mut host, &mut mmio),
            ReturnCode::Error
        );
        assert_eq!(host.var("board_id_check"), Some("2"));
        assert_eq!(host.var("shboottype"), None);
        assert_eq!(touched(&log), vec![regs::DEVCFG_INT_STS]);
        assert!(writes(&log).is_empty());
    }

    #[test]
    fn pll_reconfigure_wrong_board() {
        let log = new_log();
        let mut mmio = FakeMmio::new(&log)
            .with(regs::DEVCFG_INT_STS, 0x4)
            .with(regs::BOARD_ID, 0x4200);
        let mut host = FakeHost::new(&log);

        assert_eq!(
            nmx_pll_reconfigure(&mut host, &mut mmio),
            ReturnCode::Error
        );
        assert_eq!(host.var("board_id_check"), Some("fail"));
        assert!(writes(&log).is_empty());
    }

    #[test]
    fn check_stops_at_first_failure() {
        let log = new_log();
        let mut mmio = FakeMmio::new(&log).with(regs::BOARD_ID, 0x4100);
        let mut host = FakeHost::new(&log);
        assert_eq!(
            check(&mut mmio, &mut host, BoardIdPolicy::LowBits12),
            Err(BootCheckError::ProgrammableLogicNotReady { status: 0 })
        );
        assert_eq!(touched(&log), vec![regs::DEVCFG_INT_STS]);
    }

    proptest! {
        #[test]
        fn no_pll_writes_without_pl_done(status: u32, board_id: u32) {
            let status = status & !0x4;
            for config in [
                ProcedureConfig::BOARD_ID_CHECK,
                ProcedureConfig::NMX_PLL_RECONFIGURE,
            ] {
                let log = new_log();
                let mut mmio = FakeMmio::new(&log)
                    .with(regs::DEVCFG_INT_STS, status)
                    .with(regs::BOARD_ID, board_id);
                let mut host = FakeHost::new(&log);

                prop_assert_eq!(
                    run(&mut host, &mut mmio, &config),
                    ReturnCode::Error
                );
                prop_assert_eq!(host.var("board_id_check"), Some("2"));
                prop_assert_eq!(touched(&log), vec![regs::DEVCFG_INT_STS]);
            }
        }

        #[test]
        fn no_pll_writes_on_wrong_board(board_id: u32) {
            let config = ProcedureConfig::NMX_PLL_RECONFIGURE;
            prop_assume!(config.policy.classify(board_id)
                == drv_nmx_boot_api::BoardIdentity::NoMatch);

            let log = new_log();
            let mut mmio = FakeMmio::new(&log)
                .with(regs::DEVCFG_INT_STS, 0x4)
                .with(regs::BOARD_ID, board_id);
            let mut host = FakeHost::new(&log);

            prop_assert_eq!(run(&mut host, &mut mmio, &config), ReturnCode::Error);
            prop_assert!(writes(&log).is_empty());
        }
    }
}
