// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Simulated register file and host for unit tests.
//!
//! [`FakeMmio`] and [`FakeHost`] share one [`Log`], so tests can check how
//! register accesses interleave with delays and environment writes.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use drv_nmx_boot_api::{Delay, Env, Mmio};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Read { addr: u32, value: u32 },
    Write { addr: u32, value: u32 },
    Delay(u32),
    SetEnv(String, String),
}

pub type Log = Rc<RefCell<Vec<Event>>>;

/// Register file backed by a map. Unset registers read as zero.
pub struct FakeMmio {
    regs: BTreeMap<u32, u32>,
    log: Log,
}

impl FakeMmio {
    pub fn new(log: &Log) -> Self {
        Self {
            regs: BTreeMap::new(),
            log: log.clone(),
        }
    }

    /// Presets a register without logging an access.
    pub fn with(mut self, addr: u32, value: u32) -> Self {
        self.regs.insert(addr, value);
        self
    }

    /// Peeks at a register without logging an access.
    pub fn get(&self, addr: u32) -> u32 {
        self.regs.get(&addr).copied().unwrap_or(0)
    }
}

impl Mmio for FakeMmio {
    fn read32(&mut self, addr: u32) -> u32 {
        let value = self.get(addr);
        self.log.borrow_mut().push(Event::Read { addr, value });
        value
    }

    fn write32(&mut self, addr: u32, value: u32) {
        self.regs.insert(addr, value);
        self.log.borrow_mut().push(Event::Write { addr, value });
    }
}

/// Host that records delays and environment writes instead of acting on
/// them.
pub struct FakeHost {
    pub env: BTreeMap<String, String>,
    log: Log,
}

impl FakeHost {
    pub fn new(log: &Log) -> Self {
        Self {
            env: BTreeMap::new(),
            log: log.clone(),
        }
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }
}

impl Delay for FakeHost {
    fn delay_us(&mut self, us: u32) {
        self.log.borrow_mut().push(Event::Delay(us));
    }
}

impl Env for FakeHost {
    fn set(&mut self, name: &str, value: &str) {
        self.env.insert(name.to_owned(), value.to_owned());
        self.log
            .borrow_mut()
            .push(Event::SetEnv(name.to_owned(), value.to_owned()));
    }
}

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// Every address that was read or written, in order of first access.
pub fn touched(log: &Log) -> Vec<u32> {
    let mut out = Vec::new();
    for ev in log.borrow().iter() {
        let addr = match ev {
            Event::Read { addr, .. } | Event::Write { addr, .. } => *addr,
            _ => continue,
        };
        if !out.contains(&addr) {
            out.push(addr);
        }
    }
    out
}

/// Every register write, in order.
pub fn writes(log: &Log) -> Vec<(u32, u32)> {
    log.borrow()
        .iter()
        .filter_map(|ev| match ev {
            Event::Write { addr, value } => Some((*addr, *value)),
            _ => None,
        })
        .collect()
}
