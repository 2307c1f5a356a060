// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-borrow cell for statics touched from the boot path.
//!
//! The standalone bring-up programs run on one core with interrupts masked,
//! so in practice a borrow is never contended. The host test harness is a
//! different story: it runs tests on several threads that all share the same
//! trace statics. [`StaticCell::try_borrow_mut`] lets callers that can afford
//! to lose an update (tracing) back off instead of panicking.

#![cfg_attr(not(test), no_std)]

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, Ordering};

/// A RefCell-style container that can be used in a static for cases where only
/// a single borrow needs to happen at any given time.
///
/// Only `mut` access is provided. There is no many-reader mode.
#[derive(Default)]
pub struct StaticCell<T> {
    borrowed: AtomicBool,
    cell: UnsafeCell<T>,
}

impl<T> StaticCell<T> {
    /// Creates a `StaticCell` containing `contents`.
    pub const fn new(contents: T) -> Self {
        Self {
            borrowed: AtomicBool::new(false),
            cell: UnsafeCell::new(contents),
        }
    }

    /// Gets mutable access to the contents of `self`.
    ///
    /// If a `StaticRef` for `self` still exists anywhere in the program, this
    /// will panic.
    pub fn borrow_mut(&self) -> StaticRef<'_, T> {
        match self.try_borrow_mut() {
            Some(r) => r,
            None => panic!(),
        }
    }

    /// Gets mutable access to the contents of `self`, or `None` if a
    /// `StaticRef` for `self` is currently live.
    pub fn try_borrow_mut(&self) -> Option<StaticRef<'_, T>> {
        if self.borrowed.swap(true, Ordering::Acquire) {
            return None;
        }
        // Safety: the swap above ensures that we are not producing an aliasing
        // &mut to our contents.
        unsafe {
            Some(StaticRef {
                contents: &mut *self.cell.get(),
                borrow: &self.borrowed,
            })
        }
    }
}

unsafe impl<T> Sync for StaticCell<T> where for<'a> &'a mut T: Send {}

pub struct StaticRef<'a, T> {
    contents: &'a mut T,
    borrow: &'a AtomicBool,
}

impl<T> Drop for StaticRef<'_, T> {
    fn drop(&mut self) {
        self.borrow.store(false, Ordering::Release);
    }
}

impl<T> core::ops::Deref for StaticRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &*self.contents
    }
}

impl<T> core::ops::DerefMut for StaticRef<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.contents
    }
}
