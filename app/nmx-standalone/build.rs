// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=UBOOT_STUBS");
    println!("cargo:rerun-if-env-changed=UBOOT_STANDALONE_LOAD_ADDR");

    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("none") {
        return;
    }

    // U-Boot's export jump table. Without it nothing resolves.
    if let Ok(stubs) = env::var("UBOOT_STUBS") {
        println!("cargo:rustc-link-arg-bins={stubs}");
    }

    // Zynq U-Boot loads standalone programs here unless told otherwise.
    let load_addr = env::var("UBOOT_STANDALONE_LOAD_ADDR")
        .unwrap_or_else(|_| "0x0C100000".to_string());
    println!("cargo:rustc-link-arg-bins=-Ttext={load_addr}");
    println!("cargo:rustc-link-arg-bins=-emain");
}
