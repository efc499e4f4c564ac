extern crate cbindgen;

use std::env;
use std::path::PathBuf;

fn main() {
    let crate_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo");

    // SigIn and SigOut live in axsync_sim, so that crate is parsed too.
    let mut config = cbindgen::Config::default();
    config.header = Some("/* Generated from axsync_ffi by cbindgen. Do not edit. */".to_string());
    config.language = cbindgen::Language::C;
    config.include_guard = Some("AXSYNC_FFI_OUT_AXSYNC_H".to_string());
    config.cpp_compat = true;
    config.parse = cbindgen::ParseConfig {
        parse_deps: true,
        include: Some(vec!["axsync_sim".to_string()]),
        ..Default::default()
    };

    let out_file = PathBuf::from(&crate_dir).join("out").join("axsync.h");

    cbindgen::Builder::new()
        .with_crate(crate_dir)
        .with_config(config)
        .generate()
        .expect("Unable to generate bindings")
        .write_to_file(out_file);

    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=../axsync_sim/src/signals.rs");
}
