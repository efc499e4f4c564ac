//! The generated C header declares the whole interface.

const HEADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/out/axsync.h"));

#[test]
fn header_has_include_guard() {
    assert!(HEADER.contains("#ifndef AXSYNC_FFI_OUT_AXSYNC_H"));
    assert!(HEADER.contains("#define AXSYNC_FFI_OUT_AXSYNC_H"));
}

#[test]
fn header_declares_entry_points() {
    for name in ["axsync_new", "axsync_destroy", "axsync_trace", "axsync_eval"] {
        assert!(HEADER.contains(&format!("{name}(")), "missing {name}");
    }
}

#[test]
fn header_defines_port_structs() {
    for name in ["axsync_model", "SigIn", "SigOut"] {
        assert!(
            HEADER.contains(&format!("typedef struct {name}")),
            "missing {name}"
        );
    }
    assert!(HEADER.contains("uint64_t wdata;"));
    assert!(HEADER.contains("AXSYNC_STATUS_OK"));
}
