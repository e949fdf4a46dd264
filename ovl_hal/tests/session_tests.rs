//! Session integration tests.
//!
//! Client code is written only against the backend traits; the same helpers
//! run against the simulation backend and, through a fake device node,
//! against the devmem backend.

use ovl_common::prelude::*;
use ovl_hal::backends::devmem::DevmemBackend;
use ovl_hal::{AccessOp, AccessOutcome, BackendRegistry, HostError, Session, parse_script};
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const HOST_TOML: &str = r#"
[shared]
service_name = "ovl-test"

[backend]
kind = "simulation"

[overlay]
image = "qick_top.bit"

[overlay.regions.tproc]
base = 0x4000_0000
length = 16

[overlay.regions.axi_gpio]
base = 0x4120_0000
length = 0x100
"#;

fn host_config() -> HostConfig {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(HOST_TOML.as_bytes()).unwrap();
    file.flush().unwrap();
    Session::load_config(file.path()).unwrap()
}

fn sim_session() -> Session {
    let mut session = Session::new(host_config(), &BackendRegistry::with_builtins()).unwrap();
    session.load_overlay().unwrap();
    session
}

/// Client code: touches registers without knowing the backend.
fn bump_counter(session: &Session) -> Result<u32, OverlayError> {
    let tproc = session.region("tproc")?;
    let next = tproc.read_word(0)? + 1;
    tproc.write_word(0, next)?;
    Ok(next)
}

#[test]
fn simulation_backend_is_selected_from_config() {
    let session = sim_session();
    assert_eq!(session.backend_name(), "simulation");
    let overlay = session.overlay().unwrap();
    assert!(overlay.is_loaded());
    assert_eq!(overlay.image(), "qick_top.bit");
    let names: Vec<_> = overlay.regions().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["axi_gpio", "tproc"]);
}

#[test]
fn unknown_backend_is_reported() {
    let config = host_config();
    let result = Session::new(config, &BackendRegistry::new());
    assert!(matches!(result, Err(HostError::BackendNotFound(name)) if name == "simulation"));
}

#[test]
fn region_before_load_is_unloaded() {
    let session = Session::new(host_config(), &BackendRegistry::with_builtins()).unwrap();
    assert_eq!(
        session.region("tproc").unwrap_err(),
        OverlayError::OverlayUnloaded("qick_top.bit".into())
    );
}

#[test]
fn deadbeef_scenario_through_session() {
    let session = sim_session();
    let outcomes = session
        .run_script(
            &parse_script("write tproc 4 0xDEADBEEF\nread tproc 4\nread tproc 0").unwrap(),
        )
        .unwrap();
    assert_eq!(
        outcomes[1],
        AccessOutcome::Read {
            region: "tproc".into(),
            offset: 4,
            width: 4,
            value: 0xDEAD_BEEF
        }
    );
    assert!(matches!(outcomes[2], AccessOutcome::Read { value: 0, .. }));

    let err = session
        .execute(&AccessOp::Write {
            region: "tproc".into(),
            offset: 14,
            width: 4,
            value: 1,
        })
        .unwrap_err();
    assert_eq!(
        err,
        OverlayError::OutOfBounds {
            offset: 14,
            size: 4,
            length: 16
        }
    );
}

#[test]
fn region_handles_alias_across_lookups() {
    let session = sim_session();
    assert_eq!(bump_counter(&session).unwrap(), 1);
    assert_eq!(bump_counter(&session).unwrap(), 2);
    assert_eq!(session.region("tproc").unwrap().read_word(0).unwrap(), 2);
}

#[test]
fn missing_region_is_unknown() {
    let session = sim_session();
    assert_eq!(
        session.region("missing").unwrap_err(),
        OverlayError::UnknownRegion("missing".into())
    );
}

#[test]
fn unload_blocks_every_region() {
    let mut session = sim_session();
    session.unload();
    for name in ["tproc", "axi_gpio", "missing"] {
        assert!(matches!(
            session.region(name),
            Err(OverlayError::OverlayUnloaded(_))
        ));
    }
    assert!(!session.overlay().unwrap().is_loaded());
}

#[test]
fn reload_gives_fresh_registers() {
    let mut session = sim_session();
    bump_counter(&session).unwrap();
    session.load_overlay().unwrap();
    assert_eq!(session.region("tproc").unwrap().read_word(0).unwrap(), 0);
}

#[test]
fn script_stops_at_first_failure() {
    let session = sim_session();
    let ops = parse_script("write tproc 0 7\nread tproc 0 3\nwrite tproc 0 9").unwrap();
    let result = session.run_script(&ops);
    assert!(matches!(
        result,
        Err(HostError::Overlay(OverlayError::UnsupportedWidth(3)))
    ));
    assert_eq!(session.region("tproc").unwrap().read_word(0).unwrap(), 7);
}

#[test]
fn dump_returns_whole_region() {
    let session = sim_session();
    session.region("tproc").unwrap().write(0, 2, 0xBEEF).unwrap();
    let outcome = session
        .execute(&AccessOp::Dump {
            region: "tproc".into(),
        })
        .unwrap();
    match outcome {
        AccessOutcome::Dump { base, bytes, .. } => {
            assert_eq!(base, 0x4000_0000);
            assert_eq!(bytes.len(), 16);
            assert_eq!(&bytes[..3], &[0xEF, 0xBE, 0x00]);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn standalone_window_through_session() {
    let session = sim_session();
    let window = session.map_window(0x4000_0000, 16).unwrap();
    window.write(4, 4, 0xDEAD_BEEF).unwrap();
    assert_eq!(window.read(4, 4).unwrap(), 0xDEAD_BEEF);
    // Standalone windows never alias overlay regions.
    assert_eq!(session.region("tproc").unwrap().read(4, 4).unwrap(), 0);
}

#[test]
fn same_client_code_runs_on_devmem_backend() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("qick_top.bit");
    fs::write(&image, b"bitstream").unwrap();
    let device = dir.path().join("mem");
    fs::File::create(&device).unwrap().set_len(0x2000).unwrap();

    let mut config = host_config();
    config.overlay = OverlayManifest::new(image.display().to_string())
        .with_region("tproc", 0x1000, 16)
        .unwrap();
    config.backend.kind = BackendKind::Devmem;
    config.backend.devmem.path = device.clone();

    let backend = Box::new(DevmemBackend::new(config.backend.devmem.clone()));
    let mut session = Session::with_backend(config, backend).unwrap();
    session.load_overlay().unwrap();
    assert_eq!(session.backend_name(), "devmem");

    assert_eq!(bump_counter(&session).unwrap(), 1);
    assert_eq!(bump_counter(&session).unwrap(), 2);

    session.unload();
    let bytes = fs::read(&device).unwrap();
    assert_eq!(&bytes[0x1000..0x1004], &[2, 0, 0, 0]);
}

#[test]
fn batched_write_reports_masked_values() {
    let session = sim_session();
    let outcomes = session
        .write_values("tproc", 2, 2, &[0x1_2345, 0xBEEF])
        .unwrap();
    assert_eq!(
        outcomes,
        vec![
            AccessOutcome::Written {
                region: "tproc".into(),
                offset: 2,
                width: 2,
                value: 0x2345
            },
            AccessOutcome::Written {
                region: "tproc".into(),
                offset: 4,
                width: 2,
                value: 0xBEEF
            },
        ]
    );
    let tproc = session.region("tproc").unwrap();
    assert_eq!(tproc.read_array(2, 2, 2).unwrap(), vec![0x2345, 0xBEEF]);
}

#[test]
fn batched_write_past_end_writes_nothing() {
    let session = sim_session();
    let result = session.write_values("tproc", 8, 4, &[1, 2, 3]);
    assert_eq!(
        result.unwrap_err(),
        OverlayError::OutOfBounds {
            offset: 8,
            size: 12,
            length: 16
        }
    );
    assert_eq!(
        session.region("tproc").unwrap().read_array(0, 1, 16).unwrap(),
        vec![0; 16]
    );
    assert_eq!(
        session.write_values("tproc", 0, 3, &[1]).unwrap_err(),
        OverlayError::UnsupportedWidth(3)
    );
}

#[test]
fn failed_reload_keeps_previous_overlay() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("qick_top.bit");
    fs::write(&image, b"bitstream").unwrap();
    let device = dir.path().join("mem");
    fs::File::create(&device).unwrap().set_len(0x2000).unwrap();

    let mut config = host_config();
    config.overlay = OverlayManifest::new(image.display().to_string())
        .with_region("tproc", 0x1000, 16)
        .unwrap();
    config.backend.devmem.path = device;

    let backend = Box::new(DevmemBackend::new(config.backend.devmem.clone()));
    let mut session = Session::with_backend(config, backend).unwrap();
    session.load_overlay().unwrap();
    assert_eq!(bump_counter(&session).unwrap(), 1);

    fs::remove_file(&image).unwrap();
    assert!(matches!(
        session.load_overlay(),
        Err(HostError::Overlay(OverlayError::InvalidImage(_)))
    ));

    assert!(session.overlay().unwrap().is_loaded());
    assert_eq!(bump_counter(&session).unwrap(), 2);
}
