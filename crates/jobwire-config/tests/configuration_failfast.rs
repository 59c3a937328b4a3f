//! Unusable values stop configuration loading instead of falling back.

use std::ffi::OsString;

use ortho_config::OrthoConfig;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use jobwire_config::{Config, RpcMode, SocketEndpoint};

#[fixture]
fn scratch() -> TempDir {
    TempDir::new().expect("temp dir")
}

fn load(args: &[&str], file: Option<(&TempDir, &str)>) -> Result<Config, String> {
    let mut argv: Vec<OsString> = std::iter::once("jobwired")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect();
    if let Some((dir, contents)) = file {
        let path = dir.path().join("jobwire.toml");
        std::fs::write(&path, contents).expect("write config");
        argv.push("--config-path".into());
        argv.push(path.into_os_string());
    }
    Config::load_from_iter(argv).map_err(|error| error.to_string())
}

#[rstest]
#[case::unknown_scheme("invalid://socket")]
#[case::missing_port("tcp://127.0.0.1")]
fn bad_flag_endpoints_are_fatal(#[case] endpoint: &str) {
    let error = load(&["--rpc-socket", endpoint], None).expect_err("must fail");
    assert!(!error.is_empty());
}

#[rstest]
#[case::non_numeric_port(r#"batch_socket = { transport = "tcp", port = not_a_number }"#)]
#[case::unknown_transport(r#"rpc_socket = { transport = "pipe", path = "/tmp/x" }"#)]
#[case::bad_text_form(r#"rpc_socket = "ftp://example.com:21""#)]
fn bad_files_are_fatal(scratch: TempDir, #[case] contents: &str) {
    load(&[], Some((&scratch, contents))).expect_err("must fail");
}

#[rstest]
fn text_endpoints_in_files_are_accepted(scratch: TempDir) {
    let config = load(&[], Some((&scratch, r#"rpc_socket = "tcp://127.0.0.1:7100""#)))
        .expect("load");
    assert_eq!(config.rpc_socket(), &SocketEndpoint::tcp("127.0.0.1", 7100));
}

#[test]
fn rpc_mode_is_read_from_flags() {
    let config = load(&["--rpc-mode", "sync"], None).expect("load");
    assert_eq!(config.rpc_mode(), RpcMode::Sync);
}

#[rstest]
fn rpc_mode_is_read_from_files(scratch: TempDir) {
    let config = load(&[], Some((&scratch, r#"rpc_mode = "sync""#))).expect("load");
    assert_eq!(config.rpc_mode(), RpcMode::Sync);
}

#[rstest]
fn unknown_rpc_modes_are_fatal(scratch: TempDir) {
    load(&[], Some((&scratch, r#"rpc_mode = "blocking""#))).expect_err("must fail");
}
