//! Unit tests for binding and accepting on both socket kinds.

use std::net::TcpStream;
use std::time::Duration;

use rstest::{fixture, rstest};

use jobwire_config::SocketEndpoint;

use super::listener::SocketListener;
use super::{ConnectionTally, ListenerError};

const PATIENCE: Duration = Duration::from_secs(2);

#[fixture]
fn loopback() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", 0)
}

#[fixture]
fn tally() -> ConnectionTally {
    ConnectionTally::default()
}

#[rstest]
fn every_tcp_client_reaches_the_handler(loopback: SocketEndpoint, tally: ConnectionTally) {
    let listener = SocketListener::bind("rpc", &loopback).expect("bind");
    let addr = listener.local_addr().expect("tcp listeners report an address");
    let handle = listener.start(tally.handler()).expect("start");

    for _ in 0..3 {
        TcpStream::connect(addr).expect("connect");
    }

    assert!(tally.wait_for(3, PATIENCE), "saw {} connections", tally.accepted());
    handle.shutdown();
    handle.join().expect("join");
}

#[rstest]
fn a_taken_port_is_a_bind_error(loopback: SocketEndpoint) {
    let holder = SocketListener::bind("rpc", &loopback).expect("bind");
    let port = holder.local_addr().expect("address").port();

    let error = SocketListener::bind("batch", &SocketEndpoint::tcp("127.0.0.1", port))
        .expect_err("port is taken");

    assert!(matches!(error, ListenerError::Bind { .. }), "{error:?}");
}

#[rstest]
fn unresolvable_hosts_are_reported() {
    let endpoint = SocketEndpoint::tcp("host.invalid", 4000);
    let error = SocketListener::bind("rpc", &endpoint).expect_err("no such host");
    assert!(error.to_string().contains("host.invalid"), "{error}");
}

#[rstest]
fn dropping_the_handle_stops_the_loop(loopback: SocketEndpoint, tally: ConnectionTally) {
    let listener = SocketListener::bind("batch", &loopback).expect("bind");
    let addr = listener.local_addr().expect("address");
    drop(listener.start(tally.handler()).expect("start"));

    std::thread::sleep(Duration::from_millis(200));
    assert!(TcpStream::connect(addr).is_err(), "listener should be closed");
}

#[cfg(unix)]
mod unix {
    use std::os::unix::net::{UnixListener, UnixStream};
    use std::path::Path;

    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    #[fixture]
    fn runtime() -> TempDir {
        tempfile::tempdir().expect("temp dir")
    }

    fn endpoint_at(path: &Path) -> SocketEndpoint {
        SocketEndpoint::unix(path.to_str().expect("utf-8 path"))
    }

    #[rstest]
    fn stale_socket_files_are_replaced_then_removed(runtime: TempDir, tally: ConnectionTally) {
        let path = runtime.path().join("rpc.sock");
        drop(UnixListener::bind(&path).expect("bind leftover"));
        assert!(path.exists());

        let listener = SocketListener::bind("rpc", &endpoint_at(&path)).expect("bind");
        assert_eq!(listener.local_addr(), None);
        let handle = listener.start(tally.handler()).expect("start");

        UnixStream::connect(&path).expect("connect");
        assert!(tally.wait_for(1, PATIENCE));

        handle.shutdown();
        handle.join().expect("join");
        assert!(!path.exists(), "socket file should be unlinked on exit");
    }

    #[rstest]
    fn a_live_socket_is_left_alone(runtime: TempDir) {
        let path = runtime.path().join("rpc.sock");
        let _owner = UnixListener::bind(&path).expect("bind owner");

        let error = SocketListener::bind("rpc", &endpoint_at(&path)).expect_err("in use");

        assert!(matches!(error, ListenerError::InUse { .. }), "{error:?}");
        assert!(path.exists());
    }

    #[rstest]
    fn regular_files_are_never_deleted(runtime: TempDir) {
        let path = runtime.path().join("batch.sock");
        std::fs::write(&path, b"data").expect("write");

        let error = SocketListener::bind("batch", &endpoint_at(&path)).expect_err("not a socket");

        assert!(matches!(error, ListenerError::NotASocket { .. }), "{error:?}");
        assert_eq!(std::fs::read(&path).expect("read"), b"data");
    }
}
