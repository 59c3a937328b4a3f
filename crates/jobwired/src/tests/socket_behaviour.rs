//! Behavioural tests for binding and accepting on both endpoint kinds.

use std::cell::RefCell;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use jobwire_config::{Config, SocketEndpoint};

use crate::server::{Server, Services};
use crate::transport::{ConnectionTally, ListenerHandle, SocketListener};

const PATIENCE: Duration = Duration::from_secs(2);

#[derive(Default)]
struct SocketWorld {
    tally: ConnectionTally,
    running: Option<(ListenerHandle, Option<SocketAddr>)>,
    held_port: Option<TcpListener>,
    server: Option<Server>,
    failure: Option<String>,
    runtime: Option<TempDir>,
    reply: Vec<String>,
}

impl SocketWorld {
    fn held_endpoint(&self) -> SocketEndpoint {
        let held = self.held_port.as_ref().expect("no port is held");
        let port = held.local_addr().expect("held port address").port();
        SocketEndpoint::tcp("127.0.0.1", port)
    }

    fn listen(&mut self, endpoint: &SocketEndpoint) {
        let started = SocketListener::bind("rpc", endpoint).and_then(|listener| {
            let addr = listener.local_addr();
            listener.start(self.tally.handler()).map(|handle| (handle, addr))
        });
        match started {
            Ok(running) => self.running = Some(running),
            Err(error) => self.failure = Some(error.to_string()),
        }
    }

    fn serve(&mut self, config: &Config) {
        match Server::start(config, Services::standard(config)) {
            Ok(server) => self.server = Some(server),
            Err(error) => self.failure = Some(error.to_string()),
        }
    }

    fn socket_file(&self, name: &str) -> std::path::PathBuf {
        self.runtime.as_ref().expect("runtime directory").path().join(name)
    }
}

impl Drop for SocketWorld {
    fn drop(&mut self) {
        if let Some((handle, _)) = self.running.take() {
            handle.shutdown();
            let _ = handle.join();
        }
        if let Some(server) = self.server.take() {
            let _ = server.shutdown();
        }
    }
}

#[fixture]
fn world() -> RefCell<SocketWorld> {
    RefCell::new(SocketWorld::default())
}

#[given("a loopback listener with a counting handler")]
fn loopback_listener(world: &RefCell<SocketWorld>) {
    world.borrow_mut().listen(&SocketEndpoint::tcp("127.0.0.1", 0));
    let failure = world.borrow().failure.clone();
    assert!(failure.is_none(), "listener did not start: {failure:?}");
}

#[given("another socket holds a loopback port")]
fn port_held(world: &RefCell<SocketWorld>) {
    let holder = TcpListener::bind(("127.0.0.1", 0)).expect("bind holder");
    world.borrow_mut().held_port = Some(holder);
}

#[cfg(unix)]
#[given("a job server listening on Unix sockets in a private directory")]
fn unix_server(world: &RefCell<SocketWorld>) {
    let mut world = world.borrow_mut();
    world.runtime = Some(TempDir::new().expect("runtime directory"));
    let at = |name: &str| {
        let path = world.socket_file(name);
        SocketEndpoint::unix(path.to_str().expect("UTF-8 temp path"))
    };
    let config = Config {
        rpc_socket: at("rpc.sock"),
        batch_socket: at("batch.sock"),
        ..Config::default()
    };
    world.serve(&config);
    assert!(world.failure.is_none(), "server did not start: {:?}", world.failure);
}

fn connect_times(world: &RefCell<SocketWorld>, times: usize) {
    let world = world.borrow();
    let addr = world
        .running
        .as_ref()
        .and_then(|(_, addr)| *addr)
        .expect("a running TCP listener");
    for _ in 0..times {
        TcpStream::connect(addr).expect("connect");
    }
}

#[when("a single client connects")]
fn single_client(world: &RefCell<SocketWorld>) {
    connect_times(world, 1);
}

#[when("{count} clients connect")]
fn many_clients(world: &RefCell<SocketWorld>, count: usize) {
    connect_times(world, count);
}

#[when("a listener binds that port")]
fn bind_held_port(world: &RefCell<SocketWorld>) {
    let endpoint = world.borrow().held_endpoint();
    world.borrow_mut().listen(&endpoint);
}

#[when("a server starts with its batch endpoint on that port")]
fn server_on_held_port(world: &RefCell<SocketWorld>) {
    let config = Config {
        rpc_socket: SocketEndpoint::tcp("127.0.0.1", 0),
        batch_socket: world.borrow().held_endpoint(),
        ..Config::default()
    };
    world.borrow_mut().serve(&config);
}

#[cfg(unix)]
#[when("\"{request}\" is sent to the {role} socket")]
fn send_over_unix(world: &RefCell<SocketWorld>, request: String, role: String) {
    let name = match role.as_str() {
        "RPC" => "rpc.sock",
        "batch" => "batch.sock",
        other => panic!("no {other} socket"),
    };
    let path = world.borrow().socket_file(name);
    world.borrow_mut().reply = unix::exchange(&path, &request.replace('|', "\n"));
}

#[when("the server stops")]
fn server_stops(world: &RefCell<SocketWorld>) {
    let server = world.borrow_mut().server.take().expect("a running server");
    server.shutdown().expect("clean shutdown");
}

#[then("the handler count reaches {count}")]
fn handler_count(world: &RefCell<SocketWorld>, count: usize) {
    let tally = world.borrow().tally.clone();
    assert!(
        tally.wait_for(count, PATIENCE),
        "handler saw {} of {count} connections",
        tally.accepted()
    );
}

#[then("the bind is refused")]
fn bind_refused(world: &RefCell<SocketWorld>) {
    let world = world.borrow();
    assert!(world.running.is_none());
    assert!(world.failure.is_some(), "bind should have failed");
}

#[then("startup fails naming the batch listener")]
fn startup_names_batch(world: &RefCell<SocketWorld>) {
    let world = world.borrow();
    let failure = world.failure.as_deref().expect("startup should have failed");
    assert!(failure.contains("batch listener"), "{failure}");
    assert!(world.server.is_none());
}

#[then("the reply lines are \"{lines}\"")]
fn reply_lines(world: &RefCell<SocketWorld>, lines: String) {
    let expected: Vec<&str> = lines.split('|').map(str::trim).collect();
    assert_eq!(world.borrow().reply, expected);
}

#[then("no socket files remain")]
fn socket_files_removed(world: &RefCell<SocketWorld>) {
    let world = world.borrow();
    for name in ["rpc.sock", "batch.sock"] {
        assert!(!world.socket_file(name).exists(), "{name} was left behind");
    }
}

#[cfg(unix)]
mod unix {
    use std::io::{BufRead, BufReader, Write};
    use std::net::Shutdown;
    use std::os::unix::net::UnixStream;
    use std::path::Path;

    use super::PATIENCE;

    /// Sends `request` plus a final newline and reads the reply to EOF.
    pub(super) fn exchange(path: &Path, request: &str) -> Vec<String> {
        let mut stream = UnixStream::connect(path).expect("connect");
        stream.set_read_timeout(Some(PATIENCE)).expect("read timeout");
        stream
            .write_all(format!("{request}\n").as_bytes())
            .expect("write request");
        stream.shutdown(Shutdown::Write).expect("half-close");
        BufReader::new(stream)
            .lines()
            .collect::<Result<_, _>>()
            .expect("read reply")
    }
}

#[scenario(
    path = "tests/features/socket_listener.feature",
    name = "A loopback listener hands over a single client"
)]
fn single_client_handed_over(#[from(world)] world: RefCell<SocketWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/socket_listener.feature",
    name = "A loopback listener hands over every client"
)]
fn every_client_handed_over(#[from(world)] world: RefCell<SocketWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/socket_listener.feature",
    name = "A port held by another socket cannot be bound"
)]
fn held_port_refused(#[from(world)] world: RefCell<SocketWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/socket_listener.feature",
    name = "The server names the listener that could not start"
)]
fn server_names_failed_listener(#[from(world)] world: RefCell<SocketWorld>) {
    drop(world);
}

#[cfg(unix)]
#[scenario(
    path = "tests/features/socket_listener.feature",
    name = "Both protocols are served over Unix sockets"
)]
fn unix_sockets_serve_both_protocols(#[from(world)] world: RefCell<SocketWorld>) {
    drop(world);
}
