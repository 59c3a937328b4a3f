//! Minimal line clients used to drive real listeners.

use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends one request line and returns every reply line.
pub fn exchange(addr: SocketAddr, request: &str) -> Vec<String> {
    exchange_lines(addr, &[request])
}

/// Sends `lines` newline-terminated, half-closes, and reads the reply to EOF.
pub fn exchange_lines(addr: SocketAddr, lines: &[&str]) -> Vec<String> {
    let mut stream = TcpStream::connect(addr).expect("connect to server");
    stream
        .set_read_timeout(Some(READ_TIMEOUT))
        .expect("set read timeout");
    let mut request = lines.join("\n");
    request.push('\n');
    stream.write_all(request.as_bytes()).expect("write request");
    stream.flush().expect("flush request");
    stream.shutdown(Shutdown::Write).expect("half-close");

    BufReader::new(stream)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .expect("read reply")
}
