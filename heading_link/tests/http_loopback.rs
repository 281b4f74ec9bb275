#![cfg(feature = "http")]

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use heading_link::{HttpLink, LinkError};
use heading_traits::RobotLink;
use rstest::rstest;

/// Serve exactly one request with `body`, reporting the request line.
fn one_shot(body: &'static [u8]) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                break;
            }
        }
        let _ = tx.send(request_line.trim_end().to_string());
        let mut stream = stream;
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(head.as_bytes()).unwrap();
        stream.write_all(body).unwrap();
        stream.flush().unwrap();
    });
    (format!("http://{addr}/"), rx)
}

#[test]
fn forward_hits_command_path_with_speeds() {
    let (base, rx) = one_shot(b"moving forward");
    let mut link = HttpLink::new(&base, Some(Duration::from_secs(5))).unwrap();
    let reply = link.send("FORWARD", 75, 75).expect("ack");
    assert_eq!(reply, "moving forward");
    let line = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(line, "GET /FORWARD?leftSpeed=75&rightSpeed=75 HTTP/1.1");
}

#[rstest]
#[case(b"")]
#[case(b"\xff\xfe\xfd")]
fn empty_or_binary_body_is_bad_response(#[case] body: &'static [u8]) {
    let (base, _rx) = one_shot(body);
    let mut link = HttpLink::new(&base, Some(Duration::from_secs(5))).unwrap();
    let err = link.send("STOP", 0, 0).expect_err("bad body");
    assert!(matches!(
        err.downcast_ref::<LinkError>(),
        Some(LinkError::BadResponse(_))
    ));
}

#[test]
fn refused_connection_is_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let mut link = HttpLink::new(&format!("http://127.0.0.1:{port}/"), Some(Duration::from_secs(2))).unwrap();
    let err = link.send("LEFT", 75, 75).expect_err("nobody listening");
    assert!(matches!(
        err.downcast_ref::<LinkError>(),
        Some(LinkError::Transport(_))
    ));
}

#[rstest]
#[case("not a url")]
#[case("ftp://192.168.4.1/")]
fn bad_base_address_is_invalid_target(#[case] base: &str) {
    let err = HttpLink::new(base, None).expect_err("invalid");
    assert!(matches!(err, LinkError::InvalidTarget(_)));
}
