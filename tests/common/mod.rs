//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use web_proxy::config::ProxyConfig;
use web_proxy::http::HttpServer;
use web_proxy::lifecycle::Shutdown;

/// Requests seen by a recording backend, as raw text (head + body).
pub type Recorded = Arc<Mutex<Vec<String>>>;

/// Proxy config pointing nowhere but `bind`, with no SOCKS relay.
pub fn proxy_config(bind: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = bind.to_string();
    config.upstream.socks_proxy = None;
    config
}

/// Start the proxy on `config.listener.bind_address`.
pub async fn start_proxy(config: ProxyConfig) -> Shutdown {
    let shutdown = Shutdown::new();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let server = HttpServer::new(&config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown
}

/// Test client that talks to the proxy directly.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Start a backend that records each request and answers with `response`
/// (a complete raw HTTP response).
pub async fn start_recording_backend(addr: SocketAddr, response: String) -> Recorded {
    let listener = TcpListener::bind(addr).await.unwrap();
    let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
    let seen = recorded.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let seen = seen.clone();
            let response = response.clone();
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                seen.lock().unwrap().push(request);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    recorded
}

/// Start a backend that accepts connections but answers only after `delay`.
pub async fn start_slow_backend(addr: SocketAddr, delay: Duration) {
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = read_request(&mut socket).await;
                tokio::time::sleep(delay).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\nlate")
                    .await;
            });
        }
    });
}

/// Start a chunked backend that sends its head and `first_chunk`, then
/// stalls for `stall` before finishing the body.
pub async fn start_stalling_backend(addr: SocketAddr, first_chunk: &'static str, stall: Duration) {
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = read_request(&mut socket).await;
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nTransfer-Encoding: chunked\r\n\r\n{:x}\r\n{}\r\n",
                    first_chunk.len(),
                    first_chunk
                );
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                let _ = socket.flush().await;
                tokio::time::sleep(stall).await;
                let _ = socket.write_all(b"4\r\nrest\r\n0\r\n\r\n").await;
            });
        }
    });
}

/// A `Content-Length` framed response.
pub fn fixed_response(status: &str, extra_headers: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
        status,
        body.len(),
        extra_headers,
        body
    )
}

/// A chunked response carrying `chunks` in order.
pub fn chunked_response(content_type: &str, chunks: &[&str]) -> String {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
        content_type
    );
    for chunk in chunks {
        response.push_str(&format!("{:x}\r\n{}\r\n", chunk.len(), chunk));
    }
    response.push_str("0\r\n\r\n");
    response
}

/// Value of `name` in a recorded request head, matched case-insensitively.
pub fn header_in(request: &str, name: &str) -> Option<String> {
    let head = request.split("\r\n\r\n").next().unwrap_or_default();
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return String::from_utf8_lossy(&buf).into_owned(),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let body_len = header_in(&head, "content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + body_len {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
