use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::core::config::Config;
use crate::core::models::ModelRegistry;
use crate::core::session::Session;

/// HTTP client that never routes through a proxy picked up from the environment.
pub fn test_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("test client builds")
}

pub fn create_test_session() -> Session {
    let config = Config::default();
    let registry = ModelRegistry::from_config(&config).expect("default registry");
    Session::bootstrap(&registry, &config.system_prompt())
}

pub fn create_authenticated_session() -> Session {
    let mut session = create_test_session();
    session.set_token("hf_test".to_string());
    session
}

/// A canned response served by [`spawn_upstream`].
#[derive(Clone, Debug)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

impl UpstreamReply {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    }
}

pub struct Upstream {
    addr: SocketAddr,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl Upstream {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().await.clone()
    }
}

/// Serve each reply to one incoming connection, in order, recording the requests.
pub async fn spawn_upstream(replies: Vec<UpstreamReply>) -> Upstream {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should resolve");
    let captured = Arc::new(Mutex::new(Vec::new()));
    let captured_for_server = Arc::clone(&captured);

    tokio::spawn(async move {
        for reply in replies {
            let (mut stream, _) = listener.accept().await.map_err(|err| err.to_string())?;
            let request = read_http_request(&mut stream).await?;
            captured_for_server.lock().await.push(request);

            let response = format!(
                "HTTP/1.1 {} Upstream\r\ncontent-type: application/json\r\nconnection: close\r\ncontent-length: {}\r\n\r\n{}",
                reply.status,
                reply.body.len(),
                reply.body
            );
            stream
                .write_all(response.as_bytes())
                .await
                .map_err(|err| err.to_string())?;
            stream.shutdown().await.map_err(|err| err.to_string())?;
        }
        Ok::<(), String>(())
    });

    Upstream { addr, captured }
}

/// An address on which nothing is listening.
pub async fn unused_local_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    listener.local_addr().expect("local addr should resolve")
}

/// Read one request off the socket: everything up to the blank line, then
/// `content-length` bytes of body.
async fn read_http_request(stream: &mut TcpStream) -> Result<CapturedRequest, String> {
    let mut raw: Vec<u8> = Vec::new();
    let head_len = loop {
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let mut chunk = [0_u8; 1024];
        let read = stream.read(&mut chunk).await.map_err(|e| e.to_string())?;
        if read == 0 {
            return Err("connection closed before the request head ended".to_string());
        }
        raw.extend_from_slice(&chunk[..read]);
    };

    let head = String::from_utf8_lossy(&raw[..head_len]).into_owned();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();

    let body_len = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = raw.split_off(head_len);
    if body.len() < body_len {
        let mut rest = vec![0_u8; body_len - body.len()];
        stream.read_exact(&mut rest).await.map_err(|e| e.to_string())?;
        body.extend_from_slice(&rest);
    }
    body.truncate(body_len);

    Ok(CapturedRequest {
        request_line,
        headers,
        body,
    })
}
