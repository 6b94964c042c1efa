//! Blocking HTTP client used by the smoke test.

use crate::error::Result;
use crate::extract::types::HttpMethod;
use serde_json::Value;
use std::time::Duration;

/// Status and body of a completed HTTP exchange, whatever the status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: String,
}

/// Sends one request. Transport failures (DNS, refused, timeout) are
/// errors; non-2xx responses are not.
pub trait HttpProbe {
    fn send(&self, method: HttpMethod, url: &str, body: Option<&Value>) -> Result<ProbeResponse>;
}

/// `ureq`-backed probe with a global per-request timeout and bearer auth.
pub struct UreqProbe {
    agent: ureq::Agent,
    authorization: Option<String>,
}

impl UreqProbe {
    pub fn new(timeout: Duration, api_key: Option<&str>) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            authorization: api_key.map(|key| format!("Bearer {}", key)),
        }
    }
}

impl HttpProbe for UreqProbe {
    fn send(&self, method: HttpMethod, url: &str, body: Option<&Value>) -> Result<ProbeResponse> {
        let mut response = match method {
            HttpMethod::Get => {
                let mut request = self.agent.get(url);
                if let Some(auth) = &self.authorization {
                    request = request.header("Authorization", auth.as_str());
                }
                request.call()?
            }
            HttpMethod::Post => {
                let mut request = self
                    .agent
                    .post(url)
                    .header("Content-Type", "application/json");
                if let Some(auth) = &self.authorization {
                    request = request.header("Authorization", auth.as_str());
                }
                match body {
                    Some(json) => request.send_json(json)?,
                    None => request.send_empty()?,
                }
            }
        };

        // A response arrived, so its status is kept even if the body is unreadable.
        let status = response.status().as_u16();
        let body = match response.body_mut().read_to_vec() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::warn!(url, status, error = %e, "Response body unreadable");
                String::new()
            }
        };

        Ok(ProbeResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};
    use std::time::Instant;

    /// Serve one connection on 127.0.0.1: read the request head, wait
    /// `delay`, write `response`. The join handle yields the request head.
    fn serve_once(response: &'static [u8], delay: Duration) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api/bazi/info", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => head.extend_from_slice(&buf[..n]),
                }
            }
            thread::sleep(delay);
            let _ = stream.write_all(response);
            let _ = stream.flush();
            String::from_utf8_lossy(&head).into_owned()
        });

        (url, handle)
    }

    #[test]
    fn test_error_status_is_a_response() {
        let (url, server) = serve_once(
            concat!(
                "HTTP/1.1 404 Not Found\r\n",
                "Content-Type: application/json\r\n",
                "Content-Length: 22\r\n",
                "Connection: close\r\n\r\n",
                r#"{"detail":"Not Found"}"#,
            )
            .as_bytes(),
            Duration::ZERO,
        );
        let probe = UreqProbe::new(Duration::from_secs(2), None);

        let response = probe.send(HttpMethod::Get, &url, None).unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.body, r#"{"detail":"Not Found"}"#);
        server.join().unwrap();
    }

    #[test]
    fn test_bearer_header_is_sent() {
        let (url, server) = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
            Duration::ZERO,
        );
        let probe = UreqProbe::new(Duration::from_secs(2), Some("secret-key"));

        let response = probe.send(HttpMethod::Get, &url, None).unwrap();
        assert_eq!(response.status, 200);
        let head = server.join().unwrap().to_lowercase();
        assert!(head.starts_with("get /api/bazi/info"));
        assert!(head.contains("authorization: bearer secret-key"));
    }

    #[test]
    fn test_no_authorization_without_key() {
        let (url, server) = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
            Duration::ZERO,
        );
        let probe = UreqProbe::new(Duration::from_secs(2), None);

        probe.send(HttpMethod::Get, &url, None).unwrap();
        assert!(!server.join().unwrap().to_lowercase().contains("authorization:"));
    }

    #[test]
    fn test_invalid_utf8_body_keeps_status() {
        let (url, server) = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n\xff\xfe",
            Duration::ZERO,
        );
        let probe = UreqProbe::new(Duration::from_secs(2), None);

        let response = probe.send(HttpMethod::Get, &url, None).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.chars().count(), 2);
        server.join().unwrap();
    }

    #[test]
    fn test_slow_server_times_out() {
        let (url, server) = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
            Duration::from_millis(1500),
        );
        let probe = UreqProbe::new(Duration::from_millis(200), None);

        let start = Instant::now();
        let result = probe.send(HttpMethod::Get, &url, None);
        assert!(matches!(result, Err(crate::error::AppError::Http(_))));
        assert!(start.elapsed() < Duration::from_millis(1200));
        server.join().unwrap();
    }

    #[test]
    fn test_refused_connection_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/health", listener.local_addr().unwrap());
        drop(listener);

        let probe = UreqProbe::new(Duration::from_secs(2), None);
        assert!(probe.send(HttpMethod::Get, &url, None).is_err());
    }
}
