use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::error::{Error, Result};

use super::session::{Session, CSRF_HEADER};
use super::{contents_locator, AlbumSummary, ContentApi, ContentData, ContentPatch};

/// Upper bound for a single downloaded asset.
const MAX_ASSET_BYTES: u64 = 1024 * 1024 * 1024;

/// ureq-backed client for the album server's REST endpoints.
pub struct HttpContentApi {
    agent: ureq::Agent,
    base_url: String,
    session: Arc<Session>,
}

impl HttpContentApi {
    pub fn new(base_url: &str, timeout: Duration, session: Arc<Session>) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            agent,
            base_url,
            session,
        }
    }

    /// Create a client from configuration, with a fresh session.
    pub fn from_config(config: &ServerConfig) -> Self {
        let session = Session::new(config.csrf_token.clone(), config.session_cookie.clone());
        Self::new(
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
            Arc::new(session),
        )
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a server-relative locator against the base URL.
    pub fn url_for(&self, locator: &str) -> String {
        if locator.starts_with("http://") || locator.starts_with("https://") {
            locator.to_string()
        } else {
            format!("{}{}", self.base_url, locator.trim_start_matches('/'))
        }
    }

    /// Seed the CSRF token from the server's index page when none is configured.
    pub fn bootstrap_session(&self) -> Result<bool> {
        if self.session.csrf_token().is_some() {
            return Ok(false);
        }
        let url = self.url_for("");
        let response = self.call(self.request("GET", &url), &url, None)?;
        let page = response
            .into_string()
            .map_err(|e| Error::Decode(format!("index page: {}", e)))?;
        Ok(self.session.bootstrap_from_page(&page))
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        let mut req = self.agent.request(method, url);
        if let Some(cookie) = self.session.cookie() {
            req = req.set("Cookie", cookie);
        }
        if method != "GET" {
            if let Some(token) = self.session.csrf_token() {
                req = req.set(CSRF_HEADER, &token);
            }
        }
        req
    }

    /// Send a request, adopting any rotated CSRF token even from error responses.
    fn call(
        &self,
        req: ureq::Request,
        url: &str,
        body: Option<&ContentPatch<'_>>,
    ) -> Result<ureq::Response> {
        let sent = match body {
            Some(body) => req.set("Content-Type", "application/json").send_json(body),
            None => req.call(),
        };

        match sent {
            Ok(response) => {
                self.session.update_token(response.header(CSRF_HEADER));
                Ok(response)
            }
            Err(ureq::Error::Status(status, response)) => {
                self.session.update_token(response.header(CSRF_HEADER));
                Err(Error::Status {
                    status,
                    url: url.to_string(),
                })
            }
            Err(e) => Err(Error::Network(format!("{}: {}", url, e))),
        }
    }
}

impl ContentApi for HttpContentApi {
    fn list_albums(&self) -> Result<Vec<AlbumSummary>> {
        let url = self.url_for("albums/");
        let response = self.call(self.request("GET", &url), &url, None)?;
        response
            .into_json()
            .map_err(|e| Error::Decode(format!("album list: {}", e)))
    }

    fn list_contents(&self, album_id: &str) -> Result<Vec<ContentData>> {
        let url = self.url_for(&contents_locator(album_id));
        let response = self.call(self.request("GET", &url), &url, None)?;
        response
            .into_json()
            .map_err(|e| Error::Decode(format!("contents of {}: {}", album_id, e)))
    }

    fn update_content(&self, locator: &str, alt: &str, text: &str) -> Result<()> {
        let url = self.url_for(locator);
        let patch = ContentPatch { alt, text };
        self.call(self.request("PATCH", &url), &url, Some(&patch))?;
        Ok(())
    }

    fn delete_content(&self, locator: &str) -> Result<()> {
        let url = self.url_for(locator);
        self.call(self.request("DELETE", &url), &url, None)?;
        Ok(())
    }

    fn fetch_content(&self, locator: &str) -> Result<Vec<u8>> {
        let url = self.url_for(locator);
        let response = self.call(self.request("GET", &url), &url, None)?;
        read_limited(response.into_reader(), MAX_ASSET_BYTES, &url)
    }
}

/// Read a whole body, failing instead of truncating when it exceeds `limit` bytes.
fn read_limited(reader: impl Read, limit: u64, url: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.take(limit + 1).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > limit {
        return Err(Error::Decode(format!("asset larger than {} bytes: {}", limit, url)));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serve one canned response per connection and report each request's
    /// method line and lowercased headers.
    fn stub_server(responses: Vec<&'static str>) -> (String, mpsc::Receiver<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                let head_end = loop {
                    if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        break end;
                    }
                    match stream.read(&mut chunk) {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                };

                let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
                let lines: Vec<String> = head
                    .lines()
                    .enumerate()
                    .map(|(i, line)| if i == 0 { line.to_string() } else { line.to_lowercase() })
                    .collect();
                let body_len = lines
                    .iter()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                let mut received = buf.len() - (head_end + 4);
                while received < body_len {
                    match stream.read(&mut chunk) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => received += n,
                    }
                }

                let _ = tx.send(lines);
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        (base, rx)
    }

    fn stub_client(base: &str, session: &Arc<Session>) -> HttpContentApi {
        HttpContentApi::new(base, Duration::from_secs(5), Arc::clone(session))
    }

    fn has_token(lines: &[String], token: &str) -> bool {
        let expected = format!("x-csrf-token: {}", token.to_lowercase());
        lines.iter().any(|l| *l == expected)
    }

    fn carries_token(lines: &[String]) -> bool {
        lines.iter().any(|l| l.starts_with("x-csrf-token:"))
    }

    const OK_EMPTY: &str = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    const OK_ALBUMS: &str =
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n[]";
    const OK_ASSET: &str = "HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\nJPEG";
    const OK_ROTATED: &str =
        "HTTP/1.1 200 OK\r\nX-CSRF-TOKEN: rotated-1\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    const FORBIDDEN_ROTATED: &str =
        "HTTP/1.1 403 Forbidden\r\nX-CSRF-TOKEN: rotated-2\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

    fn client(base: &str) -> HttpContentApi {
        HttpContentApi::new(base, Duration::from_secs(5), Arc::new(Session::default()))
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        assert_eq!(client("http://photos.local:8080").base_url(), "http://photos.local:8080/");
        assert_eq!(client(" http://photos.local/kalbum/ ").base_url(), "http://photos.local/kalbum/");
    }

    #[test]
    fn test_url_for_relative_and_absolute_locators() {
        let api = client("http://photos.local/kalbum");
        assert_eq!(
            api.url_for("albums/summer/contents/a.jpg"),
            "http://photos.local/kalbum/albums/summer/contents/a.jpg"
        );
        assert_eq!(api.url_for("/albums/"), "http://photos.local/kalbum/albums/");
        assert_eq!(api.url_for("https://cdn.example/a.jpg"), "https://cdn.example/a.jpg");
    }

    #[test]
    fn test_unreachable_server_is_network_failure() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let api = HttpContentApi::new(
            "http://127.0.0.1:9",
            Duration::from_millis(500),
            Arc::new(Session::default()),
        );
        let err = api.list_albums().unwrap_err();
        assert!(err.is_network());
    }

    #[test]
    fn test_writes_carry_csrf_token_and_reads_do_not() {
        let (base, requests) = stub_server(vec![OK_EMPTY, OK_EMPTY, OK_ALBUMS, OK_ASSET]);
        let session = Arc::new(Session::new(Some("tok123".to_string()), None));
        let api = stub_client(&base, &session);

        api.update_content("albums/trip/contents/a.jpg", "alt", "caption").unwrap();
        let patch = requests.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(patch[0].starts_with("PATCH /albums/trip/contents/a.jpg"));
        assert!(has_token(&patch, "tok123"));

        api.delete_content("albums/trip/contents/a.jpg").unwrap();
        let delete = requests.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(delete[0].starts_with("DELETE "));
        assert!(has_token(&delete, "tok123"));

        assert!(api.list_albums().unwrap().is_empty());
        let list = requests.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(list[0].starts_with("GET /albums/"));
        assert!(!carries_token(&list));

        assert_eq!(api.fetch_content("albums/trip/contents/a.jpg").unwrap(), b"JPEG".to_vec());
        let fetch = requests.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(!carries_token(&fetch));
    }

    #[test]
    fn test_rotated_token_adopted_from_success_and_error() {
        let (base, requests) = stub_server(vec![OK_ROTATED, FORBIDDEN_ROTATED, OK_EMPTY]);
        let session = Arc::new(Session::new(Some("tok123".to_string()), None));
        let api = stub_client(&base, &session);

        api.update_content("albums/trip/contents/a.jpg", "alt", "caption").unwrap();
        requests.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(session.csrf_token().as_deref(), Some("rotated-1"));

        let err = api.delete_content("albums/trip/contents/a.jpg").unwrap_err();
        assert!(matches!(err, Error::Status { status: 403, .. }));
        let rejected = requests.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(has_token(&rejected, "rotated-1"));
        assert_eq!(api.session().csrf_token().as_deref(), Some("rotated-2"));

        // The next write uses the token handed back with the rejection.
        api.delete_content("albums/trip/contents/a.jpg").unwrap();
        let retried = requests.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(has_token(&retried, "rotated-2"));
    }

    #[test]
    fn test_oversized_asset_is_rejected_not_truncated() {
        let err = read_limited(Cursor::new(vec![0u8; 17]), 16, "a.jpg").unwrap_err();
        assert!(matches!(err, Error::Decode(ref msg) if msg.contains("larger than 16")));

        let exact = read_limited(Cursor::new(vec![7u8; 16]), 16, "a.jpg").unwrap();
        assert_eq!(exact.len(), 16);
    }
}
