//! Session context shared by every authenticated request.

use std::sync::Mutex;

/// Response header the server uses to rotate the CSRF token.
pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";

/// CSRF token and optional session cookie, passed by reference to whoever
/// issues requests. The token is rotated by server responses.
#[derive(Debug, Default)]
pub struct Session {
    csrf_token: Mutex<Option<String>>,
    cookie: Option<String>,
}

impl Session {
    pub fn new(csrf_token: Option<String>, cookie: Option<String>) -> Self {
        Self {
            csrf_token: Mutex::new(csrf_token.filter(|t| !t.is_empty())),
            cookie: cookie.filter(|c| !c.is_empty()),
        }
    }

    /// Current CSRF token, if the session has one.
    pub fn csrf_token(&self) -> Option<String> {
        self.csrf_token
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or(None)
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// Adopt a token returned by the server. Absent or empty values keep the old one.
    pub fn update_token(&self, returned: Option<&str>) {
        let Some(token) = returned.filter(|t| !t.is_empty()) else {
            return;
        };
        if let Ok(mut guard) = self.csrf_token.lock() {
            if guard.as_deref() != Some(token) {
                tracing::debug!("CSRF token rotated by server");
            }
            *guard = Some(token.to_string());
        }
    }

    /// Seed the token from the `x-csrf-token` meta tag of the index page,
    /// unless one is already known.
    pub fn bootstrap_from_page(&self, html: &str) -> bool {
        if self.csrf_token().is_some() {
            return false;
        }
        match extract_meta_token(html) {
            Some(token) => {
                self.update_token(Some(&token));
                true
            }
            None => false,
        }
    }
}

/// Find `<meta name="x-csrf-token" content="...">` in an HTML page.
pub fn extract_meta_token(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(offset) = lower[search_from..].find("<meta") {
        let start = search_from + offset;
        let end = lower[start..].find('>').map(|e| start + e)?;
        let tag = &html[start..end];
        let tag_lower = &lower[start..end];

        if attribute(tag_lower, tag, "name").map(|n| n.eq_ignore_ascii_case("x-csrf-token")) == Some(true) {
            return attribute(tag_lower, tag, "content")
                .filter(|c| !c.is_empty())
                .map(str::to_string);
        }
        search_from = end;
    }

    None
}

fn attribute<'a>(tag_lower: &str, tag: &'a str, name: &str) -> Option<&'a str> {
    for quote in ['"', '\''] {
        let needle = format!("{}={}", name, quote);
        let mut from = 0;
        while let Some(pos) = tag_lower[from..].find(&needle) {
            let at = from + pos;
            let preceded_by_space = at == 0
                || tag_lower[..at].ends_with(|c: char| c.is_ascii_whitespace());
            let value_start = at + needle.len();
            if preceded_by_space {
                let value_end = tag[value_start..].find(quote)? + value_start;
                return Some(&tag[value_start..value_end]);
            }
            from = value_start;
        }
    }
    None
}
