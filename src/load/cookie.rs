// src/load/cookie.rs

//! Minimal session-cookie handling for the load generator.
//!
//! Only session cookies matter: a `Set-Cookie` carrying `expires=` is a
//! persistent cookie and is ignored. Attributes (`Path`, `HttpOnly`, ...) are
//! dropped and only `name=value` is sent back.

use tokio::time::{Duration, Instant};

/// Extract the `name=value` pair of a session cookie from a `Set-Cookie`
/// header value.
pub fn session_cookie(set_cookie: &str) -> Option<String> {
    if set_cookie.to_ascii_lowercase().contains("expires=") {
        return None;
    }
    let pair = set_cookie.split(';').next()?.trim();
    match pair.split_once('=') {
        Some((name, _)) if !name.trim().is_empty() => Some(pair.to_string()),
        _ => None,
    }
}

/// The cookie one client currently holds.
#[derive(Debug, Default)]
pub struct CookieSlot {
    current: Option<(String, Instant)>,
}

impl CookieSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&str> {
        self.current.as_ref().map(|(c, _)| c.as_str())
    }

    /// Drop the cookie if it has been held longer than `ttl`. Returns whether
    /// one was dropped.
    pub fn expire(&mut self, ttl: Duration, now: Instant) -> bool {
        match &self.current {
            Some((_, since)) if now.saturating_duration_since(*since) > ttl => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    /// Store `cookie` if it differs from the held one. Returns whether it
    /// changed.
    pub fn replace(&mut self, cookie: String, now: Instant) -> bool {
        if self.get() == Some(cookie.as_str()) {
            return false;
        }
        self.current = Some((cookie, now));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_strips_attributes() {
        assert_eq!(
            session_cookie("JSESSIONID=abc.tomcat1; Path=/; HttpOnly").as_deref(),
            Some("JSESSIONID=abc.tomcat1")
        );
    }

    #[test]
    fn persistent_cookies_are_ignored() {
        assert_eq!(
            session_cookie("id=1; Expires=Wed, 21 Oct 2015 07:28:00 GMT"),
            None
        );
        assert_eq!(session_cookie("=novalue"), None);
    }

    #[test]
    fn slot_tracks_changes_and_expiry() {
        let start = Instant::now();
        let mut slot = CookieSlot::new();

        assert!(slot.replace("a=1".into(), start));
        assert!(!slot.replace("a=1".into(), start));
        assert!(!slot.expire(Duration::from_secs(10), start + Duration::from_secs(1)));
        assert!(slot.expire(Duration::from_secs(10), start + Duration::from_secs(11)));
        assert_eq!(slot.get(), None);
        assert!(!slot.expire(Duration::from_secs(10), start + Duration::from_secs(12)));
    }
}
