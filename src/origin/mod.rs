//! Origin gate
//!
//! Decides whether a cross-origin browser request may reach the relay.
//! Requests without an `Origin` header (curl, server-to-server, mobile apps)
//! are always allowed.
//!
//! Origins are compared exactly after normalization (scheme and host
//! lowercased, default ports dropped, trailing slash ignored). Substring
//! containment is deliberately not used: `https://shop.example.com.evil.io`
//! must not match `https://shop.example.com`.

use crate::config::CorsConfig;
use std::collections::HashSet;

/// Outcome of checking a request's `Origin` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginDecision {
    /// No `Origin` header; not a browser cross-origin request
    NoOrigin,
    /// Allowed; echo this value back in `Access-Control-Allow-Origin`
    Allowed(String),
    Rejected(String),
}

impl OriginDecision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, OriginDecision::Rejected(_))
    }
}

/// Exact-match origin allow-list
#[derive(Debug, Clone, Default)]
pub struct OriginGate {
    allowed: HashSet<String>,
}

impl OriginGate {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = origins
            .into_iter()
            .filter_map(|o| normalize(o.as_ref()))
            .collect();
        Self { allowed }
    }

    pub fn from_config(config: &CorsConfig) -> Self {
        Self::new(&config.allowed_origins)
    }

    /// Check a request's `Origin` header value
    pub fn check(&self, origin: Option<&str>) -> OriginDecision {
        let Some(origin) = origin else {
            return OriginDecision::NoOrigin;
        };

        match normalize(origin) {
            Some(normalized) if self.allowed.contains(&normalized) => {
                OriginDecision::Allowed(origin.to_string())
            }
            _ => OriginDecision::Rejected(origin.to_string()),
        }
    }
}

/// Normalize an origin to `scheme://host[:port]`
///
/// Returns `None` for anything that is not an http(s) origin, including the
/// opaque `null` origin.
fn normalize(origin: &str) -> Option<String> {
    let origin = origin.trim().trim_end_matches('/');
    let (scheme, rest) = origin.split_once("://")?;
    let scheme = scheme.to_ascii_lowercase();
    let default_port = match scheme.as_str() {
        "http" => "80",
        "https" => "443",
        _ => return None,
    };

    // An origin has no path, query, or userinfo
    if rest.is_empty() || rest.contains(['/', '?', '#', '@']) {
        return None;
    }

    let authority = rest.to_ascii_lowercase();
    let authority = match authority.rsplit_once(':') {
        Some((host, port)) if port == default_port => host.to_string(),
        _ => authority,
    };

    Some(format!("{}://{}", scheme, authority))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> OriginGate {
        OriginGate::new([
            "https://thereadcounts.myshopify.com",
            "https://thereadcounts.com",
            "http://localhost:9292",
        ])
    }

    #[test]
    fn test_absent_origin_allowed() {
        assert_eq!(gate().check(None), OriginDecision::NoOrigin);
        assert!(gate().check(None).is_allowed());
    }

    #[test]
    fn test_exact_origin_allowed() {
        assert_eq!(
            gate().check(Some("https://thereadcounts.com")),
            OriginDecision::Allowed("https://thereadcounts.com".into())
        );
        assert!(gate().check(Some("http://localhost:9292")).is_allowed());
    }

    #[test]
    fn test_normalized_match() {
        assert!(gate().check(Some("HTTPS://TheReadCounts.com/")).is_allowed());
        assert!(gate().check(Some("https://thereadcounts.com:443")).is_allowed());
    }

    #[test]
    fn test_embedded_domain_rejected() {
        let decision = gate().check(Some("https://thereadcounts.com.attacker.io"));
        assert_eq!(
            decision,
            OriginDecision::Rejected("https://thereadcounts.com.attacker.io".into())
        );
        assert!(!gate()
            .check(Some("https://evil-thereadcounts.com"))
            .is_allowed());
    }

    #[test]
    fn test_scheme_and_port_must_match() {
        assert!(!gate().check(Some("http://thereadcounts.com")).is_allowed());
        assert!(!gate().check(Some("http://localhost:3000")).is_allowed());
    }

    #[test]
    fn test_null_origin_rejected() {
        assert!(!gate().check(Some("null")).is_allowed());
    }

    #[test]
    fn test_from_config_defaults() {
        let gate = OriginGate::from_config(&CorsConfig::default());
        assert!(gate
            .check(Some("https://thereadcounts.myshopify.com"))
            .is_allowed());
    }
}
