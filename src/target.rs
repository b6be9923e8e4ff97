//! Monitored endpoints.
//!
//! The protocol string from the target source is resolved to a closed
//! variant once, when the target is built, so dispatch never compares
//! strings.

use std::fmt;
use url::Url;
use crate::config::TargetConfig;

/// Request protocol of a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http,
    Https,
    /// Anything else, kept verbatim for diagnostics.
    Unsupported(String),
}

impl Protocol {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("http") {
            Protocol::Http
        } else if trimmed.eq_ignore_ascii_case("https") {
            Protocol::Https
        } else {
            Protocol::Unsupported(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
            Protocol::Unsupported(raw) => raw,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single monitored endpoint. Immutable for the duration of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorTarget {
    pub name: String,
    pub host: String,
    pub path: String,
    pub protocol: Protocol,
}

impl MonitorTarget {
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        path: impl Into<String>,
        protocol: Protocol,
    ) -> Self {
        let path = path.into();
        Self {
            name: name.into(),
            host: host.into(),
            path: if path.is_empty() { "/".to_string() } else { path },
            protocol,
        }
    }

    /// Shorthand for an `http` target.
    pub fn http(name: impl Into<String>, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, host, path, Protocol::Http)
    }

    /// `<protocol>://<host><path>`, as recorded in error entries.
    pub fn full_url(&self) -> String {
        format!("{}://{}{}", self.protocol, self.host, self.path)
    }

    /// Parsed request URL. Fails for hosts or paths that do not form a URL.
    pub fn url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.full_url())
    }
}

impl From<&TargetConfig> for MonitorTarget {
    fn from(config: &TargetConfig) -> Self {
        Self::new(
            config.name.clone(),
            config.host.clone(),
            config.path.clone(),
            Protocol::parse(&config.protocol),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_resolution() {
        assert_eq!(Protocol::parse("http"), Protocol::Http);
        assert_eq!(Protocol::parse("HTTPS"), Protocol::Https);
        assert_eq!(Protocol::parse("ftp"), Protocol::Unsupported("ftp".into()));
        assert_eq!(Protocol::parse("ftp").to_string(), "ftp");
    }

    #[test]
    fn test_full_url() {
        let target = MonitorTarget::http("home", "a.test:8080", "/status?x=1");
        assert_eq!(target.full_url(), "http://a.test:8080/status?x=1");
        assert_eq!(target.url().unwrap().port(), Some(8080));
    }

    #[test]
    fn test_empty_path_normalised() {
        let config = TargetConfig {
            name: "root".into(),
            host: "a.test".into(),
            path: String::new(),
            protocol: "Http".into(),
        };
        let target = MonitorTarget::from(&config);
        assert_eq!(target.path, "/");
        assert_eq!(target.protocol, Protocol::Http);
    }
}
