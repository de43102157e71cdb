//! Origin endpoint for proxy tenants.
//!
//! # Responsibilities
//! - Validate the declared egress URL once, at startup
//! - Rewrite inbound request URIs onto the origin
//!
//! # Design Decisions
//! - Only absolute `http` URLs are accepted; the outbound connector is plain TCP
//! - A path on the origin URL becomes a prefix for every forwarded path
//! - A query on the origin URL is ignored; the client's query is forwarded

use std::fmt;

use axum::http::uri::{Authority, PathAndQuery, Scheme, Uri};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OriginError {
    #[error("{url:?} is not an absolute URL: {reason}")]
    Parse { url: String, reason: url::ParseError },

    #[error("{0:?} has no host")]
    MissingHost(String),

    #[error("{url:?} uses unsupported scheme {scheme:?} (only http is forwarded)")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("{0:?} has an authority that is not a valid HTTP authority")]
    Authority(String),
}

/// A single upstream endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    url: Url,
    authority: Authority,
    base_path: String,
}

impl Origin {
    /// Parse and validate an origin URL.
    pub fn parse(raw: &str) -> Result<Self, OriginError> {
        let raw = raw.trim();
        let url = Url::parse(raw).map_err(|reason| OriginError::Parse {
            url: raw.to_string(),
            reason,
        })?;

        if url.scheme() != "http" {
            return Err(OriginError::UnsupportedScheme {
                url: raw.to_string(),
                scheme: url.scheme().to_string(),
            });
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| OriginError::MissingHost(raw.to_string()))?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority: Authority = authority
            .parse()
            .map_err(|_| OriginError::Authority(raw.to_string()))?;

        let base_path = url.path().trim_end_matches('/').to_string();

        Ok(Self {
            url,
            authority,
            base_path,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Map an inbound URI onto this origin, keeping path and query.
    pub fn rewrite(&self, uri: &Uri) -> Result<Uri, axum::http::Error> {
        let inbound = uri
            .path_and_query()
            .map(PathAndQuery::as_str)
            .unwrap_or("/");

        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(format!("{}{}", self.base_path, inbound))
            .build()
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_path_and_query() {
        let origin = Origin::parse("http://10.0.0.5:8080").unwrap();
        let uri: Uri = "/api/v1/items?page=2".parse().unwrap();
        assert_eq!(
            origin.rewrite(&uri).unwrap().to_string(),
            "http://10.0.0.5:8080/api/v1/items?page=2"
        );
    }

    #[test]
    fn base_path_is_prefixed() {
        let origin = Origin::parse("http://backend.internal/app/").unwrap();
        let uri: Uri = "/login".parse().unwrap();
        assert_eq!(
            origin.rewrite(&uri).unwrap().to_string(),
            "http://backend.internal/app/login"
        );
    }

    #[test]
    fn default_port_is_dropped() {
        let origin = Origin::parse("http://backend.internal:80").unwrap();
        assert_eq!(origin.authority().as_str(), "backend.internal");
    }

    #[test]
    fn ipv6_origin() {
        let origin = Origin::parse("http://[::1]:3000").unwrap();
        assert_eq!(origin.authority().as_str(), "[::1]:3000");
    }

    #[test]
    fn rejects_invalid_origins() {
        assert!(matches!(Origin::parse("not a url"), Err(OriginError::Parse { .. })));
        assert!(matches!(Origin::parse("/relative/path"), Err(OriginError::Parse { .. })));
        assert!(matches!(
            Origin::parse("https://secure.example.com"),
            Err(OriginError::UnsupportedScheme { .. })
        ));
        assert!(matches!(
            Origin::parse("ftp://files.example.com"),
            Err(OriginError::UnsupportedScheme { .. })
        ));
    }
}
