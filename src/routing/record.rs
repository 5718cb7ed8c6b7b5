//! Route value types.
//!
//! # Responsibilities
//! - Describe one route: pattern, forwarding target, rewrite and header hints
//! - Decode raw rows (config entries, store rows) into validated records
//!
//! # Design Decisions
//! - Records are immutable once built and shared behind `Arc`
//! - Exactly one target per route, enforced by the `RouteTarget` enum
//! - Sensitive headers keep "unset" apart from "explicitly empty"

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Forwarding target of a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    /// Service name, resolved to an endpoint through discovery.
    ServiceId(String),
    /// Literal base URL.
    Url(String),
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTarget::ServiceId(id) => write!(f, "service:{}", id),
            RouteTarget::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Headers stripped from the proxied request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitiveHeaders {
    /// No set supplied; the proxy applies its own default set.
    #[default]
    Unset,
    /// Explicit set of lowercased header names. May be empty.
    Explicit(BTreeSet<String>),
}

impl SensitiveHeaders {
    /// Build an explicit set, normalizing names to lowercase.
    pub fn explicit<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SensitiveHeaders::Explicit(
            names
                .into_iter()
                .map(|n| n.as_ref().trim().to_ascii_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        )
    }

    /// The set the proxy should strip, falling back to `defaults` when unset.
    pub fn effective<'a>(&'a self, defaults: &'a BTreeSet<String>) -> &'a BTreeSet<String> {
        match self {
            SensitiveHeaders::Unset => defaults,
            SensitiveHeaders::Explicit(set) => set,
        }
    }
}

/// A single route definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRecord {
    /// Route label for logs and admin output.
    pub id: String,
    /// Path pattern (`/api/**`, `/users/*/profile`).
    pub path: String,
    /// Where matched requests go.
    pub target: RouteTarget,
    /// Remove the pattern's fixed prefix before forwarding.
    pub strip_prefix: bool,
    /// Hint to the proxying layer.
    pub retryable: bool,
    /// Headers removed from the proxied request.
    pub sensitive_headers: SensitiveHeaders,
}

impl RouteRecord {
    /// Route to a discovered service with default flags.
    pub fn service(id: impl Into<String>, path: impl Into<String>, service_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            target: RouteTarget::ServiceId(service_id.into()),
            strip_prefix: true,
            retryable: false,
            sensitive_headers: SensitiveHeaders::Unset,
        }
    }

    /// Route to a literal URL with default flags.
    pub fn url(id: impl Into<String>, path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            target: RouteTarget::Url(url.into()),
            strip_prefix: true,
            retryable: false,
            sensitive_headers: SensitiveHeaders::Unset,
        }
    }

    pub fn with_strip_prefix(mut self, strip_prefix: bool) -> Self {
        self.strip_prefix = strip_prefix;
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn with_sensitive_headers(mut self, headers: SensitiveHeaders) -> Self {
        self.sensitive_headers = headers;
        self
    }
}

/// Raw route row as stored externally or written in config.
///
/// Every field is optional so that decoding, not deserialization, decides
/// what is malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteRow {
    pub id: Option<String>,
    pub path: Option<String>,
    pub service_id: Option<String>,
    pub url: Option<String>,
    pub strip_prefix: Option<bool>,
    pub retryable: Option<bool>,
    /// Absent means unset; `[]` means explicitly no sensitive headers.
    pub sensitive_headers: Option<Vec<String>>,
}

/// Why a row could not become a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("path is empty")]
    EmptyPath,

    #[error("path '{0}' must start with '/'")]
    RelativePath(String),

    #[error("neither service_id nor url is set")]
    MissingTarget,

    #[error("both service_id and url are set")]
    AmbiguousTarget,

    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// A skipped row, with the identifier it is logged under.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed route row {row}: {error}")]
pub struct MalformedRecord {
    /// Row `id`, or `#<index>` when the row has none.
    pub row: String,
    pub error: RecordError,
}

impl RouteRow {
    /// Identifier used when reporting this row.
    pub fn label(&self, index: usize) -> String {
        match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("#{}", index),
        }
    }

    /// Validate the row and build a record, applying defaults.
    pub fn decode(&self, index: usize) -> Result<RouteRecord, RecordError> {
        let path = self
            .path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or(RecordError::EmptyPath)?;
        if !path.starts_with('/') {
            return Err(RecordError::RelativePath(path.to_string()));
        }

        let service_id = non_blank(self.service_id.as_deref());
        let url = non_blank(self.url.as_deref());
        let target = match (service_id, url) {
            (Some(_), Some(_)) => return Err(RecordError::AmbiguousTarget),
            (None, None) => return Err(RecordError::MissingTarget),
            (Some(id), None) => RouteTarget::ServiceId(id.to_string()),
            (None, Some(raw)) => {
                url::Url::parse(raw).map_err(|e| RecordError::InvalidUrl {
                    url: raw.to_string(),
                    reason: e.to_string(),
                })?;
                RouteTarget::Url(raw.to_string())
            }
        };

        let sensitive_headers = match &self.sensitive_headers {
            None => SensitiveHeaders::Unset,
            Some(names) => SensitiveHeaders::explicit(names),
        };

        Ok(RouteRecord {
            id: self.label(index),
            path: path.to_string(),
            target,
            strip_prefix: self.strip_prefix.unwrap_or(true),
            retryable: self.retryable.unwrap_or(false),
            sensitive_headers,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
