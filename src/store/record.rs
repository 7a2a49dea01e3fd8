//! Domain model for stored diagnostics
//!
//! Log records, application statuses and search criteria, plus the fixed
//! extension-field allow-list and the write-time width caps shared by the
//! ingestion pipeline and the schema DDL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Severity of a log record, ordered from least to most severe.
///
/// Persisted as the integer discriminant, so the variant order is a storage
/// contract and must not be rearranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl LogLevel {
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Trace),
            1 => Some(Self::Debug),
            2 => Some(Self::Info),
            3 => Some(Self::Warn),
            4 => Some(Self::Error),
            5 => Some(Self::Fatal),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

// Write-time width caps (characters). The backing store does not enforce
// column widths, so these constants ARE the schema contract.
pub(crate) const MAX_LOGGER_NAME: usize = 200;
pub(crate) const MAX_MESSAGE: usize = 7000;
pub(crate) const MAX_EXCEPTION_TYPE: usize = 100;
pub(crate) const MAX_EXCEPTION_MESSAGE: usize = 2000;
pub(crate) const MAX_CORRELATION_ID: usize = 100;
pub(crate) const MAX_SERVER: usize = 200;
pub(crate) const MAX_APPLICATION_PATH: usize = 2000;
pub(crate) const MAX_IDENTITY: usize = 200;
pub(crate) const MAX_PERF_DATA: usize = 3000;
pub(crate) const MAX_ERROR_TYPE: usize = 100;

/// One entry of the extension-field allow-list: an `additional_fields` key
/// that is persisted as a dedicated column, and its width cap.
#[derive(Debug, Clone, Copy)]
pub struct ExtensionColumn {
    pub key: &'static str,
    pub column: &'static str,
    pub max_len: usize,
}

/// Allow-list, version 1. Keys not listed here are dropped at ingestion.
///
/// Adding a column here requires a matching column in the partition DDL in
/// `schema.rs`; removing or reordering entries breaks existing tables.
pub const EXTENSION_COLUMNS: &[ExtensionColumn] = &[
    ExtensionColumn { key: "Host", column: "host", max_len: 100 },
    ExtensionColumn { key: "LoggedUser", column: "logged_user", max_len: 200 },
    ExtensionColumn { key: "HttpStatusCode", column: "http_status_code", max_len: 15 },
    ExtensionColumn { key: "Url", column: "url", max_len: 2000 },
    ExtensionColumn { key: "Referer", column: "referer", max_len: 2000 },
    ExtensionColumn { key: "ClientIP", column: "client_ip", max_len: 50 },
    ExtensionColumn { key: "RequestData", column: "request_data", max_len: 2000 },
    ExtensionColumn { key: "ResponseData", column: "response_data", max_len: 2000 },
    ExtensionColumn { key: "ServiceName", column: "service_name", max_len: 100 },
    ExtensionColumn { key: "ServiceDisplayName", column: "service_display_name", max_len: 200 },
];

/// Clip a string to at most `max_chars` characters, never splitting a scalar.
pub(crate) fn clip(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub(crate) fn clip_opt(value: Option<&String>, max_chars: usize) -> Option<&str> {
    value.map(|v| clip(v, max_chars))
}

pub(crate) fn clip_owned(mut s: String, max_chars: usize) -> String {
    if let Some((idx, _)) = s.char_indices().nth(max_chars) {
        s.truncate(idx);
    }
    s
}

/// One diagnostic event, immutable once handed to ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub logger_name: String,
    pub log_level: LogLevel,
    pub time_utc: DateTime<Utc>,
    pub application_path: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub exception_type: Option<String>,
    #[serde(default)]
    pub exception_message: Option<String>,
    #[serde(default)]
    pub exception_additional_info: Option<String>,
    #[serde(default)]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub process_id: Option<i32>,
    #[serde(default)]
    pub thread_id: Option<i32>,
    #[serde(default)]
    pub identity: Option<String>,
    /// Open extension mapping. Only allow-listed keys are persisted.
    #[serde(default)]
    pub additional_fields: HashMap<String, String>,
    /// Numeric metric mapping, serialized to a compact JSON column.
    #[serde(default)]
    pub performance_data: HashMap<String, f32>,
}

/// Latest known runtime state of one (application, server) pair.
///
/// The performance triple and the error pair are independent sub-records:
/// a row may carry either, both or neither of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationStatus {
    pub application_path: String,
    pub server: String,
    pub cpu: Option<f32>,
    pub memory: Option<f32>,
    pub last_perf_update_utc: Option<DateTime<Utc>>,
    pub last_error_type: Option<String>,
    pub last_error_time_utc: Option<DateTime<Utc>>,
}

/// Status report for one (application, server) pair.
///
/// Each optional sub-record maps to its own update clause; an update with
/// neither sub-record present is a no-op at the API level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub application_path: String,
    pub server: String,
    #[serde(default)]
    pub performance: Option<PerformanceUpdate>,
    #[serde(default)]
    pub error: Option<ErrorUpdate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceUpdate {
    pub cpu: Option<f32>,
    pub memory: Option<f32>,
    pub observed_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorUpdate {
    pub error_type: Option<String>,
    pub observed_utc: DateTime<Utc>,
}

/// Search descriptor for `search_logs`. Not persisted.
#[derive(Debug, Clone)]
pub struct LogSearchCriteria {
    /// Inclusive lower bound.
    pub from_utc: DateTime<Utc>,
    /// Exclusive upper bound.
    pub to_utc: DateTime<Utc>,
    /// When unset, the search fans out to every known application table.
    pub application_path: Option<String>,
    /// Acceptable levels (set membership, not a threshold). Empty = all.
    pub levels: Vec<LogLevel>,
    pub server: Option<String>,
    pub keywords: KeywordFilters,
    pub limit: usize,
    pub offset: usize,
}

/// Keyword filters, each bound to a designated column. Unset fields impose
/// no constraint.
#[derive(Debug, Clone, Default)]
pub struct KeywordFilters {
    /// Exact match on the url column.
    pub url: Option<String>,
    /// Exact match on the client_ip column.
    pub client_ip: Option<String>,
    /// Exact match on the service_name column.
    pub service_name: Option<String>,
    /// Substring match on the message column.
    pub message: Option<String>,
}
