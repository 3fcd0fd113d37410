//! Unified error model for the dashboard pipeline and its HTTP frontend.
//!
//! `DashError` is what library code returns. `AppError` is the serialisable shape handed to
//! HTTP clients; every `DashError` maps onto one, carrying a stable code and a message fit
//! for showing in place of a chart.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, thiserror::Error)]
pub enum DashError {
    #[error("source not found: {locator}")]
    SourceNotFound { locator: String },

    #[error("cannot parse {locator}: {detail}")]
    Parse { locator: String, detail: String, missing: Vec<String> },

    #[error("{locator} has more than one row for {key}")]
    DuplicateKey { locator: String, key: String },

    #[error("invalid page definition: {0}")]
    InvalidPage(String),

    #[error("unknown page '{0}'")]
    UnknownPage(String),

    #[error("io error on {locator}: {source}")]
    Io { locator: String, #[source] source: std::io::Error },

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("workbook {locator}: {detail}")]
    Excel { locator: String, detail: String },
}

impl DashError {
    pub fn parse<L: Into<String>, D: Into<String>>(locator: L, detail: D) -> Self {
        DashError::Parse { locator: locator.into(), detail: detail.into(), missing: Vec::new() }
    }

    /// Parse failure caused by declared columns absent from the source header.
    pub fn missing_columns<L: Into<String>>(locator: L, missing: Vec<String>) -> Self {
        let detail = format!("missing required columns: {}", missing.join(", "));
        DashError::Parse { locator: locator.into(), detail, missing }
    }
}

pub type DashResult<T> = Result<T, DashError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    NotFound { code: String, message: String },
    Unprocessable { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Unprocessable { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Unprocessable { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn unprocessable<S: Into<String>>(code: S, msg: S) -> Self { AppError::Unprocessable { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::Unprocessable { .. } => 422,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<DashError> for AppError {
    fn from(err: DashError) -> Self {
        let message = err.to_string();
        match err {
            DashError::SourceNotFound { .. } => AppError::NotFound { code: "source_not_found".into(), message },
            DashError::UnknownPage(_) => AppError::NotFound { code: "unknown_page".into(), message },
            DashError::Parse { .. } => AppError::Unprocessable { code: "parse_error".into(), message },
            DashError::DuplicateKey { .. } => AppError::Unprocessable { code: "duplicate_key".into(), message },
            DashError::InvalidPage(_) => AppError::UserInput { code: "invalid_page".into(), message },
            DashError::Excel { .. } => AppError::Unprocessable { code: "workbook_error".into(), message },
            DashError::Io { .. } => AppError::Internal { code: "io_error".into(), message },
            DashError::Polars(_) => AppError::Internal { code: "table_error".into(), message },
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal".into(), message: err.to_string() }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
