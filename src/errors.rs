//! Unified application error type.
//! All modules (db, core, cli, remote) return AppError to keep the error
//! handling consistent and easy to manage.

use crate::remote::{CaptureError, StoreError};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("Store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid unlock hour: {0} (expected 0-23)")]
    InvalidUnlockHour(u32),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid template file: {0}")]
    InvalidTemplateFile(String),

    // ---------------------------
    // Lookup errors
    // ---------------------------
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Unknown task '{0}' in this checklist")]
    UnknownTask(String),

    #[error("Unknown submission: {0}")]
    UnknownSubmission(String),

    // ---------------------------
    // Checklist logic errors
    // ---------------------------
    #[error("Submission is locked until {0} and cannot be edited")]
    ReadOnly(String),

    #[error("No active submission to finalize")]
    NothingToFinalize,

    #[error("Final updates are not accepted here: use finalize")]
    FinalUpdateRejected,

    #[error("Cannot finalize: required photos missing for {}", .missing.join(", "))]
    FinalizeBlocked { missing: Vec<String> },

    #[error("Some tasks are incomplete: {}", .incomplete.join(", "))]
    ConfirmationRequired { incomplete: Vec<String> },

    #[error("Illegal status transition: {from} → {to}")]
    IllegalTransition { from: String, to: String },

    #[error("Task '{0}' has no flagged audit to override")]
    NotFlagged(String),

    #[error("Operation '{0}' requires the manager role")]
    Forbidden(String),

    #[error("Camera error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Photo encoding error: {0}")]
    Encode(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    #[error("Failed to save configuration")]
    ConfigSave,

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

pub type AppResult<T> = Result<T, AppError>;
