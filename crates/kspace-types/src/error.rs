// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — Errors
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

/// Every condition here invalidates the current simulation step; the host
/// decides whether to abort the run.
#[derive(Error, Debug)]
pub enum KspaceError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Can't open file `{path}` for writing: {source}")]
    FileOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Trying to extract a k = {logk} (log) < min stored = {min_logk}")]
    WavenumberBelowTable { logk: f64, min_logk: f64 },

    #[error("delta_nu or delta_cdm is NaN at log k = {logk}")]
    NanAmplitude { logk: f64 },

    #[error("delta_nu_curr={delta_nu} i={index} delta_cdm_curr={delta_cdm} kk={k}")]
    InvalidNeutrinoAmplitude {
        index: usize,
        delta_nu: f64,
        delta_cdm: f64,
        k: f64,
    },

    #[error("Did not read delta_tot from resume file at a = {a} (TimeTransfer = {time_transfer}), but we probably should have")]
    MissingResume { a: f64, time_transfer: f64 },

    #[error("Communication error: {0}")]
    Communication(String),
}

pub type KspaceResult<T> = Result<T, KspaceError>;
