use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::config::{parse_bool, parse_duration, parse_mss, ProbeDefaults};
use crate::metrics;
use crate::probe::{self, ProbeConfig, Runner};
use crate::AppState;

use super::AppError;

// ─── Query parameters ────────────────────────────────────────────

/// Raw `/probe` query. Everything arrives as text and is validated in
/// [`ProbeParams::into_config`]; empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ProbeParams {
    pub target: Option<String>,
    pub duration: Option<String>,
    #[serde(rename = "omit-duration")]
    pub omit_duration: Option<String>,
    pub mss: Option<String>,
    pub reverse: Option<String>,
}

impl ProbeParams {
    pub fn into_config(self, defaults: &ProbeDefaults) -> Result<ProbeConfig, AppError> {
        let target = present(&self.target)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::MissingTarget)?
            .to_owned();

        let duration = duration_param(&self.duration, "duration", defaults.duration)?;
        let omit_duration =
            duration_param(&self.omit_duration, "omit-duration", defaults.omit_duration)?;

        let mss = match present(&self.mss) {
            Some(raw) => parse_mss(raw).map_err(|_| AppError::InvalidMss)?,
            None => defaults.mss,
        };

        let reverse = match present(&self.reverse) {
            Some(raw) => parse_bool(raw).ok_or(AppError::InvalidReverse)?,
            None => false,
        };

        Ok(ProbeConfig {
            target,
            timeout: defaults.timeout,
            iperf3_path: defaults.iperf3_path.clone(),
            duration,
            omit_duration,
            mss,
            reverse,
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn duration_param(
    value: &Option<String>,
    param: &'static str,
    default: Duration,
) -> Result<Duration, AppError> {
    match present(value) {
        Some(raw) => parse_duration(raw).map_err(|_| AppError::InvalidDuration { param }),
        None => Ok(default),
    }
}

// ─── GET /probe ──────────────────────────────────────────────────

pub async fn probe<R: Runner>(
    State(state): State<Arc<AppState<R>>>,
    Query(params): Query<ProbeParams>,
) -> Result<Response, AppError> {
    let config = params.into_config(&state.defaults).inspect_err(|err| {
        warn!(%err, "rejected probe request");
    })?;

    let report = probe::collect(&state.runner, &config).await;
    let body = metrics::render(&report)?;

    Ok(([(header::CONTENT_TYPE, metrics::CONTENT_TYPE)], body).into_response())
}
