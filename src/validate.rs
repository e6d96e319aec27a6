//! Request validation: untyped wire payload to a well-formed render request
//!
//! This stage is a pure function and the only place a request can be rejected
//! with a client error. The URL gate is the defense against local-file and
//! internal-scheme access: nothing reaches the browser stage without an
//! absolute `http`/`https` target.

use serde::Deserialize;
use url::Url;

use crate::{Error, MarginMode, PageFormat, PdfSettings, Result};

/// Raw request body as received on the wire
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPayload {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub landscape: Option<bool>,
    #[serde(default)]
    pub print_background: Option<bool>,
    #[serde(default)]
    pub margin: Option<String>,
}

/// A validated render request, immutable for the duration of the job
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub url: Url,
    pub pdf: PdfSettings,
}

/// Validate a wire payload into a [`RenderRequest`].
///
/// Only the URL can fail validation. The remaining fields are free-form and
/// default rather than reject: unknown formats fall back to A4, any margin
/// value other than `"none"` applies the fixed profile, `printBackground`
/// is on unless explicitly disabled.
pub fn validate(payload: RenderPayload) -> Result<RenderRequest> {
    let raw = payload.url.trim();
    if raw.is_empty() {
        return Err(Error::InvalidUrl("empty url".to_string()));
    }

    let url = Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("unparsable url: {}", e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::InvalidUrl(format!("disallowed scheme: {}", other)));
        }
    }

    let format = payload
        .format
        .as_deref()
        .map(PageFormat::from_param)
        .unwrap_or_default();

    let margin = match payload.margin.as_deref() {
        Some("none") => MarginMode::None,
        _ => MarginMode::Default,
    };

    Ok(RenderRequest {
        url,
        pdf: PdfSettings {
            format,
            landscape: payload.landscape.unwrap_or(false),
            print_background: payload.print_background.unwrap_or(true),
            margin,
        },
    })
}
