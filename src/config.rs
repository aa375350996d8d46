// src/config.rs

// Remote configuration for the admission pipeline: one immutable snapshot of
// filter toggles and thresholds, plus the loader that parses the service's
// JSON document into it. Numeric fields arrive string-encoded, so the
// document is walked field-by-field instead of derived. A failed or
// degenerate load never touches the active snapshot.

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Active filter thresholds and enable flags. Immutable once installed;
/// replaced atomically as a whole by the loader or the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Identifier of the config document this snapshot came from.
    pub config_id: String,
    /// Advisory window (seconds) within which some frame should be accepted.
    pub frame_acceptance_timeout: f64,

    /// Whether the tracking-health filter participates.
    pub is_tracking_filter_enabled: bool,

    /// Whether the movement filter participates.
    pub is_movement_filter_enabled: bool,
    /// Per-axis displacement (meters) a frame must exceed to count as moved.
    pub movement_filter_threshold: f64,

    /// Whether the blur filter participates.
    pub is_blur_filter_enabled: bool,
    /// Laplacian variance below which a frame is considered blurred.
    pub blur_filter_variance_threshold: f64,
    /// Fraction of the recent average variance under which a frame counts as
    /// a sudden sharpness drop.
    pub blur_filter_sudden_drop_threshold: f64,
    /// Recent average variance under which the whole stream is treated as
    /// uniformly low-texture and frames keep flowing.
    pub blur_filter_average_throughput_threshold: f64,

    /// Whether the camera-pitch filter participates.
    pub is_camera_pitch_filter_enabled: bool,

    /// Whether the image-quality filter participates.
    pub is_image_quality_filter_enabled: bool,
    /// Minimum learned quality score for acceptance.
    pub image_quality_filter_score_threshold: f64,
    /// Scoring model artifact, owned by an external collaborator.
    pub image_quality_model_uri: Option<String>,
    /// Version tag of the scoring model artifact.
    pub image_quality_model_version: Option<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            config_id: "default".to_string(),
            frame_acceptance_timeout: 1.0,
            is_tracking_filter_enabled: true,
            is_movement_filter_enabled: true,
            movement_filter_threshold: 0.001,
            is_blur_filter_enabled: true,
            blur_filter_variance_threshold: 250.0,
            blur_filter_sudden_drop_threshold: 0.4,
            blur_filter_average_throughput_threshold: 25.0,
            is_camera_pitch_filter_enabled: true,
            is_image_quality_filter_enabled: true,
            image_quality_filter_score_threshold: 0.7,
            image_quality_model_uri: None,
            image_quality_model_version: None,
        }
    }
}

/// Config-load failures. All of them leave the active snapshot unchanged.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Service reported itself unavailable; carries the provided reason.
    Unavailable(String),
    /// Document was absent, not JSON, or structurally wrong.
    Malformed(String),
    /// A required field was missing from the nested config object.
    MissingField(&'static str),
    /// A string-encoded numeric field failed to parse.
    InvalidNumber {
        field: &'static str,
        value: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ConfigError::Unavailable(reason) => {
                write!(f, "service unavailable: {}", reason)
            }
            ConfigError::Malformed(msg) => write!(f, "malformed config document: {}", msg),
            ConfigError::MissingField(field) => write!(f, "missing config field: {}", field),
            ConfigError::InvalidNumber { field, value } => {
                write!(f, "invalid numeric value for {}: {:?}", field, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Holds the active snapshot and applies all-or-nothing loads over it.
#[derive(Debug)]
pub struct ConfigLoader {
    active: FilterConfig,
}

impl ConfigLoader {
    /// Starts with the built-in defaults active.
    pub fn new() -> Self {
        ConfigLoader {
            active: FilterConfig::default(),
        }
    }

    /// The currently active snapshot.
    pub fn active(&self) -> &FilterConfig {
        &self.active
    }

    /// Parses a remote config document and, only if every field parses,
    /// swaps it in as the active snapshot.
    ///
    /// Document shape:
    /// `{"available": bool, "failure_reason": String, "config": {...}}`
    /// where the nested object carries booleans as booleans and numbers as
    /// strings. `null`, empty, or malformed payloads keep the previous
    /// snapshot in place.
    pub fn load_json(&mut self, document: &str) -> Result<(), ConfigError> {
        let candidate = Self::parse_document(document)?;
        info!(
            "activating config {:?} (was {:?})",
            candidate.config_id, self.active.config_id
        );
        self.active = candidate;
        Ok(())
    }

    fn parse_document(document: &str) -> Result<FilterConfig, ConfigError> {
        let root: Value = serde_json::from_str(document).map_err(|e| {
            error!("config document is not valid JSON: {}", e);
            ConfigError::Malformed(e.to_string())
        })?;

        let root = root
            .as_object()
            .ok_or_else(|| ConfigError::Malformed("top level is not an object".into()))?;

        let available = root
            .get("available")
            .and_then(Value::as_bool)
            .ok_or(ConfigError::MissingField("available"))?;
        if !available {
            let reason = root
                .get("failure_reason")
                .and_then(Value::as_str)
                .unwrap_or("no reason given")
                .to_string();
            warn!("localization unavailable here: {}", reason);
            return Err(ConfigError::Unavailable(reason));
        }

        let nested = root
            .get("config")
            .ok_or(ConfigError::MissingField("config"))?;
        let nested = match nested.as_object() {
            Some(obj) if !obj.is_empty() => obj,
            _ => {
                warn!("config payload is null or empty, keeping previous snapshot");
                return Err(ConfigError::Malformed(
                    "config payload is null or empty".into(),
                ));
            }
        };

        // Build the whole candidate before anything is applied.
        Ok(FilterConfig {
            config_id: get_string(nested, "config_id")?,
            frame_acceptance_timeout: get_number(nested, "frame_acceptance_timeout")?,
            is_tracking_filter_enabled: get_bool(nested, "is_tracking_filter_enabled")?,
            is_movement_filter_enabled: get_bool(nested, "is_movement_filter_enabled")?,
            movement_filter_threshold: get_number(nested, "movement_filter_threshold")?,
            is_blur_filter_enabled: get_bool(nested, "is_blur_filter_enabled")?,
            blur_filter_variance_threshold: get_number(nested, "blur_filter_variance_threshold")?,
            blur_filter_sudden_drop_threshold: get_number(
                nested,
                "blur_filter_sudden_drop_threshold",
            )?,
            blur_filter_average_throughput_threshold: get_number(
                nested,
                "blur_filter_average_throughput_threshold",
            )?,
            is_camera_pitch_filter_enabled: get_bool(nested, "is_camera_pitch_filter_enabled")?,
            is_image_quality_filter_enabled: get_bool(nested, "is_image_quality_filter_enabled")?,
            image_quality_filter_score_threshold: get_number(
                nested,
                "image_quality_filter_score_threshold",
            )?,
            image_quality_model_uri: get_optional_string(nested, "image_quality_model_uri"),
            image_quality_model_version: get_optional_string(nested, "image_quality_model_version"),
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn get_bool(
    obj: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<bool, ConfigError> {
    obj.get(field)
        .and_then(Value::as_bool)
        .ok_or(ConfigError::MissingField(field))
}

fn get_string(
    obj: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<String, ConfigError> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ConfigError::MissingField(field))
}

fn get_optional_string(obj: &serde_json::Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Numeric fields are transmitted as strings; plain JSON numbers are also
/// tolerated. Non-finite values (inf, NaN, overflowing literals like
/// `"1e400"`) are rejected so every threshold in an active snapshot is a
/// real number.
fn get_number(
    obj: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<f64, ConfigError> {
    let parsed = match obj.get(field) {
        Some(Value::String(s)) => s.parse::<f64>().map_err(|_| ConfigError::InvalidNumber {
            field,
            value: s.clone(),
        })?,
        Some(Value::Number(n)) => n.as_f64().ok_or(ConfigError::InvalidNumber {
            field,
            value: n.to_string(),
        })?,
        _ => return Err(ConfigError::MissingField(field)),
    };
    if !parsed.is_finite() {
        return Err(ConfigError::InvalidNumber {
            field,
            value: parsed.to_string(),
        });
    }
    Ok(parsed)
}
