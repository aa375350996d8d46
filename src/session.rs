// src/session.rs

// The request-lifecycle state machine. A session owns the admission chain,
// rejection statistics, anchor bookkeeping, and the single in-flight
// localization request, and routes asynchronous outcomes to the listener the
// caller supplied at connect time.

use crate::anchor::AnchorManager;
use crate::config::FilterConfig;
use crate::filters::{FilterVerdict, FrameFilterChain, ImageQualityScorer};
use crate::frame::{CameraIntrinsics, Frame, FrameImage, Pose};
use crate::geo::{Coordinate, Zone, ZoneType};
use crate::simulation::SimulationFixture;
use crate::statistics::RejectionStatistics;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Upper bound (seconds) on the frame-acceptance window; out-of-range or
/// non-finite configured timeouts are clamped to it.
const MAX_ACCEPTANCE_WINDOW_SECS: f64 = 3600.0;

/// Session lifecycle states. `Stopped` is initial; `Localizing` is entered
/// only through an explicit start after a connect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Not processing frames.
    Stopped,
    /// Gating frames and dispatching accepted ones.
    Localizing,
}

/// A resolved device location with its associated zones.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalizationResult {
    /// The localized device coordinate.
    pub location: Coordinate,
    /// Zones the service associates with that location.
    pub zones: Vec<Zone>,
}

/// Network/service failures surfaced through the listener's error path.
/// Never fatal to the session; the state stays `Localizing` so the caller
/// can retry on the next frame.
#[derive(Clone, Debug, PartialEq)]
pub enum LocalizationError {
    /// Transport-level failure (timeout, connectivity).
    Network(String),
    /// The service answered with an error.
    Server { code: u16, message: String },
}

impl std::fmt::Display for LocalizationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LocalizationError::Network(msg) => write!(f, "network error: {}", msg),
            LocalizationError::Server { code, message } => {
                write!(f, "server error {}: {}", code, message)
            }
        }
    }
}

impl std::error::Error for LocalizationError {}

/// Optional diagnostic key/value pairs attached to a failure.
pub type ErrorMetadata = HashMap<String, String>;

/// Terminal outcome of one dispatched request.
#[derive(Clone, Debug)]
pub enum LocalizationOutcome {
    /// The service resolved a location.
    Located(LocalizationResult),
    /// The request failed; the error and optional diagnostics ride along.
    Failed {
        /// What went wrong.
        error: LocalizationError,
        /// Optional diagnostic key/value pairs.
        metadata: Option<ErrorMetadata>,
    },
}

/// Caller-supplied sink for session events. `on_location`/`on_failure` are
/// invoked exactly once per dispatched request, possibly on a different
/// thread than the frame producer.
pub trait LocalizationListener: Send + Sync {
    /// A dispatched request resolved to a location.
    fn on_location(&self, result: LocalizationResult);
    /// A dispatched request failed.
    fn on_failure(&self, error: LocalizationError, metadata: Option<ErrorMetadata>);

    /// No frame was accepted within the configured acceptance window.
    /// Advisory; default is to ignore it.
    fn on_quality_timeout(&self, elapsed: Duration) {
        let _ = elapsed;
    }
}

/// Completion token handed to the network collaborator along with a request.
/// Consuming it is the only way to finish the request, which enforces the
/// exactly-once listener contract. Resolving after the session stopped is
/// safe: only the shared in-flight flag and the listener are touched.
pub struct RequestCompletion {
    in_flight: Arc<AtomicBool>,
    listener: Arc<dyn LocalizationListener>,
}

impl RequestCompletion {
    /// Finishes the request: clears the in-flight flag and delivers the
    /// outcome to the listener.
    pub fn resolve(self, outcome: LocalizationOutcome) {
        self.in_flight.store(false, Ordering::SeqCst);
        match outcome {
            LocalizationOutcome::Located(result) => self.listener.on_location(result),
            LocalizationOutcome::Failed { error, metadata } => {
                self.listener.on_failure(error, metadata)
            }
        }
    }
}

/// External network collaborator. Dispatch is fire-and-forget relative to
/// the frame loop; the outcome arrives later through the completion token.
pub trait LocalizationClient {
    /// Sends one request; `completion` must eventually be resolved.
    fn dispatch(&mut self, request: LocalizationRequest, completion: RequestCompletion);
}

/// One localization request, built from an accepted frame (or a simulation
/// fixture standing in for it).
#[derive(Clone, Debug)]
pub struct LocalizationRequest {
    /// Unique request identifier.
    pub uuid: String,
    /// Capture time, epoch milliseconds.
    pub captured_at_ms: i64,
    /// Intrinsics of the capturing camera.
    pub intrinsics: CameraIntrinsics,
    /// Device gravity at capture time.
    pub gravity: nalgebra::UnitQuaternion<f64>,
    /// Approximate device coordinate, when known.
    pub coordinate: Option<Coordinate>,
    /// Pose of the frame relative to the session anchor, when one is set.
    pub anchor_delta: Option<Pose>,
    /// Image payload, carried opaquely.
    pub image: FrameImage,
}

impl LocalizationRequest {
    /// Wire-contract key/value map; composite values are JSON-encoded and
    /// numerics string-encoded, matching the service's expectations.
    pub fn params(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert("uuid".to_string(), self.uuid.clone());
        params.insert("capturedAt".to_string(), self.captured_at_ms.to_string());
        params.insert(
            "intrinsics".to_string(),
            serde_json::json!({
                "fx": self.intrinsics.fx.to_string(),
                "fy": self.intrinsics.fy.to_string(),
                "cx": self.intrinsics.cx.to_string(),
                "cy": self.intrinsics.cy.to_string(),
            })
            .to_string(),
        );
        params.insert(
            "gravity".to_string(),
            serde_json::json!({
                "w": self.gravity.w.to_string(),
                "x": self.gravity.i.to_string(),
                "y": self.gravity.j.to_string(),
                "z": self.gravity.k.to_string(),
            })
            .to_string(),
        );
        if let Some(coordinate) = &self.coordinate {
            params.insert(
                "coordinate".to_string(),
                serde_json::json!({
                    "latitude": coordinate.latitude,
                    "longitude": coordinate.longitude,
                })
                .to_string(),
            );
        }
        params
    }
}

/// Orchestrates connect/start/stop/localize around the admission chain.
///
/// All mutable session state (movement filter memory, anchor, statistics,
/// lifecycle flag) is owned here and mutated only through `&mut self`
/// operations; the network-response path shares nothing with the session
/// except the atomic in-flight flag and the listener.
pub struct LocalizationSession {
    state: SessionState,
    credential: Option<String>,
    listener: Option<Arc<dyn LocalizationListener>>,
    client: Box<dyn LocalizationClient + Send>,
    config: FilterConfig,
    chain: FrameFilterChain,
    statistics: RejectionStatistics,
    anchor: AnchorManager,
    in_flight: Arc<AtomicBool>,
    fixture: Option<SimulationFixture>,
    zones: HashMap<ZoneType, Coordinate>,
    device_coordinate: Option<Coordinate>,
    acceptance_deadline: Option<Instant>,
}

impl LocalizationSession {
    /// A stopped session over the given network collaborator.
    pub fn new(client: Box<dyn LocalizationClient + Send>) -> Self {
        LocalizationSession {
            state: SessionState::Stopped,
            credential: None,
            listener: None,
            client,
            config: FilterConfig::default(),
            chain: FrameFilterChain::new(),
            statistics: RejectionStatistics::new(),
            anchor: AnchorManager::new(),
            in_flight: Arc::new(AtomicBool::new(false)),
            fixture: None,
            zones: HashMap::new(),
            device_coordinate: None,
            acceptance_deadline: None,
        }
    }

    /// Builds a session whose image-quality filter uses the given scoring
    /// model instead of the built-in contrast fallback.
    pub fn with_scorer(
        client: Box<dyn LocalizationClient + Send>,
        scorer: Box<dyn ImageQualityScorer + Send>,
    ) -> Self {
        let mut session = Self::new(client);
        session.chain = FrameFilterChain::with_scorer(scorer);
        session
    }

    /// Stores the credential and listener. No state change, no synchronous
    /// credential validation.
    pub fn connect(&mut self, credential: &str, listener: Arc<dyn LocalizationListener>) {
        self.credential = Some(credential.to_string());
        self.listener = Some(listener);
        debug!("session connected");
    }

    /// Stopped → Localizing. Requires a prior connect; idempotent while
    /// already localizing.
    pub fn start_updating_location(&mut self) {
        if self.listener.is_none() {
            warn!("start_updating_location before connect, ignoring");
            return;
        }
        if self.state == SessionState::Localizing {
            return;
        }
        self.state = SessionState::Localizing;
        self.arm_acceptance_window();
        info!("session localizing (config {:?})", self.config.config_id);
    }

    /// Any state → Stopped. Clears the anchor; statistics persist across
    /// stop/start cycles.
    pub fn stop_updating_location(&mut self) {
        self.state = SessionState::Stopped;
        self.anchor.clear();
        self.acceptance_deadline = None;
        info!("session stopped; {}", self.statistics.summary());
    }

    /// Gates one frame and, on acceptance, dispatches a localization request
    /// unless one is already outstanding. Disconnected or stopped sessions
    /// ignore frames entirely.
    pub fn localize(&mut self, frame: &Frame) {
        let Some(listener) = self.listener.clone() else {
            debug!("localize before connect, dropping frame");
            return;
        };
        if self.state != SessionState::Localizing {
            debug!("localize while stopped, dropping frame");
            return;
        }

        match self.chain.evaluate(frame, &self.config) {
            FilterVerdict::Rejected(reason) => {
                self.statistics.accumulate(reason);
                self.check_acceptance_window();
            }
            FilterVerdict::Accepted => {
                self.arm_acceptance_window();
                // Frames during an outstanding request still ran the chain
                // (movement state advanced), but never start a second one.
                if self.in_flight.swap(true, Ordering::SeqCst) {
                    debug!("request already in flight, not dispatching");
                    return;
                }
                let request = self.build_request(frame);
                info!("dispatching localization request {}", request.uuid);
                self.client.dispatch(
                    request,
                    RequestCompletion {
                        in_flight: Arc::clone(&self.in_flight),
                        listener,
                    },
                );
            }
        }
    }

    /// Stores `frame` as the anchor if none is set (first-call-wins).
    /// Returns whether the frame was taken.
    pub fn set_anchor(&mut self, frame: Frame) -> bool {
        self.anchor.set(frame)
    }

    /// Discards the anchor, allowing a new `set_anchor`.
    pub fn unset_anchor(&mut self) {
        self.anchor.clear();
    }

    /// Whether an anchor frame is currently set.
    pub fn has_anchor(&self) -> bool {
        self.anchor.is_set()
    }

    /// Host-supplied device coordinate (ignored in simulation mode).
    pub fn update_location(&mut self, coordinate: Coordinate) {
        self.device_coordinate = Some(coordinate);
    }

    /// Swaps in a new config snapshot; takes effect on the next frame.
    pub fn set_config(&mut self, config: FilterConfig) {
        info!(
            "config swap {:?} -> {:?}",
            self.config.config_id, config.config_id
        );
        self.config = config;
    }

    /// The active config snapshot.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Enables simulation mode with the given fixture, or disables it.
    pub fn set_simulation_fixture(&mut self, fixture: Option<SimulationFixture>) {
        self.fixture = fixture;
    }

    /// Records a zone for radius queries outside simulation mode.
    pub fn register_zone(&mut self, zone: Zone) {
        self.zones.insert(zone.zone_type, zone.coordinate);
    }

    /// Reports via `callback` whether the device is within `radius_m` meters
    /// of the known coordinate for `zone_type`. In simulation mode both ends
    /// come from the fixture. Unknown zone or unknown device position
    /// reports `false`.
    pub fn is_zone_in_radius<F: FnOnce(bool)>(
        &self,
        zone_type: ZoneType,
        radius_m: f64,
        callback: F,
    ) {
        let device = match &self.fixture {
            Some(fixture) => Some(fixture.coordinate),
            None => self.device_coordinate,
        };
        let zone = match &self.fixture {
            Some(fixture) if fixture.zone.zone_type == zone_type => Some(fixture.zone.coordinate),
            _ => self.zones.get(&zone_type).copied(),
        };

        match (device, zone) {
            (Some(device), Some(zone)) => {
                let distance = device.distance_to(&zone);
                debug!(
                    "zone {:?} distance {:.1} m, radius {:.1} m",
                    zone_type, distance, radius_m
                );
                callback(distance <= radius_m);
            }
            _ => {
                warn!("zone radius query without device or zone coordinate");
                callback(false);
            }
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The rejection tallies accumulated so far.
    pub fn statistics(&self) -> &RejectionStatistics {
        &self.statistics
    }

    /// Explicitly clears the rejection tallies.
    pub fn reset_statistics(&mut self) {
        self.statistics.reset();
    }

    /// Whether a dispatched request has not resolved yet.
    pub fn is_request_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// The credential supplied at connect time, if any.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    fn build_request(&self, frame: &Frame) -> LocalizationRequest {
        let anchor_delta = self
            .anchor
            .is_set()
            .then(|| self.anchor.delta_pose_for(frame));

        match &self.fixture {
            Some(fixture) => LocalizationRequest {
                uuid: Uuid::new_v4().to_string(),
                captured_at_ms: frame.timestamp_ms,
                intrinsics: fixture.intrinsics,
                gravity: fixture.gravity,
                coordinate: Some(fixture.coordinate),
                anchor_delta,
                image: fixture.image.clone(),
            },
            None => LocalizationRequest {
                uuid: Uuid::new_v4().to_string(),
                captured_at_ms: frame.timestamp_ms,
                intrinsics: frame.intrinsics,
                gravity: frame.gravity,
                coordinate: self.device_coordinate,
                anchor_delta,
                image: frame.image.clone(),
            },
        }
    }

    /// The acceptance window as a duration. The loader already rejects
    /// non-finite timeouts, but a config snapshot can also arrive through
    /// `set_config`, so degenerate values are clamped here rather than left
    /// to panic in `Duration::from_secs_f64`.
    fn acceptance_window(&self) -> Duration {
        let secs = self.config.frame_acceptance_timeout;
        if secs.is_finite() {
            Duration::from_secs_f64(secs.clamp(0.0, MAX_ACCEPTANCE_WINDOW_SECS))
        } else {
            Duration::from_secs_f64(MAX_ACCEPTANCE_WINDOW_SECS)
        }
    }

    fn arm_acceptance_window(&mut self) {
        self.acceptance_deadline = Some(Instant::now() + self.acceptance_window());
    }

    /// Advisory escalation: when no frame has been accepted within the
    /// configured window, tell the listener once and re-arm.
    fn check_acceptance_window(&mut self) {
        let Some(deadline) = self.acceptance_deadline else {
            return;
        };
        let now = Instant::now();
        if now < deadline {
            return;
        }
        let elapsed = self.acceptance_window() + (now - deadline);
        warn!(
            "no frame accepted in {:.2?}; {}",
            elapsed,
            self.statistics.summary()
        );
        if let Some(listener) = &self.listener {
            listener.on_quality_timeout(elapsed);
        }
        self.arm_acceptance_window();
    }
}
