// src/main.rs
// Demo entry point: drives the parking simulation fixture through the whole
// admission-and-request chain with a simulated network client, printing what
// the pipeline accepted, rejected, and resolved.

use framegate::{
    LocalizationError, LocalizationListener, LocalizationResult, LocalizationSession,
    SimulatedLocalizationClient, SimulationFixture, TrackingQuality, ZoneType,
};
use log::{info, warn};
use nalgebra::Vector3;
use std::sync::Arc;
use std::time::Duration;

struct LoggingListener;

impl LocalizationListener for LoggingListener {
    fn on_location(&self, result: LocalizationResult) {
        info!(
            "located at ({:.6}, {:.6}) with {} zone(s)",
            result.location.latitude,
            result.location.longitude,
            result.zones.len()
        );
    }

    fn on_failure(&self, error: LocalizationError, _metadata: Option<framegate::ErrorMetadata>) {
        warn!("localization failed: {}", error);
    }

    fn on_quality_timeout(&self, elapsed: Duration) {
        warn!("no acceptable frame for {:?}", elapsed);
    }
}

fn main() {
    env_logger::init();
    info!("starting framegate simulation demo");

    let fixture = SimulationFixture::parking();
    let client = SimulatedLocalizationClient::for_fixture(&fixture);
    let mut session = LocalizationSession::new(Box::new(client));

    session.set_simulation_fixture(Some(fixture.clone()));
    session.connect("demo-credential", Arc::new(LoggingListener));
    session.start_updating_location();

    // Walk the simulated device forward; every step moves on all axes so the
    // movement gate keeps accepting.
    for step in 0..10i64 {
        let position = Vector3::new(step as f64 * 0.1, step as f64 * 0.05, step as f64 * 0.1);
        let mut frame = fixture.sample_frame(step * 33, position);
        if step == 4 {
            // One degraded frame to exercise the rejection path.
            frame.tracking = TrackingQuality::InsufficientLight;
        }
        session.localize(&frame);
    }

    session.is_zone_in_radius(ZoneType::Parking, 10.0, |inside| {
        info!("within 10 m of parking zone: {}", inside);
    });
    session.is_zone_in_radius(ZoneType::Parking, 100.0, |inside| {
        info!("within 100 m of parking zone: {}", inside);
    });

    session.stop_updating_location();
    info!("demo finished; {}", session.statistics().summary());
}
