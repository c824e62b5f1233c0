//! Prometheus metrics recorded by the handlers.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Register descriptions so `/metrics` carries HELP lines.
pub fn describe() {
    describe_counter!("tiles_rendered_total", "Tiles served, by outcome");
    describe_counter!("uploads_total", "Raster uploads, by outcome");
    describe_counter!("reprojections_total", "Uploads reprojected into the display CRS");
    describe_histogram!(
        "tile_render_duration_seconds",
        Unit::Seconds,
        "Time to render one tile"
    );
    describe_histogram!(
        "upload_duration_seconds",
        Unit::Seconds,
        "Time to store and process one upload"
    );
}

/// `outcome` is `rendered`, `empty` or an error kind.
pub fn record_tile(outcome: &'static str, elapsed: Duration) {
    counter!("tiles_rendered_total", "outcome" => outcome).increment(1);
    histogram!("tile_render_duration_seconds").record(elapsed.as_secs_f64());
}

/// `outcome` is `stored`, `reprojected` or an error kind.
pub fn record_upload(outcome: &'static str, elapsed: Duration) {
    counter!("uploads_total", "outcome" => outcome).increment(1);
    histogram!("upload_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_reprojection() {
    counter!("reprojections_total").increment(1);
}
