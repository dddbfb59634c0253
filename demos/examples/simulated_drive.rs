// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated drive past a campaign's storefront fences.
//!
//! This example shows how to combine:
//! - `waymark_geo` to load fence records from a JSON campaign payload,
//! - `waymark_tracker` to hold the registry,
//! - `waymark_watch` to run a session over a `ChannelSource` fed from a producer thread.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p waymark_demos --example simulated_drive`

use std::error::Error;
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use waymark_geo::{FenceRecord, GeoPoint, distance_meters, format_distance};
use waymark_tracker::Registry;
use waymark_watch::{Callbacks, ChannelSource, LocationError, WatchOptions, watch};

const CAMPAIGN: &str = r#"{
    "id": "spring-promo",
    "locations": [
        { "id": "midtown", "target": { "lat": 40.7549, "lng": -73.9840, "radius": 300 } },
        { "id": "chelsea", "target": { "lat": 40.7465, "lng": -74.0014, "radius": 250 } },
        { "id": "village", "target": { "lat": 40.7336, "lng": -74.0027, "radius": 400 } }
    ]
}"#;

#[derive(Debug, Deserialize)]
struct Campaign {
    id: String,
    locations: Vec<Location>,
}

#[derive(Debug, Deserialize)]
struct Location {
    id: String,
    target: FenceRecord,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let campaign: Campaign = serde_json::from_str(CAMPAIGN)?;
    let registry = Registry::from_records(
        &campaign.id,
        campaign.locations.into_iter().map(|l| (l.id, l.target)),
    )?;
    info!(campaign = %campaign.id, fences = registry.len(), "loaded campaign");

    let midtown = *registry.get("midtown").ok_or("missing fence")?.center();
    let listener = Callbacks::new()
        .on_location_update(move |p| {
            println!(
                "at {:.5}, {:.5} ({} from midtown)",
                p.latitude,
                p.longitude,
                format_distance(distance_meters(p, &midtown))
            );
        })
        .on_enter(|fence, _| println!("  -> entered {} ({})", fence.id(), fence.owner_id()))
        .on_exit(|fence, _| println!("  <- left {}", fence.id()))
        .on_error(|err| println!("  !! {err}"));

    let (feed, source) = ChannelSource::bounded(4);
    let session = watch(&source, registry, listener, &WatchOptions::default())?;

    // Head south-south-west from Times Square, with a dropped fix halfway.
    let producer = thread::spawn(move || {
        let start = GeoPoint::new(40.7580, -73.9855);
        for step in 0..=40_u32 {
            let sample = if step == 20 {
                Err(LocationError::PositionUnavailable)
            } else {
                Ok(start
                    .destination(200.0, f64::from(step) * 75.0)
                    .with_timestamp(u64::from(step) * 1_000))
            };
            if feed.send(sample).is_err() {
                return;
            }
            thread::sleep(Duration::from_millis(25));
        }
    });

    producer.join().map_err(|_| "producer panicked")?;
    thread::sleep(Duration::from_millis(100));
    session.stop();
    Ok(())
}
