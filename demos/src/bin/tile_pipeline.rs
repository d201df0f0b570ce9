//! # Tile Pipeline Demo
//!
//! Builds buckets for a synthetic tile on a worker thread, ships them as
//! encoded payloads over a channel, and hydrates them on the main thread
//! against the dummy GPU backend.
//!
//! ```bash
//! cargo run -p tilepack-demos --bin tile_pipeline -- --zoom 14 --features 5000
//! RUST_LOG=debug cargo run -p tilepack-demos --bin tile_pipeline -- --kinds circle,symbol
//! ```

use std::thread;
use std::time::Instant;

use clap::Parser;
use crossbeam_channel::{Receiver, Sender};

use tilepack_core::layer::LayerKind;
use tilepack_core::serialize::{decode, encode, Format};
use tilepack_core::{Bucket, BucketError, BucketOptions};
use tilepack_demos::{demo_layer, synthetic_features, visible_features};
use tilepack_graphics::{GraphicsDevice, HydrateOptions, RenderBucket};

/// Payload format selection for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
enum CliFormat {
    /// Compact binary payloads.
    #[default]
    Bincode,
    /// Human-readable payloads (requires the `serialize-ron` feature).
    Ron,
}

impl CliFormat {
    /// The payload format, if compiled in.
    fn format(self) -> Option<Format> {
        match self {
            Self::Bincode => Some(Format::Bincode),
            #[cfg(feature = "serialize-ron")]
            Self::Ron => Some(Format::Ron),
            #[cfg(not(feature = "serialize-ron"))]
            Self::Ron => None,
        }
    }
}

/// Build and hydrate the buckets of one synthetic tile.
#[derive(Parser, Debug)]
#[command(name = "tile_pipeline", about = "Build and hydrate buckets for a synthetic tile")]
struct Args {
    /// Zoom level the tile is built at.
    #[arg(long, default_value = "14")]
    zoom: f32,

    /// Features generated per layer.
    #[arg(long, default_value = "2000")]
    features: usize,

    /// Payload format.
    #[arg(long, default_value = "bincode", value_enum)]
    format: CliFormat,

    /// Layer types to build, comma separated.
    #[arg(long, value_delimiter = ',', default_value = "fill,line,circle,symbol")]
    kinds: Vec<String>,
}

/// An encoded bucket on its way to the rendering side.
struct Message {
    layer_id: String,
    bytes: Vec<u8>,
}

fn produce(args: &Args, format: Format, tx: Sender<Message>) {
    for (index, name) in args.kinds.iter().enumerate() {
        let kind = LayerKind::parse(name);
        let layer = demo_layer(kind.clone());
        let options = BucketOptions::new(layer)
            .with_zoom(args.zoom)
            .with_index(index);

        let mut bucket = match Bucket::create(options) {
            Ok(bucket) => bucket,
            Err(BucketError::UnsupportedLayerType(kind)) => {
                log::warn!("Skipping layer type '{}': no bucket for it", kind);
                continue;
            }
            Err(e) => {
                log::error!("Failed to create bucket for '{}': {}", name, e);
                continue;
            }
        };

        let start = Instant::now();
        let features = visible_features(&bucket, synthetic_features(&kind, args.features));
        log::debug!(
            "'{}': {} of {} features pass the filter",
            bucket.id(),
            features.len(),
            args.features
        );
        bucket.set_features(features);
        if let Err(e) = bucket.populate_buffers() {
            log::error!("Failed to populate '{}': {}", bucket.id(), e);
            continue;
        }
        let layer_id = bucket.id().to_string();
        let payload = bucket.into_serialized();

        match encode(&payload, format) {
            Ok(bytes) => {
                log::info!(
                    "Built '{}': {} vertices, {} bytes of {} in {:.2?}",
                    layer_id,
                    payload.vertex_count(),
                    bytes.len(),
                    format.name(),
                    start.elapsed()
                );
                if tx.send(Message { layer_id, bytes }).is_err() {
                    return;
                }
            }
            Err(e) => log::error!("Failed to encode '{}': {}", layer_id, e),
        }
    }
}

fn consume(rx: Receiver<Message>, format: Format, device: &GraphicsDevice) -> usize {
    let mut hydrated = 0;
    for message in rx {
        let payload = match decode(&message.bytes, format) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Failed to decode '{}': {}", message.layer_id, e);
                continue;
            }
        };

        let mut render = match RenderBucket::hydrate(HydrateOptions::new(), payload) {
            Ok(render) => render,
            Err(e) => {
                log::error!("Failed to hydrate '{}': {}", message.layer_id, e);
                continue;
            }
        };

        match render.bind_all(device) {
            Ok(bound) => {
                for program in render.programs() {
                    let groups = render.element_groups(program).unwrap_or_default();
                    log::debug!("  {}: {} groups", program, groups.len());
                }
                log::info!(
                    "Hydrated '{}': {} buffers bound, {} bytes live on device",
                    render.id(),
                    bound,
                    device.live_buffer_bytes()
                );
                hydrated += 1;
            }
            Err(e) => log::error!("Failed to bind '{}': {}", render.id(), e),
        }
        render.destroy(device);
    }
    hydrated
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    tilepack_core::init();
    tilepack_graphics::init();

    let args = Args::parse();
    let Some(format) = args.format.format() else {
        log::error!("RON payloads need the `serialize-ron` feature");
        std::process::exit(2);
    };
    let device = GraphicsDevice::new();
    log::info!(
        "Building {} layer(s) at zoom {} on the {} backend",
        args.kinds.len(),
        args.zoom,
        device.backend_name()
    );

    let (tx, rx) = crossbeam_channel::bounded(2);
    let hydrated = thread::scope(|scope| {
        scope.spawn(|| produce(&args, format, tx));
        consume(rx, format, &device)
    });

    debug_assert_eq!(device.live_buffer_count(), 0);
    log::info!("Done: {} bucket(s) hydrated", hydrated);
}
