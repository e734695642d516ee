//! TileBatch - Polygon tiling and batched tile inference
//!
//! This library splits an arbitrarily shaped image region into fixed-size
//! tiles and streams those tiles through a batched inference engine using a
//! concurrent load/predict pipeline.
//!
//! # High-Level Flow
//!
//! ```text
//! Boundary ──► Tiler ──► TileDescriptors ──► TileLoader (N workers)
//!                                                 │
//!                                     bounded batch queue (backpressure)
//!                                                 │
//!                                                 ▼
//!                              InferenceRunner ──► InferenceEngine
//!                                     │
//!                                     └──► ProgressListener
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilebatch::inference::InferenceRunner;
//! use tilebatch::loader::LoaderConfig;
//! use tilebatch::progress::TracingProgress;
//! use tilebatch::tile::descriptors_from_polygons;
//! use tilebatch::tiler::{Boundary, TileSpec, Tiler, TilingPolicy};
//! use tokio_util::sync::CancellationToken;
//!
//! let boundary = Boundary::rectangle(0.0, 0.0, 4096.0, 2048.0);
//! let spec = TileSpec::new(224, 224, TilingPolicy::default())?;
//! let tiles = descriptors_from_polygons(Tiler::new(spec).tile(&boundary));
//!
//! let config = LoaderConfig::builder().batch_size(8).tile_size(224, 224).build()?;
//! let mut runner = InferenceRunner::new(engine, Arc::new(TracingProgress));
//! let outcome = runner.run_blocking(tiles, source, &config, &CancellationToken::new())?;
//! println!("classified {} tiles", outcome.summary().processed);
//! ```

pub mod config;
pub mod inference;
pub mod loader;
pub mod logging;
pub mod model;
pub mod progress;
pub mod region;
pub mod tile;
pub mod tiler;

/// Version of the TileBatch library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
