//! Geometric tiler.
//!
//! Splits a [`Boundary`] into a grid of fixed-size tiles, clipping the grid
//! against the boundary according to a [`TilingPolicy`].
//!
//! # Algorithm
//!
//! ```text
//! envelope ──► symmetric origin shift ──► grid cells (row-major)
//!                                              │
//!                          prepared boundary ──┤ relate once per cell
//!                                              ▼
//!               Disjoint ─► discard   Covered ─► keep   Partial ─► policy
//! ```
//!
//! The boundary is prepared once (indexed for repeated relate queries) and
//! every candidate cell is evaluated against it a single time.
//!
//! Trimmed tiles are contained in the boundary up to floating-point
//! precision. Along axis-aligned edges clipping is exact, but where a cell
//! crosses a slanted edge the intersection vertices may land a few ULPs
//! outside, so an exact `covers` test can fail even though the area left
//! outside the boundary is zero.
//!
//! # Example
//!
//! ```
//! use tilebatch::tiler::{Boundary, TileSpec, Tiler, TilingPolicy};
//!
//! let boundary = Boundary::rectangle(0.0, 0.0, 100.0, 50.0);
//! let spec = TileSpec::new(20, 25, TilingPolicy::PLAIN).unwrap();
//! let tiles = Tiler::new(spec).tile(&boundary);
//! assert_eq!(tiles.len(), 10);
//! ```

mod boundary;
mod error;
mod policy;
mod polygon;


pub use boundary::Boundary;
pub use error::TilerError;
pub use policy::{CellFate, CellRelation, TileSpec, TilingPolicy};
pub use polygon::TilePolygon;

use std::panic::{self, AssertUnwindSafe};

use geo::{
    Area, BooleanOps, Coord, MultiPolygon, Point, Polygon, PreparedGeometry, Rect, Relate,
};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Grid of candidate cells laid over a boundary envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGrid {
    /// X of the first column's left edge.
    pub origin_x: i64,
    /// Y of the first row's top edge.
    pub origin_y: i64,
    /// Number of columns scanned.
    pub columns: usize,
    /// Number of rows scanned.
    pub rows: usize,
    tile_width: u32,
    tile_height: u32,
}

impl TileGrid {
    /// Returns the rectangle for the cell at `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> Rect<f64> {
        let x = (self.origin_x + col as i64 * self.tile_width as i64) as f64;
        let y = (self.origin_y + row as i64 * self.tile_height as i64) as f64;
        Rect::new(
            Coord { x, y },
            Coord {
                x: x + self.tile_width as f64,
                y: y + self.tile_height as f64,
            },
        )
    }

    /// Total number of candidate cells.
    pub fn len(&self) -> usize {
        self.rows * self.columns
    }

    /// Returns true if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits boundaries into tiles.
#[derive(Debug, Clone, Copy)]
pub struct Tiler {
    spec: TileSpec,
}

impl Tiler {
    /// Creates a tiler for the given spec.
    pub fn new(spec: TileSpec) -> Self {
        Self { spec }
    }

    /// Returns the tile spec.
    pub fn spec(&self) -> &TileSpec {
        &self.spec
    }

    /// Computes the candidate grid for a boundary.
    ///
    /// Returns `None` for an empty boundary.
    pub fn grid(&self, boundary: &Boundary) -> Option<TileGrid> {
        let envelope = boundary.envelope()?;
        let policy = self.spec.policy();
        let (width, height) = (self.spec.tile_width(), self.spec.tile_height());

        let min = envelope.min();
        let max = envelope.max();

        let start_x = min.x + policy.origin_offset(width, envelope.width());
        let start_y = min.y + policy.origin_offset(height, envelope.height());
        let origin_x = start_x.floor() as i64;
        let origin_y = start_y.floor() as i64;

        Some(TileGrid {
            origin_x,
            origin_y,
            columns: steps_to_reach(origin_x, max.x, width),
            rows: steps_to_reach(origin_y, max.y, height),
            tile_width: width,
            tile_height: height,
        })
    }

    /// Tiles a boundary, returning tiles in row-major scan order.
    pub fn tile(&self, boundary: &Boundary) -> Vec<TilePolygon> {
        let Some(grid) = self.grid(boundary) else {
            return Vec::new();
        };

        let prepared = PreparedGeometry::from(boundary.shape());
        let mut tiles = Vec::new();

        for row in 0..grid.rows {
            for col in 0..grid.columns {
                if let Some(tile) = self.classify(&prepared, boundary, grid.cell(row, col)) {
                    tiles.push(tile);
                }
            }
        }

        debug!(
            candidates = grid.len(),
            kept = tiles.len(),
            tile_width = self.spec.tile_width(),
            tile_height = self.spec.tile_height(),
            "Tiled boundary"
        );

        tiles
    }

    /// Tiles each region separately.
    ///
    /// Every region gets its own envelope and symmetric offset, so grids of
    /// neighbouring regions need not line up. Output is one tile list per
    /// region, in input order.
    pub fn tile_regions(&self, regions: &[Boundary]) -> Vec<Vec<TilePolygon>> {
        regions.iter().map(|region| self.tile(region)).collect()
    }

    /// Tiles a boundary using the rayon thread pool.
    ///
    /// Rows are processed in parallel with one prepared boundary per worker
    /// thread. Output order is not guaranteed to match [`Tiler::tile`].
    pub fn tile_par(&self, boundary: &Boundary) -> Vec<TilePolygon> {
        let Some(grid) = self.grid(boundary) else {
            return Vec::new();
        };

        let tiles: Vec<TilePolygon> = (0..grid.rows)
            .into_par_iter()
            .map_init(
                || PreparedGeometry::from(boundary.shape()),
                |prepared, row| {
                    (0..grid.columns)
                        .filter_map(|col| self.classify(&*prepared, boundary, grid.cell(row, col)))
                        .collect::<Vec<_>>()
                },
            )
            .flatten()
            .collect();

        debug!(
            candidates = grid.len(),
            kept = tiles.len(),
            "Tiled boundary in parallel"
        );

        tiles
    }

    /// Decides the fate of a single cell.
    fn classify(
        &self,
        prepared: &impl Relate<f64>,
        boundary: &Boundary,
        cell: Rect<f64>,
    ) -> Option<TilePolygon> {
        let cell_polygon = cell.to_polygon();
        let matrix = prepared.relate(&cell_polygon);

        let relation = if !matrix.is_intersects() {
            CellRelation::Disjoint
        } else if matrix.is_covers() {
            CellRelation::Covered
        } else {
            CellRelation::Partial
        };

        match self.spec.policy().fate(relation) {
            CellFate::Discard => None,
            CellFate::Keep => Some(TilePolygon::Cell(cell)),
            CellFate::KeepIfCentroidInside => {
                let centre = Point::from(cell.center());
                prepared
                    .relate(&centre)
                    .is_contains()
                    .then_some(TilePolygon::Cell(cell))
            }
            CellFate::Trim => match trim(&cell_polygon, boundary.shape()) {
                Ok(clipped) if clipped.0.is_empty() => {
                    debug!(
                        x = cell.min().x,
                        y = cell.min().y,
                        "Cell only touches boundary, dropping"
                    );
                    None
                }
                Ok(clipped) => Some(TilePolygon::Trimmed(clipped)),
                Err(e) => {
                    warn!(
                        x = cell.min().x,
                        y = cell.min().y,
                        error = %e,
                        "Failed to trim tile, dropping"
                    );
                    None
                }
            },
        }
    }
}

/// Number of grid steps from `origin` needed to reach or pass `end`.
fn steps_to_reach(origin: i64, end: f64, step: u32) -> usize {
    let span = end - origin as f64;
    if span <= 0.0 {
        return 0;
    }
    (span / step as f64).ceil() as usize
}

/// Clips a cell to the boundary.
///
/// The overlay engine can panic on degenerate input; that is caught and
/// reported as a recoverable topology error for this cell only.
fn trim(
    cell: &Polygon<f64>,
    boundary: &MultiPolygon<f64>,
) -> Result<MultiPolygon<f64>, TilerError> {
    let mut clipped = panic::catch_unwind(AssertUnwindSafe(|| cell.intersection(boundary)))
        .map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown overlay failure".to_string());
            TilerError::Topology(message)
        })?;

    // Edge or corner contact can leave zero-area slivers behind.
    clipped.0.retain(|part| part.unsigned_area() > 0.0);
    Ok(clipped)
}
