//! Tiler output polygons.

use geo::{Area, BoundingRect, Centroid, Coord, MultiPolygon, Rect};

/// One tile produced by the tiler.
///
/// Either the untouched rectangular grid cell, or the part of that cell that
/// lies inside the boundary when trimming applied.
#[derive(Debug, Clone, PartialEq)]
pub enum TilePolygon {
    /// The rectangular grid cell.
    Cell(Rect<f64>),
    /// The grid cell clipped to the boundary.
    Trimmed(MultiPolygon<f64>),
}

impl TilePolygon {
    /// Returns the centroid in full-resolution image coordinates.
    pub fn centroid(&self) -> Coord<f64> {
        match self {
            TilePolygon::Cell(rect) => rect.center(),
            TilePolygon::Trimmed(shape) => shape
                .centroid()
                .map(|p| p.0)
                .or_else(|| shape.bounding_rect().map(|r| r.center()))
                .unwrap_or(Coord { x: 0.0, y: 0.0 }),
        }
    }

    /// Returns the axis-aligned envelope.
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            TilePolygon::Cell(rect) => Some(*rect),
            TilePolygon::Trimmed(shape) => shape.bounding_rect(),
        }
    }

    /// Returns the tile area in square pixels.
    pub fn area(&self) -> f64 {
        match self {
            TilePolygon::Cell(rect) => rect.unsigned_area(),
            TilePolygon::Trimmed(shape) => shape.unsigned_area(),
        }
    }

    /// Returns true if this tile was clipped to the boundary.
    pub fn is_trimmed(&self) -> bool {
        matches!(self, TilePolygon::Trimmed(_))
    }

    /// Converts the tile into a multi-polygon.
    pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
        match self {
            TilePolygon::Cell(rect) => MultiPolygon::new(vec![rect.to_polygon()]),
            TilePolygon::Trimmed(shape) => shape.clone(),
        }
    }
}
