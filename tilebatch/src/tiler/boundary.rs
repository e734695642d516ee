//! The region being tiled.
//!
//! A [`Boundary`] is an immutable, possibly multi-part and possibly
//! non-convex planar polygon in full-resolution image pixel coordinates.

use geo::{Area, BoundingRect, Coord, LineString, MultiPolygon, Polygon, Rect};

use super::error::TilerError;

/// Minimum number of coordinates for a ring to enclose an area.
const MIN_RING_COORDS: usize = 3;

/// Immutable polygonal region to tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    shape: MultiPolygon<f64>,
}

impl Boundary {
    /// Creates a boundary from a multi-polygon.
    pub fn new(shape: MultiPolygon<f64>) -> Self {
        Self { shape }
    }

    /// Creates an empty boundary. Tiling it yields no tiles.
    pub fn empty() -> Self {
        Self {
            shape: MultiPolygon::new(Vec::new()),
        }
    }

    /// Creates an axis-aligned rectangular boundary.
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        let rect = Rect::new(
            Coord { x, y },
            Coord {
                x: x + width,
                y: y + height,
            },
        );
        Self::from(rect)
    }

    /// Builds a boundary from raw polygon rings.
    ///
    /// Each entry is one polygon: its first ring is the exterior, any further
    /// rings are holes. Rings are closed automatically.
    pub fn from_rings(polygons: Vec<Vec<Vec<[f64; 2]>>>) -> Result<Self, TilerError> {
        let mut parts = Vec::with_capacity(polygons.len());

        for (index, rings) in polygons.into_iter().enumerate() {
            let mut rings = rings.into_iter();
            let exterior = rings.next().ok_or_else(|| {
                TilerError::InvalidBoundary(format!("polygon {} has no exterior ring", index))
            })?;
            let exterior = ring(exterior, index)?;
            let holes = rings
                .map(|hole| ring(hole, index))
                .collect::<Result<Vec<_>, _>>()?;
            parts.push(Polygon::new(exterior, holes));
        }

        Ok(Self::new(MultiPolygon::new(parts)))
    }

    /// Returns the underlying geometry.
    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    /// Returns the axis-aligned envelope, or `None` for an empty boundary.
    pub fn envelope(&self) -> Option<Rect<f64>> {
        self.shape.bounding_rect()
    }

    /// Returns the enclosed area in square pixels.
    pub fn area(&self) -> f64 {
        self.shape.unsigned_area()
    }

    /// Returns true if the boundary has no polygons.
    pub fn is_empty(&self) -> bool {
        self.shape.0.is_empty()
    }

    /// Splits the boundary into one region per polygon, in declared order.
    pub fn regions(&self) -> Vec<Boundary> {
        self.shape.0.iter().cloned().map(Boundary::from).collect()
    }
}

fn ring(coords: Vec<[f64; 2]>, polygon: usize) -> Result<LineString<f64>, TilerError> {
    if coords.len() < MIN_RING_COORDS {
        return Err(TilerError::InvalidBoundary(format!(
            "polygon {} has a ring with {} coordinates (need at least {})",
            polygon,
            coords.len(),
            MIN_RING_COORDS
        )));
    }
    if coords.iter().flatten().any(|v| !v.is_finite()) {
        return Err(TilerError::InvalidBoundary(format!(
            "polygon {} has a non-finite coordinate",
            polygon
        )));
    }
    Ok(LineString::from(coords))
}

impl From<MultiPolygon<f64>> for Boundary {
    fn from(shape: MultiPolygon<f64>) -> Self {
        Self::new(shape)
    }
}

impl From<Polygon<f64>> for Boundary {
    fn from(polygon: Polygon<f64>) -> Self {
        Self::new(MultiPolygon::new(vec![polygon]))
    }
}

impl From<Rect<f64>> for Boundary {
    fn from(rect: Rect<f64>) -> Self {
        Self::from(rect.to_polygon())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regions_split_parts() {
        let boundary = Boundary::from_rings(vec![
            vec![vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]],
            vec![vec![[50.0, 0.0], [70.0, 0.0], [70.0, 5.0], [50.0, 5.0]]],
        ])
        .unwrap();

        let regions = boundary.regions();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].area(), 100.0);
        assert_eq!(regions[1].envelope().unwrap().min().x, 50.0);
        assert!(Boundary::empty().regions().is_empty());
    }

    #[test]
    fn test_rectangle_envelope_and_area() {
        let boundary = Boundary::rectangle(10.0, 20.0, 100.0, 50.0);
        let envelope = boundary.envelope().unwrap();

        assert_eq!(envelope.min(), Coord { x: 10.0, y: 20.0 });
        assert_eq!(envelope.max(), Coord { x: 110.0, y: 70.0 });
        assert_eq!(boundary.area(), 5000.0);
    }

    #[test]
    fn test_empty_boundary_has_no_envelope() {
        let boundary = Boundary::empty();
        assert!(boundary.is_empty());
        assert!(boundary.envelope().is_none());
    }

    #[test]
    fn test_from_rings_with_hole() {
        let boundary = Boundary::from_rings(vec![vec![
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
            vec![[2.0, 2.0], [4.0, 2.0], [4.0, 4.0], [2.0, 4.0]],
        ]])
        .unwrap();

        assert_eq!(boundary.area(), 96.0);
    }

    #[test]
    fn test_from_rings_multi_part() {
        let boundary = Boundary::from_rings(vec![
            vec![vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]]],
            vec![vec![[20.0, 0.0], [30.0, 0.0], [30.0, 10.0], [20.0, 10.0]]],
        ])
        .unwrap();

        assert_eq!(boundary.shape().0.len(), 2);
        assert_eq!(boundary.area(), 150.0);
    }

    #[test]
    fn test_from_rings_rejects_degenerate_ring() {
        let result = Boundary::from_rings(vec![vec![vec![[0.0, 0.0], [1.0, 1.0]]]]);
        assert!(matches!(result, Err(TilerError::InvalidBoundary(_))));
    }

    #[test]
    fn test_from_rings_rejects_missing_exterior() {
        let result = Boundary::from_rings(vec![vec![]]);
        assert!(matches!(result, Err(TilerError::InvalidBoundary(_))));
    }

    #[test]
    fn test_from_rings_rejects_nan() {
        let result =
            Boundary::from_rings(vec![vec![vec![[0.0, 0.0], [f64::NAN, 0.0], [1.0, 1.0]]]]);
        assert!(matches!(result, Err(TilerError::InvalidBoundary(_))));
    }
}
