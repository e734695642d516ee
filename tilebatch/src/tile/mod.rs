//! Tile descriptors and their classification results.
//!
//! A [`TileDescriptor`] identifies one tile to process: its centroid in
//! full-resolution image coordinates plus a slot that receives the
//! [`ClassificationResult`]. Descriptors are shared as `Arc<TileDescriptor>`
//! between the caller, the loader workers and the inference consumer; the
//! consumer is the only writer and the slot can be filled exactly once.

mod classification;
mod error;

pub use classification::ClassificationResult;
pub use error::TileError;

use std::fmt;
use std::sync::{Arc, OnceLock};

use geo::{Coord, Rect};

use crate::tiler::TilePolygon;

/// Identifier of a tile within one inference run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub usize);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One tile to be classified.
#[derive(Debug)]
pub struct TileDescriptor {
    id: TileId,
    region: usize,
    name: String,
    centroid: Coord<f64>,
    bounds: Option<Rect<f64>>,
    classification: OnceLock<ClassificationResult>,
}

impl TileDescriptor {
    /// Creates a descriptor centred on `centroid`.
    pub fn new(id: TileId, centroid: Coord<f64>) -> Self {
        Self {
            id,
            region: 0,
            name: format!("Tile {}", id.0),
            centroid,
            bounds: None,
            classification: OnceLock::new(),
        }
    }

    /// Creates a descriptor from a tiler output polygon.
    pub fn from_polygon(id: TileId, polygon: &TilePolygon) -> Self {
        Self {
            bounds: polygon.bounding_rect(),
            ..Self::new(id, polygon.centroid())
        }
    }

    /// Creates the `index`-th tile of `region`, named `"Tile {index}"`.
    pub fn in_region(id: TileId, region: usize, index: usize, polygon: &TilePolygon) -> Self {
        Self {
            region,
            name: format!("Tile {}", index),
            ..Self::from_polygon(id, polygon)
        }
    }

    /// Tile identifier, unique within a run.
    pub fn id(&self) -> TileId {
        self.id
    }

    /// Index of the region the tile was cut from.
    pub fn region(&self) -> usize {
        self.region
    }

    /// Display name; numbering restarts in each region.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Centroid in full-resolution image coordinates.
    pub fn centroid(&self) -> Coord<f64> {
        self.centroid
    }

    /// Envelope of the source polygon, if known.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.bounds
    }

    /// Returns the attached classification, if any.
    pub fn classification(&self) -> Option<&ClassificationResult> {
        self.classification.get()
    }

    /// Returns the top class of the attached classification.
    pub fn class_label(&self) -> Option<&str> {
        self.classification().and_then(|c| c.top_class())
    }

    /// Attaches a classification result.
    ///
    /// Fails if a result was already attached.
    pub fn attach_classification(&self, result: ClassificationResult) -> Result<(), TileError> {
        self.classification
            .set(result)
            .map_err(|_| TileError::AlreadyClassified(self.id))
    }
}

/// Builds descriptors for tiler output, numbering tiles in output order.
pub fn descriptors_from_polygons<I>(polygons: I) -> Vec<Arc<TileDescriptor>>
where
    I: IntoIterator<Item = TilePolygon>,
{
    polygons
        .into_iter()
        .enumerate()
        .map(|(i, polygon)| Arc::new(TileDescriptor::from_polygon(TileId(i), &polygon)))
        .collect()
}

/// Builds descriptors for per-region tiler output.
///
/// Ids run across all regions; names restart at `Tile 0` in each region.
pub fn descriptors_from_regions<I, R>(regions: I) -> Vec<Arc<TileDescriptor>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = TilePolygon>,
{
    let mut descriptors = Vec::new();
    for (region, polygons) in regions.into_iter().enumerate() {
        for (index, polygon) in polygons.into_iter().enumerate() {
            let id = TileId(descriptors.len());
            descriptors.push(Arc::new(TileDescriptor::in_region(id, region, index, &polygon)));
        }
    }
    descriptors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(x: f64, y: f64, size: f64) -> TilePolygon {
        TilePolygon::Cell(Rect::new(
            Coord { x, y },
            Coord {
                x: x + size,
                y: y + size,
            },
        ))
    }

    #[test]
    fn test_from_polygon() {
        let descriptor = TileDescriptor::from_polygon(TileId(3), &cell(0.0, 0.0, 10.0));
        assert_eq!(descriptor.id(), TileId(3));
        assert_eq!(descriptor.name(), "Tile 3");
        assert_eq!(descriptor.centroid(), Coord { x: 5.0, y: 5.0 });
        assert!(descriptor.bounds().is_some());
        assert!(descriptor.classification().is_none());
    }

    #[test]
    fn test_attach_once() {
        let descriptor = TileDescriptor::new(TileId(0), Coord { x: 1.0, y: 1.0 });
        let result = ClassificationResult::new([("a", 0.9), ("b", 0.1)]).unwrap();

        descriptor.attach_classification(result.clone()).unwrap();
        assert_eq!(descriptor.class_label(), Some("a"));

        let second = descriptor.attach_classification(result);
        assert_eq!(second, Err(TileError::AlreadyClassified(TileId(0))));
    }

    #[test]
    fn test_descriptors_numbered_in_order() {
        let descriptors =
            descriptors_from_polygons(vec![cell(0.0, 0.0, 10.0), cell(10.0, 0.0, 10.0)]);
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].id(), TileId(0));
        assert_eq!(descriptors[1].id(), TileId(1));
        assert_eq!(descriptors[1].centroid(), Coord { x: 15.0, y: 5.0 });
    }

    #[test]
    fn test_region_names_restart() {
        let descriptors = descriptors_from_regions(vec![
            vec![cell(0.0, 0.0, 10.0), cell(10.0, 0.0, 10.0)],
            vec![],
            vec![cell(100.0, 0.0, 10.0)],
        ]);

        let summary: Vec<(usize, usize, &str)> = descriptors
            .iter()
            .map(|d| (d.id().0, d.region(), d.name()))
            .collect();
        assert_eq!(
            summary,
            vec![(0, 0, "Tile 0"), (1, 0, "Tile 1"), (2, 2, "Tile 0")]
        );
    }

    #[test]
    fn test_descriptor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TileDescriptor>();
    }
}
