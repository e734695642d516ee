//! Tile dimensions and the per-cell decision table.
//!
//! The three policy flags are independent axes:
//!
//! | Flag                 | Effect                                              |
//! |----------------------|-----------------------------------------------------|
//! | `trim_to_parent`     | clip partially covered cells to the boundary        |
//! | `symmetric`          | centre leftover space instead of anchoring top-left |
//! | `filter_by_centroid` | drop untrimmed partial cells whose centre is outside|
//!
//! Every cell is classified once into a [`CellRelation`], and the policy maps
//! that relation to a [`CellFate`].

use super::error::TilerError;

/// How a grid cell relates to the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellRelation {
    /// The cell does not touch the boundary.
    Disjoint,
    /// The boundary fully covers the cell.
    Covered,
    /// The cell straddles the boundary edge.
    Partial,
}

/// What to do with a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFate {
    /// Drop the cell.
    Discard,
    /// Keep the rectangular cell unchanged.
    Keep,
    /// Keep `cell ∩ boundary`.
    Trim,
    /// Keep the rectangular cell only if its centre lies inside the boundary.
    KeepIfCentroidInside,
}

/// Policy flags controlling how cells are kept, trimmed or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilingPolicy {
    /// Clip partially covered cells to the boundary.
    pub trim_to_parent: bool,
    /// Centre the grid on the boundary envelope.
    pub symmetric: bool,
    /// Require untrimmed partial cells to have their centre inside the boundary.
    pub filter_by_centroid: bool,
}

impl Default for TilingPolicy {
    /// The policy used when tiling regions for inference: whole rectangular
    /// tiles, symmetrically placed, allowed to extend past the boundary.
    fn default() -> Self {
        Self {
            trim_to_parent: false,
            symmetric: true,
            filter_by_centroid: false,
        }
    }
}

impl TilingPolicy {
    /// All flags off: corner-anchored, untrimmed, unfiltered.
    pub const PLAIN: TilingPolicy = TilingPolicy {
        trim_to_parent: false,
        symmetric: false,
        filter_by_centroid: false,
    };

    /// Maps a cell relation to its fate under this policy.
    pub fn fate(&self, relation: CellRelation) -> CellFate {
        match (relation, self.trim_to_parent, self.filter_by_centroid) {
            (CellRelation::Disjoint, _, _) => CellFate::Discard,
            (CellRelation::Covered, _, _) => CellFate::Keep,
            (CellRelation::Partial, true, _) => CellFate::Trim,
            (CellRelation::Partial, false, false) => CellFate::Keep,
            (CellRelation::Partial, false, true) => CellFate::KeepIfCentroidInside,
        }
    }

    /// Returns the grid origin shift along one axis.
    ///
    /// With centroid filtering the grid moves inward by half the leftover
    /// space; otherwise it moves outward so the overhang is split evenly
    /// between both sides. Zero when not symmetric or when the extent is an
    /// exact multiple of the tile size.
    pub fn origin_offset(&self, tile_dim: u32, extent: f64) -> f64 {
        if !self.symmetric {
            return 0.0;
        }
        let tile_dim = tile_dim as f64;
        let remainder = extent % tile_dim;
        if remainder == 0.0 {
            return 0.0;
        }
        if self.filter_by_centroid {
            remainder / 2.0
        } else {
            -(tile_dim - remainder) / 2.0
        }
    }
}

/// Tile dimensions plus tiling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSpec {
    tile_width: u32,
    tile_height: u32,
    policy: TilingPolicy,
}

impl TileSpec {
    /// Creates a tile spec, rejecting zero dimensions.
    pub fn new(tile_width: u32, tile_height: u32, policy: TilingPolicy) -> Result<Self, TilerError> {
        if tile_width == 0 || tile_height == 0 {
            return Err(TilerError::InvalidTileSize {
                width: tile_width,
                height: tile_height,
            });
        }
        Ok(Self {
            tile_width,
            tile_height,
            policy,
        })
    }

    /// Tile width in pixels.
    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    /// Tile height in pixels.
    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// The tiling policy.
    pub fn policy(&self) -> TilingPolicy {
        self.policy
    }
}
