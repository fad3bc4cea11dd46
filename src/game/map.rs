//! Tile Map Geometry
//!
//! Static tile grid. Row 0 is the top row; tile (col, row) is centred at
//! world `(col * size, -row * size)`. Index 0 is empty, every other index
//! is solid. The map is built once at level load and only queried after.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::fixed::{Fixed, FIXED_HALF, FIXED_SCALE, fixed_div, fixed_mul};
use crate::core::vec2::FixedVec2;
use crate::game::collision::Aabb;
use crate::render::{ModelTransform, RenderSink, TextureHandle};

/// Distance below the feet probed by ground queries (1/256 unit).
const GROUND_PROBE: Fixed = 256;

/// Tiles below the bottom row before a falling body leaves play.
const FALL_MARGIN_TILES: i32 = 2;

/// Errors raised while building a map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// Width or height is zero.
    #[error("map dimensions must be non-zero (got {width}x{height})")]
    ZeroDimension {
        /// Columns.
        width: u32,
        /// Rows.
        height: u32,
    },

    /// Tile array length does not match the grid.
    #[error("tile data has {actual} entries, expected {expected}")]
    SizeMismatch {
        /// width * height.
        expected: usize,
        /// Entries supplied.
        actual: usize,
    },

    /// Tile size is zero or negative.
    #[error("tile size must be positive")]
    InvalidTileSize,
}

/// Static tile grid with a tileset atlas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMap {
    width: u32,
    height: u32,
    tiles: Vec<u32>,
    tile_size: Fixed,
    texture: TextureHandle,
    atlas_cols: u32,
    atlas_rows: u32,
}

impl TileMap {
    /// Build a map from a flat, row-major tile array.
    pub fn new(width: u32, height: u32, tiles: Vec<u32>, tile_size: Fixed) -> Result<Self, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::ZeroDimension { width, height });
        }
        let expected = width as usize * height as usize;
        if tiles.len() != expected {
            return Err(MapError::SizeMismatch { expected, actual: tiles.len() });
        }
        if tile_size <= 0 {
            return Err(MapError::InvalidTileSize);
        }

        Ok(Self {
            width,
            height,
            tiles,
            tile_size,
            texture: TextureHandle::default(),
            atlas_cols: 1,
            atlas_rows: 1,
        })
    }

    /// Attach the tileset atlas used for rendering.
    pub fn with_tileset(mut self, texture: TextureHandle, atlas_cols: u32, atlas_rows: u32) -> Self {
        self.texture = texture;
        self.atlas_cols = atlas_cols;
        self.atlas_rows = atlas_rows;
        self
    }

    /// Columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Atlas grid (columns, rows).
    pub fn atlas_size(&self) -> (u32, u32) {
        (self.atlas_cols, self.atlas_rows)
    }

    /// Tile index at a grid cell. Out of bounds is `None`.
    pub fn tile(&self, col: i32, row: i32) -> Option<u32> {
        if col < 0 || row < 0 || col >= self.width as i32 || row >= self.height as i32 {
            return None;
        }
        self.tiles.get(row as usize * self.width as usize + col as usize).copied()
    }

    /// Grid cell containing a world position, or `None` outside the grid.
    pub fn cell_at(&self, position: FixedVec2) -> Option<(u32, u32)> {
        let half = fixed_mul(self.tile_size, FIXED_HALF);
        let col = fixed_div(position.x.wrapping_add(half), self.tile_size) >> FIXED_SCALE;
        let row = fixed_div(half.wrapping_sub(position.y), self.tile_size) >> FIXED_SCALE;

        if col < 0 || row < 0 || col >= self.width as i32 || row >= self.height as i32 {
            return None;
        }
        Some((col as u32, row as u32))
    }

    /// Tile index at a world position. Out of bounds is `None`.
    pub fn tile_at(&self, position: FixedVec2) -> Option<u32> {
        let (col, row) = self.cell_at(position)?;
        self.tile(col as i32, row as i32)
    }

    /// Whether a world position lies inside a solid tile.
    pub fn is_solid_at(&self, position: FixedVec2) -> bool {
        self.tile_at(position).is_some_and(|t| t != 0)
    }

    /// World-space centre of a grid cell.
    pub fn cell_center(&self, col: u32, row: u32) -> FixedVec2 {
        FixedVec2::new(
            self.tile_size.wrapping_mul(col as i32),
            self.tile_size.wrapping_mul(row as i32).wrapping_neg(),
        )
    }

    /// Bounding box of a grid cell.
    pub fn cell_aabb(&self, col: u32, row: u32) -> Aabb {
        let half = fixed_mul(self.tile_size, FIXED_HALF);
        Aabb::new(self.cell_center(col, row), FixedVec2::new(half, half))
    }

    /// Bounding boxes of every solid tile, row-major.
    pub fn solid_tiles(&self) -> impl Iterator<Item = Aabb> + '_ {
        let width = self.width;
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| **tile != 0)
            .map(move |(i, _)| {
                let col = i as u32 % width;
                let row = i as u32 / width;
                self.cell_aabb(col, row)
            })
    }

    /// Height below which a body has fallen out of the level.
    ///
    /// Two tiles under the bottom edge of the last row.
    pub fn fall_limit(&self) -> Fixed {
        let half = fixed_mul(self.tile_size, FIXED_HALF);
        let bottom_centre = self.cell_center(0, self.height - 1).y;
        bottom_centre - half - self.tile_size * FALL_MARGIN_TILES
    }

    /// Whether there is solid ground directly under a box's feet.
    ///
    /// Probes just below the bottom edge at both corners and the centre.
    pub fn is_ground_below(&self, position: FixedVec2, half_extents: FixedVec2) -> bool {
        let y = position.y - half_extents.y - GROUND_PROBE;
        let inset = half_extents.x - 1;
        [position.x - inset, position.x, position.x + inset]
            .into_iter()
            .any(|x| self.is_solid_at(FixedVec2::new(x, y)))
    }

    /// Draw every solid tile.
    pub fn render(&self, sink: &mut dyn RenderSink) {
        let size = FixedVec2::new(self.tile_size, self.tile_size);
        for (i, tile) in self.tiles.iter().enumerate() {
            if *tile == 0 {
                continue;
            }
            let col = i as u32 % self.width;
            let row = i as u32 / self.width;
            let transform = ModelTransform {
                translation: self.cell_center(col, row),
                scale: size,
            };
            sink.draw_tile(self.texture, *tile, &transform);
        }
    }
}
