use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Vec2};
use crate::tile_callback::BoundTileCallback;

/// Tileset id of a tile. Doubles as the texture id: every placed copy of the
/// same tileset entry shares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub i32);

impl TileId {
    pub const NONE: TileId = TileId(-1);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub i32);

/// A placed unit of world geometry. Immutable once its level finished loading.
#[derive(Debug, Clone)]
pub struct Tile {
    hitbox: Rect,
    hitbox_offset: Vec2,
    solid: bool,
    texture_id: TileId,
    class_id: ClassId,
    callback: BoundTileCallback,
}

impl Tile {
    pub fn new(hitbox: Rect, texture_id: TileId) -> Self {
        Self {
            hitbox,
            hitbox_offset: Vec2::ZERO,
            solid: false,
            texture_id,
            class_id: ClassId::default(),
            callback: BoundTileCallback::none(),
        }
    }

    pub fn solid(mut self, solid: bool) -> Self {
        self.solid = solid;
        self
    }

    pub fn with_class(mut self, class_id: ClassId) -> Self {
        self.class_id = class_id;
        self
    }

    pub fn with_callback(mut self, callback: BoundTileCallback) -> Self {
        self.callback = callback;
        self
    }

    /// Offset of the hitbox from the cell the tile is drawn in.
    pub fn with_hitbox_offset(mut self, offset: Vec2) -> Self {
        self.hitbox_offset = offset;
        self
    }

    pub fn hitbox(&self) -> &Rect {
        &self.hitbox
    }

    pub fn hitbox_offset(&self) -> Vec2 {
        self.hitbox_offset
    }

    /// Top-left of the cell the texture is drawn into.
    pub fn draw_position(&self) -> Vec2 {
        Vec2 {
            x: self.hitbox.x - self.hitbox_offset.x,
            y: self.hitbox.y - self.hitbox_offset.y,
        }
    }

    pub fn is_solid(&self) -> bool {
        self.solid
    }

    pub fn texture_id(&self) -> TileId {
        self.texture_id
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn callback(&self) -> &BoundTileCallback {
        &self.callback
    }
}
