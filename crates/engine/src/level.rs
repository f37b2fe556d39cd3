use std::collections::BTreeMap;

use thiserror::Error;

use crate::character::Character;
use crate::geometry::{Rect, Vec2};
use crate::tile::{Tile, TileId};

/// Tiles sharing one z-order. Layer order only matters for drawing; collision
/// queries treat every layer the same.
#[derive(Debug, Clone, Default)]
pub struct LevelLayer {
    tiles: Vec<Tile>,
}

impl LevelLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        Self { tiles }
    }

    pub fn add_tile(&mut self, tile: Tile) {
        self.tiles.push(tile);
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn solid_tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.iter().filter(|tile| tile.is_solid())
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Level {
    name: String,
    layers: Vec<LevelLayer>,
    spawn: Vec2,
}

impl Level {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layers: Vec::new(),
            spawn: Vec2::ZERO,
        }
    }

    pub fn with_spawn(mut self, spawn: Vec2) -> Self {
        self.spawn = spawn;
        self
    }

    pub fn add_layer(&mut self, layer: LevelLayer) {
        self.layers.push(layer);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layers(&self) -> &[LevelLayer] {
        &self.layers
    }

    pub fn spawn(&self) -> Vec2 {
        self.spawn
    }

    pub fn set_spawn(&mut self, spawn: Vec2) {
        self.spawn = spawn;
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.layers.iter().flat_map(|layer| layer.tiles().iter())
    }

    pub fn tile_count(&self) -> usize {
        self.layers.iter().map(LevelLayer::len).sum()
    }

    /// Whether `hitbox` overlaps any tile in any layer placed from tileset id
    /// `target`, solid or not.
    pub fn overlaps_tile(&self, target: TileId, hitbox: &Rect) -> bool {
        self.tiles()
            .filter(|tile| tile.texture_id() == target)
            .any(|tile| tile.hitbox().intersects(hitbox))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelSetError {
    #[error("level set must contain at least one level")]
    Empty,
    #[error("names of levels should be unique, but '{name}' appeared more than once")]
    DuplicateName { name: String },
    #[error("level '{name}' not found")]
    UnknownLevel { name: String },
}

/// All loaded levels keyed by name, plus the name of the level currently in
/// play. Iteration is ordered by name.
#[derive(Debug, Clone)]
pub struct LevelSet {
    levels: BTreeMap<String, Level>,
    current: String,
}

impl LevelSet {
    /// Builds the set and makes `start` current, or the first level by name
    /// when `start` is `None`.
    pub fn new(levels: Vec<Level>, start: Option<&str>) -> Result<Self, LevelSetError> {
        let mut by_name = BTreeMap::new();
        for level in levels {
            let name = level.name().to_string();
            if by_name.insert(name.clone(), level).is_some() {
                return Err(LevelSetError::DuplicateName { name });
            }
        }

        let current = match start {
            Some(name) if by_name.contains_key(name) => name.to_string(),
            Some(name) => {
                return Err(LevelSetError::UnknownLevel {
                    name: name.to_string(),
                })
            }
            None => by_name
                .keys()
                .next()
                .cloned()
                .ok_or(LevelSetError::Empty)?,
        };

        Ok(Self {
            levels: by_name,
            current,
        })
    }

    pub fn current(&self) -> &Level {
        &self.levels[&self.current]
    }

    pub fn current_name(&self) -> &str {
        &self.current
    }

    pub fn get(&self, name: &str) -> Option<&Level> {
        self.levels.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.levels.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.levels.keys().map(String::as_str)
    }

    pub fn levels(&self) -> impl Iterator<Item = &Level> + '_ {
        self.levels.values()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Makes `name` the current level and moves the character's hitbox to its
    /// spawn point. Velocity and collision state are left untouched.
    pub fn select(&mut self, name: &str, character: &mut Character) -> Result<(), LevelSetError> {
        let Some(level) = self.levels.get(name) else {
            return Err(LevelSetError::UnknownLevel {
                name: name.to_string(),
            });
        };
        character.set_position(level.spawn());
        self.current = name.to_string();
        Ok(())
    }
}
