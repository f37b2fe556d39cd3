use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::PhysicsConfig;
use crate::geometry::Vec2;
use crate::level::{Level, LevelLayer};
use crate::tile::TileId;

use super::error::{read_error, ContentError, ContentErrorCode};
use super::tileset::Tileset;

/// Separates the layers of a level file.
pub const LAYER_SEPARATOR: char = '\\';

pub fn load_level(
    path: &Path,
    tileset: &Tileset,
    config: &PhysicsConfig,
) -> Result<Level, ContentError> {
    let raw = fs::read_to_string(path).map_err(|source| read_error(path, source))?;
    let level = parse_level(&raw, path, tileset, config)?;
    debug!(
        path = %path.display(),
        level = %level.name(),
        layers = level.layers().len(),
        tiles = level.tile_count(),
        "level_loaded"
    );
    Ok(level)
}

/// Parses a level file: the first line is the level name, every other line
/// is a CSV row of tileset ids. `-1` leaves a cell empty.
pub fn parse_level(
    raw: &str,
    file_path: &Path,
    tileset: &Tileset,
    config: &PhysicsConfig,
) -> Result<Level, ContentError> {
    let mut lines = raw.lines();
    let name = lines.next().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(ContentError::new(
            ContentErrorCode::EmptyLevel,
            "level file must start with the level name".to_string(),
            file_path,
        )
        .at(1, 1));
    }

    let mut grid = GridBuilder {
        file_path,
        tileset,
        cell: config.cell_size(),
        scale: config.scale(),
        level: Level::new(name),
        layer: LevelLayer::new(),
        row: 0,
        spawn: None,
    };

    for (idx, line) in lines.enumerate() {
        let line_no = idx + 2;
        let mut column = 1;
        for (segment_idx, segment) in line.split(LAYER_SEPARATOR).enumerate() {
            if segment_idx > 0 {
                grid.finish_layer();
                column += 1;
            }
            grid.parse_row(segment, line_no, column)?;
            column += segment.len();
        }
    }

    Ok(grid.finish())
}

struct GridBuilder<'a> {
    file_path: &'a Path,
    tileset: &'a Tileset,
    cell: f32,
    scale: f32,
    level: Level,
    layer: LevelLayer,
    row: usize,
    spawn: Option<Vec2>,
}

impl GridBuilder<'_> {
    /// `column` is the 1-based column of `segment` within its line.
    fn parse_row(&mut self, segment: &str, line: usize, column: usize) -> Result<(), ContentError> {
        if segment.trim().is_empty() {
            return Ok(());
        }

        let mut offset = 0;
        for (col, field) in segment.split(',').enumerate() {
            let field_column = column + offset + (field.len() - field.trim_start().len());
            offset += field.len() + 1;

            let trimmed = field.trim();
            if trimmed.is_empty() {
                continue;
            }
            let id = trimmed.parse::<i32>().map(TileId).map_err(|_| {
                ContentError::new(
                    ContentErrorCode::InvalidValue,
                    format!("'{trimmed}' is not a tile id"),
                    self.file_path,
                )
                .at(line, field_column)
            })?;
            if id == TileId::NONE {
                continue;
            }

            let Some(entry) = self.tileset.get(id) else {
                return Err(ContentError::new(
                    ContentErrorCode::UnknownTileId,
                    format!("no tile with id {} in the tileset", id.0),
                    self.file_path,
                )
                .at(line, field_column));
            };

            let cell = Vec2::new(col as f32 * self.cell, self.row as f32 * self.cell);
            if entry.is_spawn() && self.spawn.is_none() {
                self.spawn = Some(cell);
            }
            self.layer.add_tile(entry.place(cell, self.scale));
        }

        self.row += 1;
        Ok(())
    }

    fn finish_layer(&mut self) {
        let layer = std::mem::take(&mut self.layer);
        self.level.add_layer(layer);
        self.row = 0;
    }

    fn finish(mut self) -> Level {
        // A trailing separator leaves nothing behind it.
        if !self.layer.is_empty() || self.level.layers().is_empty() {
            self.finish_layer();
        }
        let spawn = self.spawn.unwrap_or(Vec2::ZERO);
        self.level.with_spawn(spawn)
    }
}
