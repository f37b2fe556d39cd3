use serde::Deserialize;

use crate::character::{Character, CollisionSides};
use crate::geometry::{Axis, Rect};
use crate::level::LevelLayer;
use crate::tile::Tile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Last overlapping tile in layer then tile order wins.
    #[default]
    LastCandidate,
    NearestBoundary,
}

pub fn collect_candidates<'a>(hitbox: &Rect, layers: &'a [LevelLayer]) -> Vec<&'a Tile> {
    layers
        .iter()
        .flat_map(LevelLayer::solid_tiles)
        .filter(|tile| tile.hitbox().intersects(hitbox))
        .collect()
}

/// Velocity on `axis` is zeroed on any overlap, even without movement.
pub fn move_and_resolve(
    character: &mut Character,
    axis: Axis,
    layers: &[LevelLayer],
    tie_break: TieBreak,
) {
    let before = character.hitbox.pos(axis);
    let mut step = axis.component(character.velocity);
    if axis == Axis::X {
        step += character.intent_step();
    }
    character.hitbox.set_pos(axis, before + step);
    let delta = character.hitbox.pos(axis) - before;

    let (negative_side, positive_side) = CollisionSides::for_axis(axis);
    character.collision_sides.remove(negative_side | positive_side);

    let candidates = collect_candidates(&character.hitbox, layers);
    if candidates.is_empty() {
        return;
    }

    axis.set_component(&mut character.velocity, 0.0);
    if delta == 0.0 {
        return;
    }

    let size = character.hitbox.size(axis);
    let target = |tile: &Tile| {
        let tile_box = tile.hitbox();
        if delta < 0.0 {
            tile_box.pos(axis) + tile_box.size(axis)
        } else {
            tile_box.pos(axis) - size
        }
    };

    let resolved = match tie_break {
        TieBreak::LastCandidate => candidates.last().map(|&tile| target(tile)),
        TieBreak::NearestBoundary => {
            let targets = candidates.iter().map(|&tile| target(tile));
            if delta < 0.0 {
                targets.reduce(f32::max)
            } else {
                targets.reduce(f32::min)
            }
        }
    };

    if let Some(position) = resolved {
        character.hitbox.set_pos(axis, position);
        character.collision_sides.insert(if delta < 0.0 {
            negative_side
        } else {
            positive_side
        });
    }
}
