use tracing::debug;
use winit::keyboard::KeyCode;

use crate::character::Character;
use crate::config::PhysicsConfig;
use crate::geometry::Rect;
use crate::input::apply_key;
use crate::key_events::KeyEventSubscribers;
use crate::level::{Level, LevelSet};
use crate::tile_callback::CallbackGameState;

/// One running game: the character, the loaded levels and the key bindings,
/// advanced one fixed frame at a time.
#[derive(Debug)]
pub struct GameSession {
    config: PhysicsConfig,
    character: Character,
    levels: LevelSet,
    subscribers: KeyEventSubscribers,
    rng: fastrand::Rng,
    frame: u64,
}

impl GameSession {
    /// Places the character at the current level's spawn point.
    pub fn new(config: PhysicsConfig, levels: LevelSet, subscribers: KeyEventSubscribers) -> Self {
        let spawn = levels.current().spawn();
        let size = config.character_size();
        let character = Character::new(
            Rect::new(spawn.x, spawn.y, size.x, size.y),
            config.character_speed,
            config.jump_strength,
        );
        let rng = match config.rng_seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };

        Self {
            config,
            character,
            levels,
            subscribers,
            rng,
            frame: 0,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn levels(&self) -> &LevelSet {
        &self.levels
    }

    pub fn current_level(&self) -> &Level {
        self.levels.current()
    }

    pub fn subscribers(&self) -> &KeyEventSubscribers {
        &self.subscribers
    }

    /// Frames stepped so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Runs the tile callbacks bound to `key`, then applies the key to the
    /// character's movement.
    pub fn key_down(&mut self, key: KeyCode) {
        let mut state =
            CallbackGameState::new(&mut self.character, &mut self.levels, &mut self.rng);
        self.subscribers.notify(key, &mut state);
        apply_key(&mut self.character, key, true);
    }

    pub fn key_up(&mut self, key: KeyCode) {
        apply_key(&mut self.character, key, false);
    }

    /// Gravity, then collision-resolved movement against the current level.
    pub fn step(&mut self) {
        self.character.apply_gravity(self.config.gravity);
        self.character.tick_with(
            self.levels.current().layers(),
            self.config.max_velocity,
            self.config.tie_break,
        );
        self.frame += 1;
        debug!(
            frame = self.frame,
            level = %self.levels.current_name(),
            x = self.character.position().x,
            y = self.character.position().y,
            "frame_stepped"
        );
    }
}
