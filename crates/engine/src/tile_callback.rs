use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use winit::keyboard::KeyCode;

use crate::character::Character;
use crate::geometry::Vec2;
use crate::level::LevelSet;
use crate::tile::TileId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileCallbackKind {
    None,
    Door,
    Ladder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileArguments {
    None,
    Door { destination_level: String },
    Ladder,
}

impl TileArguments {
    pub fn kind(&self) -> TileCallbackKind {
        match self {
            TileArguments::None => TileCallbackKind::None,
            TileArguments::Door { .. } => TileCallbackKind::Door,
            TileArguments::Ladder => TileCallbackKind::Ladder,
        }
    }

    fn parse(
        kind: TileCallbackKind,
        command: &str,
        tokens: &[&str],
    ) -> Result<Self, TileCallbackError> {
        match kind {
            TileCallbackKind::None => {
                if !tokens.is_empty() {
                    warn!(command, ignored = tokens.len(), "tile_callback_arguments_ignored");
                }
                Ok(TileArguments::None)
            }
            TileCallbackKind::Door => match tokens {
                [destination] => Ok(TileArguments::Door {
                    destination_level: (*destination).to_string(),
                }),
                _ => Err(TileCallbackError::ArityMismatch {
                    command: command.to_string(),
                    expected: 1,
                    actual: tokens.len(),
                }),
            },
            TileCallbackKind::Ladder => {
                if tokens.is_empty() {
                    Ok(TileArguments::Ladder)
                } else {
                    Err(TileCallbackError::ArityMismatch {
                        command: command.to_string(),
                        expected: 0,
                        actual: tokens.len(),
                    })
                }
            }
        }
    }
}

pub struct CallbackGameState<'a> {
    pub character: &'a mut Character,
    pub levels: &'a mut LevelSet,
    pub key: Option<KeyCode>,
    pub source_tile_id: TileId,
    pub rng: &'a mut fastrand::Rng,
}

impl<'a> CallbackGameState<'a> {
    pub fn new(
        character: &'a mut Character,
        levels: &'a mut LevelSet,
        rng: &'a mut fastrand::Rng,
    ) -> Self {
        Self {
            character,
            levels,
            key: None,
            source_tile_id: TileId::NONE,
            rng,
        }
    }

    pub fn character_overlaps_source(&self) -> bool {
        self.levels
            .current()
            .overlaps_tile(self.source_tile_id, &self.character.hitbox())
    }
}

pub type TileCallbackFn = fn(&TileArguments, &mut CallbackGameState<'_>);

#[derive(Debug, Clone, Copy)]
pub struct TileCallbackInfo {
    pub kind: TileCallbackKind,
    pub handler: TileCallbackFn,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCallbackPolicy {
    #[default]
    Reject,
    /// Log a warning and bind the no-op callback.
    Degrade,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileCallbackError {
    #[error("unknown tile callback '{command}'")]
    UnknownCommand { command: String },
    #[error("tile callback '{command}' takes {expected} argument(s), got {actual}")]
    ArityMismatch {
        command: String,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone)]
pub struct BoundTileCallback {
    handler: TileCallbackFn,
    arguments: TileArguments,
}

impl BoundTileCallback {
    pub fn none() -> Self {
        Self {
            handler: none_callback,
            arguments: TileArguments::None,
        }
    }

    pub fn kind(&self) -> TileCallbackKind {
        self.arguments.kind()
    }

    pub fn arguments(&self) -> &TileArguments {
        &self.arguments
    }

    pub fn is_none(&self) -> bool {
        self.kind() == TileCallbackKind::None
    }

    pub fn invoke(&self, state: &mut CallbackGameState<'_>) {
        (self.handler)(&self.arguments, state);
    }
}

impl Default for BoundTileCallback {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Debug, Clone)]
pub struct TileCallbackRegistry {
    callbacks: HashMap<String, TileCallbackInfo>,
    unknown_policy: UnknownCallbackPolicy,
}

impl Default for TileCallbackRegistry {
    fn default() -> Self {
        Self::with_builtins(UnknownCallbackPolicy::default())
    }
}

impl TileCallbackRegistry {
    pub fn empty(unknown_policy: UnknownCallbackPolicy) -> Self {
        Self {
            callbacks: HashMap::new(),
            unknown_policy,
        }
    }

    /// Registry holding `""` (no-op), `"door"` and `"ladder"`.
    pub fn with_builtins(unknown_policy: UnknownCallbackPolicy) -> Self {
        let mut registry = Self::empty(unknown_policy);
        registry.register("", TileCallbackKind::None, none_callback);
        registry.register("door", TileCallbackKind::Door, door_callback);
        registry.register("ladder", TileCallbackKind::Ladder, ladder_callback);
        registry
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        kind: TileCallbackKind,
        handler: TileCallbackFn,
    ) -> Option<TileCallbackInfo> {
        self.callbacks
            .insert(name.into(), TileCallbackInfo { kind, handler })
    }

    pub fn get(&self, name: &str) -> Option<&TileCallbackInfo> {
        self.callbacks.get(name)
    }

    pub fn unknown_policy(&self) -> UnknownCallbackPolicy {
        self.unknown_policy
    }

    /// Splits `behavior` into a command and space separated arguments and
    /// binds it. An empty string binds the no-op callback.
    pub fn bind(&self, behavior: &str) -> Result<BoundTileCallback, TileCallbackError> {
        let mut tokens = behavior.split_whitespace();
        let command = tokens.next().unwrap_or("");
        let arguments = tokens.collect::<Vec<_>>();

        let Some(info) = self.callbacks.get(command) else {
            return match self.unknown_policy {
                UnknownCallbackPolicy::Reject => Err(TileCallbackError::UnknownCommand {
                    command: command.to_string(),
                }),
                UnknownCallbackPolicy::Degrade => {
                    warn!(command, behavior, "unknown_tile_callback_degraded");
                    Ok(BoundTileCallback::none())
                }
            };
        };

        let arguments = TileArguments::parse(info.kind, command, &arguments)?;
        Ok(BoundTileCallback {
            handler: info.handler,
            arguments,
        })
    }
}

pub fn none_callback(_arguments: &TileArguments, _state: &mut CallbackGameState<'_>) {}

pub fn door_callback(arguments: &TileArguments, state: &mut CallbackGameState<'_>) {
    let TileArguments::Door { destination_level } = arguments else {
        unreachable!("door callback bound to {:?} arguments", arguments.kind());
    };
    if !state.character_overlaps_source() {
        return;
    }

    let from = state.levels.current_name().to_string();
    if let Err(error) = state.levels.select(destination_level, state.character) {
        warn!(from = %from, error = %error, "door_transition_failed");
        return;
    }
    state.character.set_velocity(Vec2::ZERO);
    info!(from = %from, to = %destination_level, "door_transition");
}

/// Panics when the level set holds no other level.
pub fn ladder_callback(arguments: &TileArguments, state: &mut CallbackGameState<'_>) {
    assert!(
        matches!(arguments, TileArguments::Ladder),
        "ladder callback bound to {:?} arguments",
        arguments.kind()
    );
    if !state.character_overlaps_source() {
        return;
    }

    let from = state.levels.current_name().to_string();
    let others = state
        .levels
        .names()
        .filter(|name| *name != from)
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    assert!(
        !others.is_empty(),
        "ladder in level '{from}' needs at least one other level to lead to"
    );

    let to = &others[state.rng.usize(..others.len())];
    if let Err(error) = state.levels.select(to, state.character) {
        warn!(from = %from, error = %error, "ladder_transition_failed");
        return;
    }
    info!(from = %from, to = %to, "ladder_transition");
}
