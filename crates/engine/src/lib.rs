use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod character;
pub mod collision;
pub mod config;
pub mod content;
pub mod geometry;
pub mod input;
pub mod key_events;
pub mod level;
pub mod session;
pub mod tile;
pub mod tile_callback;

pub use character::{Character, CollisionSides, MovementIntent};
pub use collision::{collect_candidates, move_and_resolve, TieBreak};
pub use config::PhysicsConfig;
pub use content::{
    build_key_subscribers, discover_level_files, load_keymap, load_level, load_level_set,
    load_tileset, parse_keymap, parse_level, parse_tileset, ContentError, ContentErrorCode,
    Keymap, KeymapBinding, SourceLocation, Tileset, TilesetEntry,
};
pub use geometry::{Axis, Rect, Vec2};
pub use input::{apply_key, InputAction};
pub use key_events::{BindingId, KeyBinding, KeyEventSubscribers};
pub use level::{Level, LevelLayer, LevelSet, LevelSetError};
pub use session::GameSession;
pub use tile::{ClassId, Tile, TileId};
pub use tile_callback::{
    BoundTileCallback, CallbackGameState, TileArguments, TileCallbackError, TileCallbackFn,
    TileCallbackInfo, TileCallbackKind, TileCallbackRegistry, UnknownCallbackPolicy,
};
pub use winit::keyboard::KeyCode;

pub const ROOT_ENV_VAR: &str = "DUNGEON_HOP_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub tileset_path: PathBuf,
    pub levels_dir: PathBuf,
    pub keymap_path: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let assets_dir = root.join("assets");
        Self {
            tileset_path: assets_dir.join("tileset.tsx"),
            levels_dir: assets_dir.join("levels"),
            keymap_path: assets_dir.join("keymap.json"),
            assets_dir,
            root,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "DUNGEON_HOP_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and an assets/ directory."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/dungeon-hop\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    resolve_root().map(AppPaths::from_root)
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            exe_dir
                .ancestors()
                .find(|candidate| is_repo_marker(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(&exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && path.join("assets").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
