use std::path::PathBuf;
use std::process::ExitCode;

use dungeon_engine::{
    build_key_subscribers, load_keymap, load_level_set, load_tileset, resolve_app_paths,
    AppPaths, ContentError, GameSession, StartupError, TileCallbackRegistry,
};
use thiserror::Error;
use tracing::{error, info};

use super::bootstrap::{load_physics_config, AppWiring};
use super::replay::load_replay;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to load content: {0}")]
    Content(#[from] ContentError),
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },
    #[error("invalid replay {path}: {message}")]
    Replay { path: PathBuf, message: String },
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let result = resolve_app_paths()
        .map_err(AppError::from)
        .and_then(|paths| run_with_paths(&app, &paths));
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}

/// Loads everything under `paths`, plays the replay and returns the finished
/// session.
pub(crate) fn run_with_paths(app: &AppWiring, paths: &AppPaths) -> Result<GameSession, AppError> {
    info!(
        root = %paths.root.display(),
        tileset = %paths.tileset_path.display(),
        levels_dir = %paths.levels_dir.display(),
        keymap = %paths.keymap_path.display(),
        "startup"
    );

    let config = load_physics_config(app.config_path.as_deref())?;
    let registry = TileCallbackRegistry::with_builtins(config.unknown_callback);
    let tileset = load_tileset(&paths.tileset_path, &registry)?;
    let levels = load_level_set(
        &paths.levels_dir,
        &tileset,
        &config,
        app.start_level.as_deref(),
    )?;
    let keymap = load_keymap(&paths.keymap_path)?;
    let subscribers = build_key_subscribers(&keymap, &tileset);
    let replay = load_replay(app.replay_path.as_deref())?;

    let mut session = GameSession::new(config, levels, subscribers);
    info!(
        level = %session.levels().current_name(),
        x = session.character().position().x,
        y = session.character().position().y,
        "session_started"
    );

    replay.play(&mut session);

    let character = session.character();
    info!(
        frames = session.frame(),
        level = %session.levels().current_name(),
        x = character.position().x,
        y = character.position().y,
        vx = character.velocity().x,
        vy = character.velocity().y,
        sides = ?character.collision_sides(),
        "shutdown"
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use dungeon_engine::{CollisionSides, ContentErrorCode};
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    const TILESET: &str = r#"<tileset name="test" tilewidth="16" tileheight="16">
 <tile id="37">
  <properties><property name="solid" type="bool" value="true"/></properties>
 </tile>
 <tile id="17" type="3">
  <properties><property name="callback" value="door cellar"/></properties>
 </tile>
 <tile id="8">
  <properties><property name="spawn" type="bool" value="true"/></properties>
 </tile>
</tileset>"#;

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write");
    }

    fn setup(root: &Path) -> AppPaths {
        let paths = AppPaths::from_root(root.to_path_buf());
        write_file(&paths.tileset_path, TILESET);
        write_file(
            &paths.levels_dir.join("castle").join("hall.csv"),
            "hall\n8,-1,-1\n-1,-1,17\n37,37,37\n",
        );
        write_file(
            &paths.levels_dir.join("castle").join("cellar.csv"),
            "cellar\n-1,8\n37,37\n",
        );
        write_file(
            &paths.keymap_path,
            &json!({ "bindings": [ { "key": "KeyE", "class": 3 } ] }).to_string(),
        );
        paths
    }

    #[test]
    fn idle_run_lands_on_the_floor() {
        let temp = TempDir::new().expect("temp");
        let paths = setup(temp.path());

        let session = run_with_paths(
            &AppWiring {
                start_level: Some("hall".to_string()),
                ..AppWiring::default()
            },
            &paths,
        )
        .expect("run");

        assert_eq!(session.frame(), 120);
        assert_eq!(session.levels().current_name(), "hall");
        assert_eq!(session.character().hitbox().bottom(), 96.0);
        assert!(session
            .character()
            .collision_sides()
            .contains(CollisionSides::BOTTOM));
    }

    #[test]
    fn replay_walks_to_the_door_and_enters_it() {
        let temp = TempDir::new().expect("temp");
        let paths = setup(temp.path());
        let replay = temp.path().join("replay.json");
        write_file(
            &replay,
            &json!({
                "frames": 80,
                "events": [
                    { "frame": 30, "key": "KeyD", "pressed": true },
                    { "frame": 50, "key": "KeyD", "pressed": false },
                    { "frame": 51, "key": "KeyE", "pressed": true },
                    { "frame": 52, "key": "KeyE", "pressed": false }
                ]
            })
            .to_string(),
        );

        let session = run_with_paths(
            &AppWiring {
                replay_path: Some(replay),
                start_level: Some("hall".to_string()),
                ..AppWiring::default()
            },
            &paths,
        )
        .expect("run");

        assert_eq!(session.levels().current_name(), "cellar");
        assert_eq!(session.character().position().x, 48.0);
        assert_eq!(session.character().hitbox().bottom(), 48.0);
    }

    #[test]
    fn bundled_assets_replay_ends_in_the_cellar() {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..");
        let paths = AppPaths::from_root(root);
        let session = run_with_paths(
            &AppWiring {
                replay_path: Some(paths.assets_dir.join("replay.json")),
                start_level: Some("hall".to_string()),
                ..AppWiring::default()
            },
            &paths,
        )
        .expect("run");

        assert_eq!(session.frame(), 180);
        assert_eq!(session.levels().current_name(), "cellar");
        assert_eq!(session.character().position().x, 144.0);
        assert_eq!(session.character().hitbox().bottom(), 144.0);
    }

    #[test]
    fn content_errors_abort_the_run() {
        let temp = TempDir::new().expect("temp");
        let paths = setup(temp.path());
        write_file(
            &paths.levels_dir.join("castle").join("attic.csv"),
            "attic\n37,99\n",
        );

        let error = run_with_paths(&AppWiring::default(), &paths).expect_err("unknown id");
        match error {
            AppError::Content(content) => {
                assert_eq!(content.code, ContentErrorCode::UnknownTileId);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_start_level_is_rejected() {
        let temp = TempDir::new().expect("temp");
        let paths = setup(temp.path());
        let error = run_with_paths(
            &AppWiring {
                start_level: Some("roof".to_string()),
                ..AppWiring::default()
            },
            &paths,
        )
        .expect_err("start");
        assert!(error.to_string().contains("roof"));
    }
}
