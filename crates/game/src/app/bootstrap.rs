use std::fs;
use std::path::{Path, PathBuf};

use dungeon_engine::PhysicsConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::loop_runner::AppError;

const CONFIG_ENV_VAR: &str = "DUNGEON_HOP_CONFIG";
const REPLAY_ENV_VAR: &str = "DUNGEON_HOP_REPLAY";
const START_LEVEL_ENV_VAR: &str = "DUNGEON_HOP_START_LEVEL";

#[derive(Debug, Clone, Default)]
pub(crate) struct AppWiring {
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) replay_path: Option<PathBuf>,
    pub(crate) start_level: Option<String>,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Dungeon Hop Startup ===");

    AppWiring {
        config_path: non_empty_env(CONFIG_ENV_VAR).map(PathBuf::from),
        replay_path: non_empty_env(REPLAY_ENV_VAR).map(PathBuf::from),
        start_level: non_empty_env(START_LEVEL_ENV_VAR),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn non_empty_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Defaults when `path` is `None`, otherwise the JSON file layered over the
/// defaults.
pub(crate) fn load_physics_config(path: Option<&Path>) -> Result<PhysicsConfig, AppError> {
    let Some(path) = path else {
        return Ok(PhysicsConfig::default());
    };
    let raw = fs::read_to_string(path).map_err(|source| AppError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_physics_config_json(&raw)
        .and_then(|config| config.validate().map(|()| config))
        .map_err(|message| AppError::Config {
            path: path.to_path_buf(),
            message,
        })?;
    info!(path = %path.display(), "physics_config_loaded");
    Ok(config)
}

pub(crate) fn parse_physics_config_json(raw: &str) -> Result<PhysicsConfig, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, PhysicsConfig>(&mut deserializer) {
        Ok(config) => Ok(config),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse config json: {source}"))
            } else {
                Err(format!("parse config json at {path}: {source}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_physics_config(None).expect("defaults");
        assert_eq!(config, PhysicsConfig::default());
    }

    #[test]
    fn config_file_overrides_named_fields() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("physics.json");
        fs::write(
            &path,
            json!({ "gravity": 1.2, "unknown_callback": "degrade" }).to_string(),
        )
        .expect("write");

        let config = load_physics_config(Some(&path)).expect("config");
        assert_eq!(config.gravity, 1.2);
        assert_eq!(
            config.unknown_callback,
            dungeon_engine::UnknownCallbackPolicy::Degrade
        );
        assert_eq!(config.scaling_factor, 3);
    }

    #[test]
    fn type_mismatch_names_the_field() {
        let raw = json!({ "max_velocity": "fast" }).to_string();
        let error = parse_physics_config_json(&raw).expect_err("mismatch");
        assert!(error.contains("parse config json at max_velocity"));

        let raw = json!({ "tie_break": "closest" }).to_string();
        let error = parse_physics_config_json(&raw).expect_err("variant");
        assert!(error.contains("tie_break"));
        assert!(error.contains("unknown variant"));
    }

    #[test]
    fn out_of_range_values_fail_at_load() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("physics.json");

        fs::write(&path, json!({ "max_velocity": -1.0 }).to_string()).expect("write");
        let error = load_physics_config(Some(&path)).expect_err("negative");
        assert!(matches!(error, AppError::Config { .. }));
        assert!(error.to_string().contains("max_velocity"));

        fs::write(&path, json!({ "scaling_factor": 4_000_000_000_u64 }).to_string())
            .expect("write");
        let error = load_physics_config(Some(&path)).expect_err("scale");
        assert!(matches!(error, AppError::Config { .. }));
        assert!(error.to_string().contains("scaling_factor"));
    }

    #[test]
    fn unreadable_config_is_reported_with_path() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("missing.json");
        let error = load_physics_config(Some(&path)).expect_err("missing");
        assert!(matches!(error, AppError::ReadFile { .. }));
        assert!(error.to_string().contains("missing.json"));
    }
}
