use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::PhysicsConfig;
use crate::level::{Level, LevelSet, LevelSetError};
use crate::tile_callback::TileArguments;

use super::error::{read_error, ContentError, ContentErrorCode};
use super::level_grid::load_level;
use super::tileset::Tileset;

const LEVEL_EXTENSION: &str = "csv";

/// Level files laid out as `levels_dir/<group>/<level>.csv`, sorted by their
/// path relative to `levels_dir`.
pub fn discover_level_files(levels_dir: &Path) -> Result<Vec<PathBuf>, ContentError> {
    let mut files = Vec::new();
    for group in sorted_entries(levels_dir)? {
        if !group.is_dir() {
            continue;
        }
        files.extend(sorted_entries(&group)?.into_iter().filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(LEVEL_EXTENSION))
        }));
    }
    Ok(files)
}

/// Loads every discovered level into one set. Level names must be unique and
/// every door placed in a level must lead to a loaded level.
pub fn load_level_set(
    levels_dir: &Path,
    tileset: &Tileset,
    config: &PhysicsConfig,
    start: Option<&str>,
) -> Result<LevelSet, ContentError> {
    let files = discover_level_files(levels_dir)?;
    if files.is_empty() {
        return Err(ContentError::new(
            ContentErrorCode::EmptyLevel,
            "no level files found".to_string(),
            levels_dir,
        ));
    }

    let mut sources = HashMap::<String, PathBuf>::new();
    let mut levels = Vec::with_capacity(files.len());
    for path in files {
        let level = load_level(&path, tileset, config)?;
        if let Some(first) = sources.get(level.name()) {
            return Err(ContentError::new(
                ContentErrorCode::DuplicateLevelName,
                format!(
                    "names of levels should be unique, but '{}' is also declared in {}",
                    level.name(),
                    first.display()
                ),
                &path,
            ));
        }
        sources.insert(level.name().to_string(), path);
        levels.push(level);
    }

    for level in &levels {
        validate_doors(level, &sources)?;
    }

    let set = LevelSet::new(levels, start).map_err(|error| match error {
        LevelSetError::UnknownLevel { name } => ContentError::new(
            ContentErrorCode::InvalidValue,
            format!("start level '{name}' was not loaded"),
            levels_dir,
        ),
        other => ContentError::new(ContentErrorCode::EmptyLevel, other.to_string(), levels_dir),
    })?;
    info!(
        levels = set.len(),
        current = %set.current_name(),
        "level_set_loaded"
    );
    Ok(set)
}

fn validate_doors(level: &Level, sources: &HashMap<String, PathBuf>) -> Result<(), ContentError> {
    for tile in level.tiles() {
        let TileArguments::Door { destination_level } = tile.callback().arguments() else {
            continue;
        };
        if !sources.contains_key(destination_level) {
            let path = sources
                .get(level.name())
                .map(PathBuf::as_path)
                .unwrap_or(Path::new(""));
            return Err(ContentError::new(
                ContentErrorCode::UnknownDoorDestination,
                format!(
                    "door tile {} in level '{}' leads to unknown level '{}'",
                    tile.texture_id().0,
                    level.name(),
                    destination_level
                ),
                path,
            ));
        }
    }
    Ok(())
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, ContentError> {
    let entries = fs::read_dir(dir).map_err(|source| read_error(dir, source))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| read_error(dir, source))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::content::tileset::parse_tileset;
    use crate::tile_callback::TileCallbackRegistry;

    fn tileset() -> Tileset {
        parse_tileset(
            r#"<tileset tilewidth="16" tileheight="16">
 <tile id="37"><properties><property name="solid" type="bool" value="true"/></properties></tile>
 <tile id="17"><properties><property name="callback" value="door cellar"/></properties></tile>
</tileset>"#,
            Path::new("tileset.tsx"),
            &TileCallbackRegistry::default(),
        )
        .expect("tileset")
    }

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write");
    }

    #[test]
    fn discovery_walks_groups_in_sorted_order_and_skips_other_files() {
        let temp = TempDir::new().expect("temp");
        let root = temp.path();
        write_file(&root.join("b").join("one.csv"), "b1\n");
        write_file(&root.join("a").join("two.csv"), "a2\n");
        write_file(&root.join("a").join("one.csv"), "a1\n");
        write_file(&root.join("a").join("notes.txt"), "x");
        write_file(&root.join("stray.csv"), "stray\n");

        let files = discover_level_files(root).expect("discover");
        let rel: Vec<PathBuf> = files
            .iter()
            .map(|path| path.strip_prefix(root).expect("under root").to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                Path::new("a").join("one.csv"),
                Path::new("a").join("two.csv"),
                Path::new("b").join("one.csv"),
            ]
        );
    }

    #[test]
    fn loads_set_and_validates_doors() {
        let temp = TempDir::new().expect("temp");
        let root = temp.path();
        write_file(&root.join("castle").join("hall.csv"), "hall\n37,17\n");
        write_file(&root.join("castle").join("cellar.csv"), "cellar\n37\n");

        let set = load_level_set(root, &tileset(), &PhysicsConfig::default(), Some("hall"))
            .expect("levels");
        assert_eq!(set.len(), 2);
        assert_eq!(set.current_name(), "hall");

        let err = load_level_set(root, &tileset(), &PhysicsConfig::default(), Some("attic"))
            .expect_err("start");
        assert_eq!(err.code, ContentErrorCode::InvalidValue);
    }

    #[test]
    fn door_to_missing_level_fails_the_load() {
        let temp = TempDir::new().expect("temp");
        let root = temp.path();
        let hall = root.join("castle").join("hall.csv");
        write_file(&hall, "hall\n37,17\n");

        let err = load_level_set(root, &tileset(), &PhysicsConfig::default(), None)
            .expect_err("door");
        assert_eq!(err.code, ContentErrorCode::UnknownDoorDestination);
        assert_eq!(err.file_path, hall);
        assert!(err.message.contains("cellar"));
    }

    #[test]
    fn duplicate_level_names_fail_the_load() {
        let temp = TempDir::new().expect("temp");
        let root = temp.path();
        write_file(&root.join("a").join("hall.csv"), "hall\n37\n");
        write_file(&root.join("b").join("hall_again.csv"), "hall\n37\n");

        let err = load_level_set(root, &tileset(), &PhysicsConfig::default(), None)
            .expect_err("dup");
        assert_eq!(err.code, ContentErrorCode::DuplicateLevelName);
        assert!(err.file_path.ends_with(Path::new("b").join("hall_again.csv")));
    }

    #[test]
    fn empty_or_missing_directory_is_an_error() {
        let temp = TempDir::new().expect("temp");
        let err = load_level_set(temp.path(), &tileset(), &PhysicsConfig::default(), None)
            .expect_err("empty");
        assert_eq!(err.code, ContentErrorCode::EmptyLevel);

        let err = discover_level_files(&temp.path().join("missing")).expect_err("missing");
        assert_eq!(err.code, ContentErrorCode::ReadFile);
    }
}
