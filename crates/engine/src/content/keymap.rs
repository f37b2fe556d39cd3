use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};
use winit::keyboard::KeyCode;

use crate::key_events::KeyEventSubscribers;
use crate::tile::ClassId;

use super::error::{read_error, ContentError, ContentErrorCode};
use super::tileset::Tileset;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Keymap {
    pub bindings: Vec<KeymapBinding>,
}

/// Subscribes every tile of `class` to `key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeymapBinding {
    pub key: KeyCode,
    pub class: ClassId,
}

pub fn load_keymap(path: &Path) -> Result<Keymap, ContentError> {
    let raw = fs::read_to_string(path).map_err(|source| read_error(path, source))?;
    parse_keymap(&raw, path)
}

pub fn parse_keymap(raw: &str, file_path: &Path) -> Result<Keymap, ContentError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, Keymap>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let source = error.into_inner();
        let message = if path.is_empty() || path == "." {
            format!("parse keymap json: {source}")
        } else {
            format!("parse keymap json at {path}: {source}")
        };
        ContentError::new(ContentErrorCode::KeymapMalformed, message, file_path)
            .at(source.line(), source.column())
    })
}

/// Subscribes, for each binding in order, every tileset entry of the bound
/// class in tileset order. The entry's id becomes the binding's source id.
pub fn build_key_subscribers(keymap: &Keymap, tileset: &Tileset) -> KeyEventSubscribers {
    let mut subscribers = KeyEventSubscribers::new();
    for binding in &keymap.bindings {
        let mut subscribed = 0usize;
        for entry in tileset.entries_of_class(binding.class) {
            subscribers.subscribe(binding.key, entry.callback().clone(), entry.id());
            subscribed += 1;
        }
        if subscribed == 0 {
            warn!(key = ?binding.key, class = binding.class.0, "keymap_class_has_no_tiles");
        }
    }
    info!(
        bindings = keymap.bindings.len(),
        subscriptions = subscribers.len(),
        "keymap_loaded"
    );
    subscribers
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::content::tileset::parse_tileset;
    use crate::tile::TileId;
    use crate::tile_callback::{TileCallbackKind, TileCallbackRegistry};

    fn tileset() -> Tileset {
        parse_tileset(
            r#"<tileset tilewidth="16" tileheight="16">
 <tile id="45" type="3"><properties><property name="callback" value="ladder"/></properties></tile>
 <tile id="37"/>
 <tile id="17" type="3"><properties><property name="callback" value="door cellar"/></properties></tile>
</tileset>"#,
            Path::new("tileset.tsx"),
            &TileCallbackRegistry::default(),
        )
        .expect("tileset")
    }

    #[test]
    fn bindings_subscribe_every_tile_of_the_class_in_tileset_order() {
        let raw = json!({
            "bindings": [
                { "key": "KeyE", "class": 3 },
                { "key": "KeyQ", "class": 8 }
            ]
        })
        .to_string();
        let keymap = parse_keymap(&raw, Path::new("keymap.json")).expect("keymap");
        let subscribers = build_key_subscribers(&keymap, &tileset());

        let bound: Vec<(TileId, TileCallbackKind)> = subscribers
            .subscribers(KeyCode::KeyE)
            .iter()
            .map(|binding| (binding.source_tile_id(), binding.callback().kind()))
            .collect();
        assert_eq!(
            bound,
            vec![
                (TileId(45), TileCallbackKind::Ladder),
                (TileId(17), TileCallbackKind::Door),
            ]
        );
        assert!(subscribers.subscribers(KeyCode::KeyQ).is_empty());
        assert_eq!(subscribers.len(), 2);
    }

    #[test]
    fn malformed_keymap_reports_failing_path() {
        let raw = json!({
            "bindings": [
                { "key": "KeyE", "class": 3 },
                { "key": "NotAKey", "class": 1 }
            ]
        })
        .to_string();
        let err = parse_keymap(&raw, Path::new("keymap.json")).expect_err("bad key");
        assert_eq!(err.code, ContentErrorCode::KeymapMalformed);
        assert!(err.message.contains("bindings[1].key"));

        let raw = json!({ "bindings": [ { "key": "KeyE" } ] }).to_string();
        let err = parse_keymap(&raw, Path::new("keymap.json")).expect_err("missing class");
        assert!(err.message.contains("missing field"));
    }

    #[test]
    fn load_reports_missing_file() {
        let temp = tempfile::TempDir::new().expect("temp");
        let err = load_keymap(&temp.path().join("keymap.json")).expect_err("missing");
        assert_eq!(err.code, ContentErrorCode::ReadFile);
    }
}
