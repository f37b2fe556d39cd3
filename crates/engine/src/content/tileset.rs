use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use roxmltree::{Document, Node};
use tracing::info;

use crate::geometry::{Rect, Vec2};
use crate::tile::{ClassId, Tile, TileId};
use crate::tile_callback::{BoundTileCallback, TileArguments, TileCallbackRegistry};

use super::error::{error_at_node, read_error, ContentError, ContentErrorCode};

/// One tile kind of the tileset. Sizes are in source pixels, unscaled.
#[derive(Debug, Clone)]
pub struct TilesetEntry {
    id: TileId,
    image_source: Option<String>,
    size: Vec2,
    collision: Option<Rect>,
    solid: bool,
    class_id: ClassId,
    spawn: bool,
    behavior: String,
    callback: BoundTileCallback,
}

impl TilesetEntry {
    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn image_source(&self) -> Option<&str> {
        self.image_source.as_deref()
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Hitbox relative to the cell, when it differs from the full image.
    pub fn collision(&self) -> Option<Rect> {
        self.collision
    }

    pub fn is_solid(&self) -> bool {
        self.solid
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn is_spawn(&self) -> bool {
        self.spawn
    }

    pub fn behavior(&self) -> &str {
        &self.behavior
    }

    pub fn callback(&self) -> &BoundTileCallback {
        &self.callback
    }

    /// Builds the tile for a grid cell whose top-left corner is `cell`.
    pub fn place(&self, cell: Vec2, scale: f32) -> Tile {
        let (offset, size) = match self.collision {
            Some(rect) => (
                Vec2::new(rect.x * scale, rect.y * scale),
                Vec2::new(rect.w * scale, rect.h * scale),
            ),
            None => (Vec2::ZERO, Vec2::new(self.size.x * scale, self.size.y * scale)),
        };
        Tile::new(
            Rect::new(cell.x + offset.x, cell.y + offset.y, size.x, size.y),
            self.id,
        )
        .solid(self.solid)
        .with_class(self.class_id)
        .with_callback(self.callback.clone())
        .with_hitbox_offset(offset)
    }
}

/// Tile kinds in document order, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct Tileset {
    name: String,
    tile_width: u32,
    tile_height: u32,
    entries: Vec<TilesetEntry>,
    index: HashMap<TileId, usize>,
}

impl Tileset {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    pub fn get(&self, id: TileId) -> Option<&TilesetEntry> {
        self.index.get(&id).map(|&idx| &self.entries[idx])
    }

    pub fn entries(&self) -> &[TilesetEntry] {
        &self.entries
    }

    pub fn entries_of_class(&self, class_id: ClassId) -> impl Iterator<Item = &TilesetEntry> + '_ {
        self.entries
            .iter()
            .filter(move |entry| entry.class_id == class_id)
    }

    pub fn door_destinations(&self) -> impl Iterator<Item = (TileId, &str)> + '_ {
        self.entries
            .iter()
            .filter_map(|entry| match entry.callback.arguments() {
                TileArguments::Door { destination_level } => {
                    Some((entry.id, destination_level.as_str()))
                }
                _ => None,
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn load_tileset(path: &Path, registry: &TileCallbackRegistry) -> Result<Tileset, ContentError> {
    let raw = fs::read_to_string(path).map_err(|source| read_error(path, source))?;
    let tileset = parse_tileset(&raw, path, registry)?;
    info!(
        path = %path.display(),
        name = %tileset.name,
        tiles = tileset.len(),
        "tileset_loaded"
    );
    Ok(tileset)
}

/// Parses a Tiled `.tsx` document. `file_path` is only used for error
/// reports.
pub fn parse_tileset(
    raw: &str,
    file_path: &Path,
    registry: &TileCallbackRegistry,
) -> Result<Tileset, ContentError> {
    let doc = Document::parse(raw).map_err(|error| {
        ContentError::new(
            ContentErrorCode::XmlMalformed,
            format!("malformed XML: {error}"),
            file_path,
        )
        .at(error.pos().row as usize, error.pos().col as usize)
    })?;
    let parser = TilesetParser {
        doc: &doc,
        file_path,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "tileset" {
        return Err(parser.error(
            ContentErrorCode::InvalidRoot,
            "root element must be <tileset>".to_string(),
            root,
        ));
    }

    let tile_width = parser.required_attr::<u32>(root, "tilewidth")?;
    let tile_height = parser.required_attr::<u32>(root, "tileheight")?;
    let mut tileset = Tileset {
        name: root.attribute("name").unwrap_or_default().to_string(),
        tile_width,
        tile_height,
        entries: Vec::new(),
        index: HashMap::new(),
    };

    for node in root
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "tile")
    {
        let entry = parser.parse_entry(node, tile_width, tile_height, registry)?;
        if tileset.index.contains_key(&entry.id) {
            return Err(parser.error(
                ContentErrorCode::DuplicateTileId,
                format!("tile id {} is declared more than once", entry.id.0),
                node,
            ));
        }
        tileset.index.insert(entry.id, tileset.entries.len());
        tileset.entries.push(entry);
    }

    Ok(tileset)
}

struct TilesetParser<'d, 'input> {
    doc: &'d Document<'input>,
    file_path: &'d Path,
}

impl<'d, 'input> TilesetParser<'d, 'input> {
    fn error(&self, code: ContentErrorCode, message: String, node: Node<'_, '_>) -> ContentError {
        error_at_node(code, message, self.file_path, self.doc, node)
    }

    fn attr<T: FromStr>(&self, node: Node<'_, '_>, name: &str) -> Result<Option<T>, ContentError> {
        let Some(raw) = node.attribute(name) else {
            return Ok(None);
        };
        raw.trim().parse::<T>().map(Some).map_err(|_| {
            self.error(
                ContentErrorCode::InvalidValue,
                format!(
                    "attribute '{}' of <{}> has invalid value '{}'",
                    name,
                    node.tag_name().name(),
                    raw
                ),
                node,
            )
        })
    }

    fn required_attr<T: FromStr>(&self, node: Node<'_, '_>, name: &str) -> Result<T, ContentError> {
        self.attr(node, name)?.ok_or_else(|| {
            self.error(
                ContentErrorCode::MissingField,
                format!(
                    "missing required attribute '{}' on <{}>",
                    name,
                    node.tag_name().name()
                ),
                node,
            )
        })
    }

    fn parse_entry(
        &self,
        node: Node<'_, '_>,
        tile_width: u32,
        tile_height: u32,
        registry: &TileCallbackRegistry,
    ) -> Result<TilesetEntry, ContentError> {
        let id = TileId(self.required_attr::<i32>(node, "id")?);
        if id.0 < 0 {
            return Err(self.error(
                ContentErrorCode::InvalidValue,
                format!("tile id {} must not be negative", id.0),
                node,
            ));
        }

        let mut entry = TilesetEntry {
            id,
            image_source: None,
            size: Vec2::new(tile_width as f32, tile_height as f32),
            collision: None,
            solid: false,
            class_id: self.class_attr(node),
            spawn: false,
            behavior: String::new(),
            callback: BoundTileCallback::none(),
        };
        let mut callback_node = None;

        for child in node.children().filter(|child| child.is_element()) {
            match child.tag_name().name() {
                "image" => {
                    entry.image_source = child.attribute("source").map(str::to_string);
                    let width = self.attr::<u32>(child, "width")?.unwrap_or(0);
                    let height = self.attr::<u32>(child, "height")?.unwrap_or(0);
                    // Zero-sized images take the tileset's grid size.
                    if width != 0 && height != 0 {
                        entry.size = Vec2::new(width as f32, height as f32);
                    }
                }
                "properties" => {
                    for property in child
                        .children()
                        .filter(|p| p.is_element() && p.tag_name().name() == "property")
                    {
                        let name = self.required_attr::<String>(property, "name")?;
                        match name.as_str() {
                            "solid" => entry.solid = self.bool_property(property)?,
                            "spawn" => entry.spawn = self.bool_property(property)?,
                            "class" => {
                                entry.class_id = ClassId(self.required_attr(property, "value")?)
                            }
                            "callback" => {
                                entry.behavior = property_value(property).to_string();
                                callback_node = Some(property);
                            }
                            _ => {}
                        }
                    }
                }
                "objectgroup" => {
                    if let Some(object) = child
                        .children()
                        .find(|o| o.is_element() && o.tag_name().name() == "object")
                    {
                        entry.collision = Some(Rect::new(
                            self.attr::<f32>(object, "x")?.unwrap_or(0.0),
                            self.attr::<f32>(object, "y")?.unwrap_or(0.0),
                            self.required_attr::<f32>(object, "width")?,
                            self.required_attr::<f32>(object, "height")?,
                        ));
                    }
                }
                _ => {}
            }
        }

        entry.callback = registry.bind(&entry.behavior).map_err(|error| {
            self.error(
                ContentErrorCode::Callback,
                format!("tile {}: {error}", id.0),
                callback_node.unwrap_or(node),
            )
        })?;
        Ok(entry)
    }

    /// Numeric `class` or legacy `type` attribute. Non-numeric values are
    /// Tiled class names and mean "no class".
    fn class_attr(&self, node: Node<'_, '_>) -> ClassId {
        node.attribute("class")
            .or_else(|| node.attribute("type"))
            .and_then(|value| value.trim().parse::<i32>().ok())
            .map(ClassId)
            .unwrap_or_default()
    }

    fn bool_property(&self, property: Node<'_, '_>) -> Result<bool, ContentError> {
        match property_value(property).trim() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            other => Err(self.error(
                ContentErrorCode::InvalidValue,
                format!("property value '{other}' is not a bool"),
                property,
            )),
        }
    }
}

/// Tiled writes short values in `value` and multi-line ones as text.
fn property_value<'a>(property: Node<'a, '_>) -> &'a str {
    property
        .attribute("value")
        .or_else(|| property.text())
        .unwrap_or_default()
}
