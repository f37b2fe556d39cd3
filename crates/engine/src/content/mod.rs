mod discovery;
mod error;
mod keymap;
mod level_grid;
mod tileset;

pub use discovery::{discover_level_files, load_level_set};
pub use error::{ContentError, ContentErrorCode, SourceLocation};
pub use keymap::{build_key_subscribers, load_keymap, parse_keymap, Keymap, KeymapBinding};
pub use level_grid::{load_level, parse_level, LAYER_SEPARATOR};
pub use tileset::{load_tileset, parse_tileset, Tileset, TilesetEntry};
