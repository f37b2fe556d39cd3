use std::collections::HashMap;

use winit::keyboard::KeyCode;

use crate::tile::TileId;
use crate::tile_callback::{BoundTileCallback, CallbackGameState};

/// Identity of a subscription, unique within one [`KeyEventSubscribers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub u64);

#[derive(Debug, Clone)]
pub struct KeyBinding {
    id: BindingId,
    callback: BoundTileCallback,
    source_tile_id: TileId,
}

impl KeyBinding {
    pub fn id(&self) -> BindingId {
        self.id
    }

    pub fn callback(&self) -> &BoundTileCallback {
        &self.callback
    }

    pub fn source_tile_id(&self) -> TileId {
        self.source_tile_id
    }
}

/// Routes key presses to the tile callbacks subscribed to them, in
/// subscription order.
#[derive(Debug, Clone, Default)]
pub struct KeyEventSubscribers {
    bindings: HashMap<KeyCode, Vec<KeyBinding>>,
    next_binding_id: u64,
}

impl KeyEventSubscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a binding to `key`'s list.
    pub fn subscribe(
        &mut self,
        key: KeyCode,
        callback: BoundTileCallback,
        source_tile_id: TileId,
    ) -> BindingId {
        let id = BindingId(self.next_binding_id);
        self.next_binding_id = self.next_binding_id.saturating_add(1);
        self.bindings.entry(key).or_default().push(KeyBinding {
            id,
            callback,
            source_tile_id,
        });
        id
    }

    /// Removes the binding `id` from `key`'s list. Returns false when it was
    /// not subscribed there.
    pub fn unsubscribe(&mut self, key: KeyCode, id: BindingId) -> bool {
        let Some(list) = self.bindings.get_mut(&key) else {
            return false;
        };
        let Some(index) = list.iter().position(|binding| binding.id == id) else {
            return false;
        };
        list.remove(index);
        if list.is_empty() {
            self.bindings.remove(&key);
        }
        true
    }

    /// Runs every callback subscribed to `key`. Without subscribers `state`
    /// is left untouched.
    pub fn notify(&self, key: KeyCode, state: &mut CallbackGameState<'_>) {
        let Some(list) = self.bindings.get(&key).filter(|list| !list.is_empty()) else {
            return;
        };
        state.key = Some(key);
        for binding in list {
            state.source_tile_id = binding.source_tile_id;
            binding.callback.invoke(state);
        }
    }

    pub fn subscribers(&self, key: KeyCode) -> &[KeyBinding] {
        self.bindings.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of bindings across every key.
    pub fn len(&self) -> usize {
        self.bindings.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
