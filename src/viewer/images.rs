//! Page tiles uploaded to the terminal, keyed by page, scale and position.

use std::collections::HashMap;
use std::io;

use log::debug;

use super::state::Tile;
use super::terminal;
use crate::document::{DocumentError, ScoreDocument};

/// Scale quantized so float noise from relayout does not force a re-render.
fn scale_key(scale: f64) -> u64 {
    (scale * 10_000.0).round().max(0.0) as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct TileKey {
    page: usize,
    scale: u64,
    col: u32,
    row: u32,
}

impl TileKey {
    pub(super) fn new(tile: &Tile, scale: f64) -> Self {
        Self {
            page: tile.page,
            scale: scale_key(scale),
            col: tile.col,
            row: tile.row,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(super) enum LoadError {
    /// mupdf could not draw the tile; the session goes on without it.
    #[error("failed to render page {}: {source}", page + 1)]
    Render {
        page: usize,
        #[source]
        source: DocumentError,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Track which tiles are loaded in the terminal.
pub(super) struct LoadedTiles {
    map: HashMap<TileKey, u32>,
    next_id: u32,
}

impl LoadedTiles {
    pub(super) fn new() -> Self {
        Self {
            map: HashMap::new(),
            next_id: 1,
        }
    }

    /// Render and upload a tile unless it is already loaded. Returns the
    /// Kitty image id.
    pub(super) fn ensure_loaded(
        &mut self,
        doc: &ScoreDocument,
        tile: &Tile,
        scale: f64,
    ) -> Result<u32, LoadError> {
        let key = TileKey::new(tile, scale);
        if let Some(&id) = self.map.get(&key) {
            return Ok(id);
        }

        let image = doc
            .render_clip(tile.page, scale, tile.rect)
            .map_err(|source| LoadError::Render {
                page: tile.page,
                source,
            })?;
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        terminal::send_image(&image, id)?;
        debug!(
            "tiles: uploaded page {} tile ({}, {}) as id={id} ({}x{})",
            tile.page, tile.col, tile.row, image.width, image.height
        );

        self.map.insert(key, id);
        Ok(id)
    }

    pub(super) fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.map.values().copied()
    }

    /// Drop every upload not in `keep`, bounding terminal memory to what
    /// is on screen.
    pub(super) fn retain(&mut self, keep: &[TileKey]) -> io::Result<()> {
        let stale: Vec<TileKey> = self
            .map
            .keys()
            .filter(|k| !keep.contains(k))
            .copied()
            .collect();
        for key in stale {
            if let Some(id) = self.map.remove(&key) {
                debug!(
                    "tiles: evict page {} tile ({}, {}) id={id}",
                    key.page, key.col, key.row
                );
                terminal::delete_image(id)?;
            }
        }
        Ok(())
    }

    /// Forget everything (document reloaded).
    pub(super) fn clear(&mut self) -> io::Result<()> {
        self.retain(&[])
    }
}
