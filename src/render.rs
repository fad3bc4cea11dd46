//! Rendering and Asset Collaborators
//!
//! The simulation never talks to a GPU. It hands draw commands to a
//! [`RenderSink`] and gets texture handles from a [`TextureLoader`]; the
//! platform layer supplies real implementations. This module ships a
//! filesystem loader, a headless loader and a recording sink.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;

use crate::core::vec2::FixedVec2;

/// Opaque handle to a loaded texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

/// Errors raised while loading assets.
///
/// These are fatal at setup: there is no degraded mode without textures.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The file does not exist.
    #[error("asset not found: {}", path.display())]
    NotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("failed to read asset {}: {source}", path.display())]
    Unreadable {
        /// Requested path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file was read but holds no data.
    #[error("asset is empty: {}", path.display())]
    Empty {
        /// Requested path.
        path: PathBuf,
    },
}

/// Source of texture handles.
pub trait TextureLoader {
    /// Load the texture at `path`.
    fn load(&mut self, path: &Path) -> Result<TextureHandle, AssetError>;
}

/// Loader that validates texture files on disk.
///
/// Decoding and upload belong to the platform layer; this loader only
/// guarantees the file is present and readable, and hands out one stable
/// handle per path.
#[derive(Debug, Default)]
pub struct FsTextureLoader {
    handles: BTreeMap<PathBuf, TextureHandle>,
    next_id: u32,
}

impl FsTextureLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextureLoader for FsTextureLoader {
    fn load(&mut self, path: &Path) -> Result<TextureHandle, AssetError> {
        if let Some(handle) = self.handles.get(path) {
            return Ok(*handle);
        }

        let bytes = std::fs::read(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AssetError::NotFound { path: path.to_path_buf() }
            } else {
                AssetError::Unreadable { path: path.to_path_buf(), source }
            }
        })?;

        if bytes.is_empty() {
            return Err(AssetError::Empty { path: path.to_path_buf() });
        }

        self.next_id += 1;
        let handle = TextureHandle(self.next_id);
        debug!("Loaded texture {} ({} bytes) as {:?}", path.display(), bytes.len(), handle);
        self.handles.insert(path.to_path_buf(), handle);
        Ok(handle)
    }
}

/// Loader for runs without a window: never touches the disk.
#[derive(Debug, Default)]
pub struct HeadlessTextureLoader {
    next_id: u32,
}

impl TextureLoader for HeadlessTextureLoader {
    fn load(&mut self, _path: &Path) -> Result<TextureHandle, AssetError> {
        self.next_id += 1;
        Ok(TextureHandle(self.next_id))
    }
}

/// Model transform of a quad: translation plus per-axis scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTransform {
    /// World-space centre.
    pub translation: FixedVec2,
    /// Quad size.
    pub scale: FixedVec2,
}

/// Consumer of draw commands.
pub trait RenderSink {
    /// Set the camera's horizontal offset (world units).
    fn set_view(&mut self, offset_x: f32);

    /// Draw a textured quad.
    fn draw_quad(&mut self, texture: TextureHandle, transform: &ModelTransform);

    /// Draw one cell of a tile atlas.
    fn draw_tile(&mut self, texture: TextureHandle, atlas_index: u32, transform: &ModelTransform);

    /// Draw a line of bitmap text.
    fn draw_text(&mut self, font: TextureHandle, text: &str, position: (f32, f32));
}

/// One recorded draw command.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Camera offset change.
    View {
        /// Horizontal offset.
        offset_x: f32,
    },
    /// Textured quad.
    Quad {
        /// Texture.
        texture: TextureHandle,
        /// Transform.
        transform: ModelTransform,
    },
    /// Atlas tile.
    Tile {
        /// Atlas texture.
        texture: TextureHandle,
        /// Cell index in the atlas.
        atlas_index: u32,
        /// Transform.
        transform: ModelTransform,
    },
    /// Text line.
    Text {
        /// Font texture.
        font: TextureHandle,
        /// Content.
        text: String,
        /// Screen position.
        position: (f32, f32),
    },
}

/// Sink that records every command, for headless runs and tests.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    /// Commands in submission order.
    pub commands: Vec<DrawCommand>,
}

impl FrameRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop recorded commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Number of quads drawn.
    pub fn quad_count(&self) -> usize {
        self.commands.iter().filter(|c| matches!(c, DrawCommand::Quad { .. })).count()
    }

    /// Number of tiles drawn.
    pub fn tile_count(&self) -> usize {
        self.commands.iter().filter(|c| matches!(c, DrawCommand::Tile { .. })).count()
    }

    /// Text lines drawn.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RenderSink for FrameRecorder {
    fn set_view(&mut self, offset_x: f32) {
        self.commands.push(DrawCommand::View { offset_x });
    }

    fn draw_quad(&mut self, texture: TextureHandle, transform: &ModelTransform) {
        self.commands.push(DrawCommand::Quad { texture, transform: *transform });
    }

    fn draw_tile(&mut self, texture: TextureHandle, atlas_index: u32, transform: &ModelTransform) {
        self.commands.push(DrawCommand::Tile { texture, atlas_index, transform: *transform });
    }

    fn draw_text(&mut self, font: TextureHandle, text: &str, position: (f32, f32)) {
        self.commands.push(DrawCommand::Text { font, text: text.to_string(), position });
    }
}
