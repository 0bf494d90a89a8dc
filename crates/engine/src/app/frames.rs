use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{ImageReader, RgbaImage};
use thiserror::Error;
use tracing::{debug, warn};

use crate::asset_keys::{asset_dir_for_key, asset_file_for_key, AssetKeyError};

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Sprite {
    /// Returns `None` when `rgba` does not hold exactly `width * height` pixels.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (rgba.len() == expected).then_some(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    fn from_image(image: RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            rgba: image.into_raw(),
        }
    }
}

/// Ordered animation frames.
///
/// An empty set is valid: lookups return `None` and callers draw nothing.
/// Out-of-range indices clamp to the last frame.
#[derive(Debug, Clone, Default)]
pub struct FrameSet {
    frames: Vec<Arc<Sprite>>,
}

impl FrameSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_sprites(sprites: Vec<Sprite>) -> Self {
        Self {
            frames: sprites.into_iter().map(Arc::new).collect(),
        }
    }

    /// Transparent frames of a fixed size, for simulations without decoded art.
    pub fn placeholder(count: usize, width: u32, height: u32) -> Self {
        let frame = Arc::new(Sprite::filled(width, height, [0, 0, 0, 0]));
        Self {
            frames: vec![frame; count],
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.last_index())
    }

    pub fn frame(&self, index: usize) -> Option<&Sprite> {
        self.frames
            .get(self.clamp_index(index))
            .map(|frame| frame.as_ref())
    }

    /// Width of the first frame, or 0 for an empty set.
    pub fn frame_width(&self) -> u32 {
        self.frames.first().map_or(0, |frame| frame.width)
    }

    pub fn frame_height(&self) -> u32 {
        self.frames.first().map_or(0, |frame| frame.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sizing {
    Native,
    /// Scale factor stored in thousandths so requests stay hashable.
    Scale { permille: u32 },
    Height(u32),
    Exact { width: u32, height: u32 },
}

impl Sizing {
    pub fn scale(factor: f32) -> Self {
        if !factor.is_finite() || factor <= 0.0 {
            return Sizing::Native;
        }
        Sizing::Scale {
            permille: (factor * 1000.0).round() as u32,
        }
    }

    fn target_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Sizing::Native => (width, height),
            Sizing::Scale { permille } => {
                let factor = permille as f32 / 1000.0;
                (
                    ((width as f32 * factor) as u32).max(1),
                    ((height as f32 * factor) as u32).max(1),
                )
            }
            Sizing::Height(target) => {
                if height == 0 {
                    return (width, height);
                }
                let factor = target as f32 / height as f32;
                (((width as f32 * factor) as u32).max(1), target.max(1))
            }
            Sizing::Exact { width, height } => (width.max(1), height.max(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tint {
    #[default]
    None,
    /// Darkened, blue-shifted palette for night scenes.
    Night,
}

impl Tint {
    fn apply(self, image: &mut RgbaImage) {
        match self {
            Tint::None => {}
            Tint::Night => {
                for pixel in image.pixels_mut() {
                    let [r, g, b, a] = pixel.0;
                    pixel.0 = [
                        (r as f32 * 0.4) as u8,
                        (g as f32 * 0.4) as u8,
                        ((b as f32 * 0.5) as u32 + 10).min(255) as u8,
                        a,
                    ];
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameRequest {
    pub key: String,
    pub sizing: Sizing,
    pub tint: Tint,
}

impl FrameRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            sizing: Sizing::Native,
            tint: Tint::None,
        }
    }

    pub fn sized(mut self, sizing: Sizing) -> Self {
        self.sizing = sizing;
        self
    }

    pub fn tinted(mut self, tint: Tint) -> Self {
        self.tint = tint;
        self
    }
}

#[derive(Debug, Error)]
enum FrameLoadError {
    #[error("invalid asset key: {0}")]
    InvalidKey(#[from] AssetKeyError),
    #[error("no png file for key")]
    MissingFile,
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("directory {0} holds no png frames")]
    EmptySequence(PathBuf),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Shared cache of decoded frames, owned by the loop and lent to scenes.
///
/// Entities that use the same art at the same size share one `Arc<FrameSet>`.
/// Failed loads are cached as empty results and warned about once per key.
#[derive(Debug)]
pub struct FrameCache {
    asset_root: PathBuf,
    sequences: HashMap<FrameRequest, Arc<FrameSet>>,
    images: HashMap<FrameRequest, Option<Arc<Sprite>>>,
    warned_keys: HashSet<String>,
}

impl FrameCache {
    pub fn new(asset_root: PathBuf) -> Self {
        Self {
            asset_root,
            sequences: HashMap::new(),
            images: HashMap::new(),
            warned_keys: HashSet::new(),
        }
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    /// Numbered PNG frames from the directory named by the key.
    pub fn sequence(&mut self, request: &FrameRequest) -> Arc<FrameSet> {
        if let Some(cached) = self.sequences.get(request) {
            return Arc::clone(cached);
        }
        let frames = match load_sequence(&self.asset_root, request) {
            Ok(frames) => {
                debug!(key = %request.key, frame_count = frames.len(), "frame_sequence_loaded");
                frames
            }
            Err(error) => {
                self.warn_once(&request.key, &error);
                FrameSet::empty()
            }
        };
        let frames = Arc::new(frames);
        self.sequences.insert(request.clone(), Arc::clone(&frames));
        frames
    }

    /// A single `<key>.png` image.
    pub fn image(&mut self, request: &FrameRequest) -> Option<Arc<Sprite>> {
        if let Some(cached) = self.images.get(request) {
            return cached.clone();
        }
        let sprite = match load_single(&self.asset_root, request) {
            Ok(sprite) => Some(Arc::new(sprite)),
            Err(error) => {
                self.warn_once(&request.key, &error);
                None
            }
        };
        self.images.insert(request.clone(), sprite.clone());
        sprite
    }

    pub fn cached_count(&self) -> usize {
        self.sequences.len() + self.images.len()
    }

    pub fn clear(&mut self) {
        self.sequences.clear();
        self.images.clear();
    }

    fn warn_once(&mut self, key: &str, error: &FrameLoadError) {
        if !self.warned_keys.insert(key.to_string()) {
            return;
        }
        warn!(asset_key = key, error = %error, "frame_load_failed_using_empty");
    }
}

fn load_sequence(asset_root: &Path, request: &FrameRequest) -> Result<FrameSet, FrameLoadError> {
    let dir = asset_dir_for_key(asset_root, &request.key)?;
    let entries = fs::read_dir(&dir).map_err(|source| FrameLoadError::ReadDir {
        path: dir.clone(),
        source,
    })?;
    let mut paths = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "png"))
        .collect::<Vec<_>>();
    if paths.is_empty() {
        return Err(FrameLoadError::EmptySequence(dir));
    }
    paths.sort_by_key(|path| frame_sort_key(path));

    let sprites = paths
        .iter()
        .map(|path| load_prepared(path, request))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FrameSet::from_sprites(sprites))
}

fn load_single(asset_root: &Path, request: &FrameRequest) -> Result<Sprite, FrameLoadError> {
    let path = asset_file_for_key(asset_root, &request.key, &["png"])?
        .ok_or(FrameLoadError::MissingFile)?;
    load_prepared(&path, request)
}

fn load_prepared(path: &Path, request: &FrameRequest) -> Result<Sprite, FrameLoadError> {
    let reader = ImageReader::open(path).map_err(|source| FrameLoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| FrameLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let mut image = decoded.to_rgba8();
    let (width, height) = request
        .sizing
        .target_dimensions(image.width(), image.height());
    if (width, height) != image.dimensions() {
        image = imageops::resize(&image, width, height, FilterType::Triangle);
    }
    request.tint.apply(&mut image);
    Ok(Sprite::from_image(image))
}

/// Sorts `walk_2.png` before `walk_10.png`; names without digits sort last by name.
fn frame_sort_key(path: &Path) -> (u64, String) {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string();
    let digits = stem
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>();
    (digits.parse().unwrap_or(u64::MAX), stem)
}
