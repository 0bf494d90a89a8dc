use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetKeyError {
    #[error("asset key must not be empty")]
    Empty,
    #[error("asset key must not start or end with '/'")]
    EdgeSlash,
    #[error("asset key must not contain '\\\\'")]
    Backslash,
    #[error("asset key must not contain '..'")]
    ParentTraversal,
    #[error("asset key contains an empty path segment")]
    EmptySegment,
    #[error("asset key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Validates a slash separated asset key such as `level_1/spider/walk`.
///
/// Keys never carry file extensions; loaders pick the extension.
pub fn validate_asset_key(key: &str) -> Result<(), AssetKeyError> {
    if key.is_empty() {
        return Err(AssetKeyError::Empty);
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(AssetKeyError::EdgeSlash);
    }
    if key.contains('\\') {
        return Err(AssetKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(AssetKeyError::ParentTraversal);
    }
    if key.contains("//") {
        return Err(AssetKeyError::EmptySegment);
    }
    for ch in key.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-') {
            continue;
        }
        return Err(AssetKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

pub(crate) fn asset_dir_for_key(asset_root: &Path, key: &str) -> Result<PathBuf, AssetKeyError> {
    validate_asset_key(key)?;
    Ok(key
        .split('/')
        .fold(asset_root.to_path_buf(), |path, segment| path.join(segment)))
}

/// First existing `<asset_root>/<key>.<ext>` for the given extensions, in order.
pub(crate) fn asset_file_for_key(
    asset_root: &Path,
    key: &str,
    extensions: &[&str],
) -> Result<Option<PathBuf>, AssetKeyError> {
    let base = asset_dir_for_key(asset_root, key)?;
    Ok(extensions
        .iter()
        .map(|extension| base.with_extension(extension))
        .find(|candidate| candidate.is_file()))
}
