//! Mapping between local paths and remote object keys.
//!
//! A file at `{local_root}/a/b.png` lives remotely at `{remote_dir}/a/b.png`.
//! The mapping is reversible: stripping `{remote_dir}/` from a key gives back
//! the relative path.

use crate::error::SyncError;
use std::path::{Component, Path, PathBuf};

/// The listing prefix for a remote directory.
///
/// Trailing slashes on `remote_dir` are collapsed, so `run1` and `run1/`
/// both give `run1/` and never produce keys like `run1//a.png`.
pub fn remote_prefix(remote_dir: &str) -> String {
    format!("{}/", remote_dir.trim_end_matches('/'))
}

/// Builds the remote key for `path`, which must live under `local_root`.
pub fn remote_key(remote_dir: &str, local_root: &Path, path: &Path) -> Result<String, SyncError> {
    let invalid = |reason| SyncError::InvalidKey {
        key: path.display().to_string(),
        reason,
    };
    let relative = path
        .strip_prefix(local_root)
        .map_err(|_| invalid("path is outside the local folder"))?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(
                segment
                    .to_str()
                    .ok_or_else(|| invalid("path is not valid UTF-8"))?,
            ),
            Component::CurDir => {}
            _ => return Err(invalid("path is not a plain relative path")),
        }
    }
    if segments.is_empty() {
        return Err(invalid("path has no file name"));
    }

    Ok(format!("{}{}", remote_prefix(remote_dir), segments.join("/")))
}

/// Returns the part of `key` after `{remote_dir}/`, if the key lives there.
pub fn relative_key<'a>(remote_dir: &str, key: &'a str) -> Option<&'a str> {
    key.strip_prefix(remote_prefix(remote_dir).as_str())
        .filter(|rest| !rest.is_empty())
}

/// Resolves where `key` lands under `local_dir`.
///
/// Rejects keys outside `remote_dir` and keys whose segments would climb out
/// of `local_dir`.
pub fn local_path(remote_dir: &str, local_dir: &Path, key: &str) -> Result<PathBuf, SyncError> {
    let invalid = |reason| SyncError::InvalidKey {
        key: key.to_string(),
        reason,
    };
    let relative = relative_key(remote_dir, key).ok_or_else(|| invalid("key is outside the remote directory"))?;

    let mut path = local_dir.to_path_buf();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(invalid("key escapes the local directory")),
            segment if segment.contains('\\') || Path::new(segment).is_absolute() => {
                return Err(invalid("key escapes the local directory"));
            }
            segment => path.push(segment),
        }
    }
    if path == local_dir {
        return Err(invalid("key has no file name"));
    }
    Ok(path)
}

/// Exact trailing-extension match. Case matters: `A.PNG` is not a `png`.
pub fn has_extension(name: &str, extensions: &[String]) -> bool {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            extensions.iter().any(|wanted| wanted == ext)
        }
        _ => false,
    }
}
