// Scanning — enumerate image files under a root directory
//
// Enumeration is a plain recursive `read_dir` walk. Results are sorted by path
// so that the same tree always yields the same order, which in turn makes the
// seeded hold-out split reproducible across platforms.

use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::decoder::{read_and_decode, ImageDecoder};

/// Recognized image extensions (compared case-insensitively).
pub const EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff"];

/// Whether `path` has one of the recognized image extensions.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Recursively collect image files under `root`, sorted by path.
///
/// A root that is missing or is not a directory is logged and yields nothing.
pub fn collect_images(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        tracing::warn!(path = %root.display(), "the path indicated cannot be found");
        return Vec::new();
    }
    let mut out = Vec::new();
    walk(root, &mut out);
    out.sort();
    out
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
    let rd = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };
    for entry in rd.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, out);
        } else if is_image(&path) {
            out.push(path);
        }
    }
}

/// Image files directly inside `dir` (no recursion), sorted by path.
pub fn list_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image(&path) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Drop every path whose contents the decoder rejects, logging each one.
pub fn retain_decodable(paths: Vec<PathBuf>, decoder: &dyn ImageDecoder) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|p| match read_and_decode(decoder, p) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(path = %p.display(), error = %e, "image could not be opened");
                false
            }
        })
        .collect()
}

/// Split `paths` into `(held_out, remainder)` after a seeded shuffle.
///
/// `held_out` receives `floor(frac * paths.len())` entries; `frac` is clamped
/// to `[0, 1]`. The same input and seed always produce the same split.
pub fn holdout_split(
    mut paths: Vec<PathBuf>,
    frac: f64,
    seed: u64,
) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let frac = if frac.is_nan() { 0.0 } else { frac.clamp(0.0, 1.0) };
    let mut rng = StdRng::seed_from_u64(seed);
    paths.shuffle(&mut rng);
    let split = ((paths.len() as f64) * frac).floor() as usize;
    let remainder = paths.split_off(split.min(paths.len()));
    (paths, remainder)
}
