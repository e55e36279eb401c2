// ImageDataset — unlabelled images enumerated from one or more directory trees
//
//   let ds = ImageDataset::new(["data/set_a", "data/set_b"])
//       .preserve("data/set_b")
//       .frac(0.1)
//       .build()?
//       .with_transform(Resize::new(256, 256).then(ToSample));
//
// Every root is walked recursively and only files with a recognized image
// extension are kept. With validation on (the default) each candidate is
// decoded once up front and files that fail are logged and dropped.
//
// Roots listed as "preserved" are split with a fixed-seed shuffle: a fraction
// of their files is set aside in a held-out collection (see `held_out`) and
// only the remainder is part of this dataset.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use marten_core::{Error, Result};

use crate::config::{ImageDatasetConfig, RootSpec};
use crate::dataset::Dataset;
use crate::decoder::{read_and_decode, DefaultDecoder, ImageDecoder};
use crate::scan::{collect_images, holdout_split, retain_decodable};
use crate::transform::{Identity, Transform};

/// Default fraction of a preserved root that is held out.
pub const DEFAULT_FRAC: f64 = 0.1;

/// Default seed of the hold-out shuffle.
pub const DEFAULT_SEED: u64 = 24;

/// Builder for [`ImageDataset`].
pub struct ImageDatasetBuilder {
    roots: Vec<PathBuf>,
    preserved: Vec<PathBuf>,
    frac: f64,
    validate: bool,
    seed: u64,
    decoder: Arc<dyn ImageDecoder>,
}

impl ImageDatasetBuilder {
    /// Create a builder over the given roots.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            roots: roots.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
            preserved: Vec::new(),
            frac: DEFAULT_FRAC,
            validate: true,
            seed: DEFAULT_SEED,
            decoder: Arc::new(DefaultDecoder),
        }
    }

    /// Add another root.
    pub fn root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.roots.push(root.as_ref().to_path_buf());
        self
    }

    /// Mark a root as preserved. It must be spelled exactly as the root.
    pub fn preserve<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.preserved.push(root.as_ref().to_path_buf());
        self
    }

    /// Fraction of each preserved root that is held out.
    pub fn frac(mut self, frac: f64) -> Self {
        self.frac = frac;
        self
    }

    /// Decode every candidate at build time and drop unreadable ones.
    pub fn validate(mut self, yes: bool) -> Self {
        self.validate = yes;
        self
    }

    /// Seed of the hold-out shuffle.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Use a custom decoder instead of [`DefaultDecoder`].
    pub fn decoder<D: ImageDecoder + 'static>(mut self, decoder: D) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Walk the roots and build the dataset.
    pub fn build(self) -> Result<ImageDataset> {
        if !self.frac.is_finite() || !(0.0..=1.0).contains(&self.frac) {
            return Err(Error::Config(format!(
                "frac must lie in [0, 1], got {}",
                self.frac
            )));
        }

        let mut paths = Vec::new();
        let mut preserved = Vec::new();
        for root in &self.roots {
            let mut files = collect_images(root);
            if self.validate {
                files = retain_decodable(files, self.decoder.as_ref());
            }
            if self.preserved.contains(root) {
                let before = preserved.len();
                let (held, rest) = holdout_split(files, self.frac, self.seed);
                preserved.extend(held);
                paths.extend(rest);
                tracing::info!(
                    path = %root.display(),
                    held_out = preserved.len() - before,
                    "images have been saved for the dataset"
                );
            } else {
                paths.extend(files);
            }
        }

        tracing::debug!(
            roots = self.roots.len(),
            images = paths.len(),
            held_out = preserved.len(),
            "image dataset built"
        );

        Ok(ImageDataset {
            paths,
            preserved,
            decoder: self.decoder,
            transform: Identity,
        })
    }
}

/// Images from one or more directory trees, decoded on access.
pub struct ImageDataset<T = Identity> {
    /// Enumerated, non-held-out files in scan order.
    paths: Vec<PathBuf>,
    /// Files set aside from preserved roots.
    preserved: Vec<PathBuf>,
    decoder: Arc<dyn ImageDecoder>,
    transform: T,
}

impl ImageDataset {
    /// Convenience entry-point: `ImageDataset::new(roots)` returns a builder.
    pub fn new<I, P>(roots: I) -> ImageDatasetBuilder
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        ImageDatasetBuilder::new(roots)
    }

    /// Build from a deserialized configuration.
    pub fn from_config(config: &ImageDatasetConfig) -> Result<Self> {
        let mut builder = ImageDatasetBuilder::new(config.root.flatten()?)
            .frac(config.frac)
            .validate(config.is_valid)
            .seed(config.seed);
        if let Some(preserved) = &config.path_preserved {
            for p in preserved.flatten()? {
                builder = builder.preserve(p);
            }
        }
        builder.build()
    }

    /// Build over a single root or list of roots with default settings.
    pub fn open(root: impl Into<RootSpec>) -> Result<Self> {
        ImageDatasetBuilder::new(root.into().flatten()?).build()
    }
}

impl<T> ImageDataset<T> {
    /// Replace the post-decode transform.
    pub fn with_transform<U>(self, transform: U) -> ImageDataset<U>
    where
        U: Transform<DynamicImage>,
    {
        ImageDataset {
            paths: self.paths,
            preserved: self.preserved,
            decoder: self.decoder,
            transform,
        }
    }

    /// Enumerated files, in index order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// File path of the i-th sample.
    pub fn path_of(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    /// Files held out from preserved roots.
    pub fn preserved(&self) -> &[PathBuf] {
        &self.preserved
    }

    /// A dataset over the held-out files, sharing this dataset's decoder.
    pub fn held_out(&self) -> ImageDataset {
        ImageDataset {
            paths: self.preserved.clone(),
            preserved: Vec::new(),
            decoder: Arc::clone(&self.decoder),
            transform: Identity,
        }
    }

    /// Read and decode the i-th image without applying the transform.
    pub fn load_image(&self, index: usize) -> Result<DynamicImage> {
        let path = self.paths.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            len: self.paths.len(),
        })?;
        read_and_decode(self.decoder.as_ref(), path).map_err(|e| e.at_sample(index))
    }
}

impl<T> Dataset for ImageDataset<T>
where
    T: Transform<DynamicImage>,
{
    type Item = T::Output;

    fn len(&self) -> usize {
        self.paths.len()
    }

    fn get(&self, index: usize) -> Result<T::Output> {
        let image = self.load_image(index)?;
        Ok(self.transform.apply(image))
    }

    fn name(&self) -> &str {
        "ImageDataset"
    }
}

impl<T> fmt::Debug for ImageDataset<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageDataset")
            .field("len", &self.paths.len())
            .field("preserved", &self.preserved.len())
            .finish_non_exhaustive()
    }
}
