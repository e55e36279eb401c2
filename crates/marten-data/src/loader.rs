// DataLoader — batching, shuffling, iteration over any Dataset

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use rayon::prelude::*;

use marten_core::Result;

use crate::dataset::Dataset;

/// Configuration for the DataLoader.
#[derive(Debug, Clone)]
pub struct DataLoaderConfig {
    /// Number of samples per batch.
    pub batch_size: usize,
    /// Whether to shuffle indices each epoch.
    pub shuffle: bool,
    /// Whether to drop the last incomplete batch.
    pub drop_last: bool,
    /// Fetch samples on the rayon pool when non-zero (0 = sequential).
    pub num_workers: usize,
    /// Optional random seed for reproducible shuffling.
    pub seed: Option<u64>,
}

impl Default for DataLoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: false,
            drop_last: false,
            num_workers: 0,
            seed: None,
        }
    }
}

impl DataLoaderConfig {
    pub fn batch_size(mut self, bs: usize) -> Self {
        self.batch_size = bs;
        self
    }

    pub fn shuffle(mut self, s: bool) -> Self {
        self.shuffle = s;
        self
    }

    pub fn drop_last(mut self, d: bool) -> Self {
        self.drop_last = d;
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }
}

/// A DataLoader wraps a Dataset and produces batches of its items.
///
/// The loader only ever calls `len` and `get`; a sample that fails to load
/// fails its batch with the dataset's error and later batches are unaffected.
pub struct DataLoader<'a, D: Dataset> {
    dataset: &'a D,
    config: DataLoaderConfig,
    indices: Vec<usize>,
    rng: StdRng,
}

impl<'a, D: Dataset> DataLoader<'a, D>
where
    D::Item: Send,
{
    /// Create a new DataLoader over a dataset.
    ///
    /// # Panics
    /// Panics if `config.batch_size` is zero.
    pub fn new(dataset: &'a D, config: DataLoaderConfig) -> Self {
        assert!(config.batch_size > 0, "DataLoader: batch_size must be > 0");
        let indices: Vec<usize> = (0..dataset.len()).collect();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            dataset,
            config,
            indices,
            rng,
        }
    }

    /// The number of batches per epoch.
    pub fn num_batches(&self) -> usize {
        if self.config.drop_last {
            self.dataset.len() / self.config.batch_size
        } else {
            self.dataset.len().div_ceil(self.config.batch_size)
        }
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Reshuffle indices (called at the start of each epoch).
    pub fn reshuffle(&mut self) {
        if self.config.shuffle {
            self.indices.shuffle(&mut self.rng);
        }
    }

    /// Fetch a slice of samples, optionally in parallel via rayon.
    fn fetch(&self, indices: &[usize]) -> Result<Vec<D::Item>> {
        if self.config.num_workers > 0 && indices.len() > 1 {
            indices.par_iter().map(|&i| self.dataset.get(i)).collect()
        } else {
            indices.iter().map(|&i| self.dataset.get(i)).collect()
        }
    }

    /// Load batch `batch_idx` of the current epoch order.
    pub fn batch(&self, batch_idx: usize) -> Option<Result<Vec<D::Item>>> {
        if batch_idx >= self.num_batches() {
            return None;
        }
        let bs = self.config.batch_size;
        let start = batch_idx * bs;
        let end = (start + bs).min(self.indices.len());
        Some(self.fetch(&self.indices[start..end]))
    }

    /// Start an epoch: reshuffle, then iterate over its batches lazily.
    pub fn iter(&mut self) -> BatchIter<'_, 'a, D> {
        self.reshuffle();
        BatchIter {
            loader: self,
            next: 0,
        }
    }

    /// Load every batch of one epoch, stopping at the first error.
    pub fn epoch_batches(&mut self) -> Result<Vec<Vec<D::Item>>> {
        self.iter().collect()
    }
}

/// Iterator over the batches of one epoch. See [`DataLoader::iter`].
pub struct BatchIter<'l, 'a, D: Dataset> {
    loader: &'l DataLoader<'a, D>,
    next: usize,
}

impl<D: Dataset> Iterator for BatchIter<'_, '_, D>
where
    D::Item: Send,
{
    type Item = Result<Vec<D::Item>>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch = self.loader.batch(self.next)?;
        self.next += 1;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.loader.num_batches().saturating_sub(self.next);
        (left, Some(left))
    }
}
