//! # marten-data
//!
//! Image dataset adapters for training pipelines.
//!
//! This crate provides:
//! - [`Dataset`] trait — "number of elements" and "element at index"
//! - [`ImageDataset`] — unlabelled images from one or more directory trees,
//!   with a reproducible held-out split for preserved roots
//! - [`LabelledDataset`] — images with labels from a CSV table or class folders
//! - [`LabelTable`] — dense integer indices for string labels
//! - [`DataLoader`] — batching, shuffling, parallel fetching over a Dataset
//   - ImageDecoder seam with an `image`-crate default
//   - Transforms: Resize, Grayscale, ToSample, Normalize, closures
//   - serde configs loadable from YAML or JSON

pub mod config;
pub mod dataset;
pub mod decoder;
pub mod image_dataset;
pub mod labelled_dataset;
pub mod labels;
pub mod loader;
pub mod scan;
pub mod transform;

pub use config::{
    load_config, DatasetConfig, ImageDatasetConfig, LabelledDatasetConfig, RootSpec,
};
pub use dataset::{Dataset, Sample};
pub use decoder::{DefaultDecoder, ImageDecoder};
pub use image_dataset::{ImageDataset, ImageDatasetBuilder};
pub use labelled_dataset::{LabelledDataset, LabelledDatasetBuilder};
pub use labels::LabelTable;
pub use loader::{BatchIter, DataLoader, DataLoaderConfig};
pub use transform::{Transform, TransformExt};

pub use marten_core::{Error, Result};
