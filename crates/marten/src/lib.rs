//! # marten
//!
//! Image dataset adapters for training pipelines.
//!
//! This is the facade crate that re-exports everything you need.
//!
//! ```rust,no_run
//! use marten::prelude::*;
//!
//! # fn main() -> marten::Result<()> {
//! let ds = ImageDataset::new(["data/train"])
//!     .build()?
//!     .with_transform(Resize::new(256, 256).then(ToSample));
//! let mut loader = DataLoader::new(&ds, DataLoaderConfig::default().batch_size(32));
//! for batch in loader.iter() {
//!     let batch = batch?;
//!     println!("{} samples", batch.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! | Crate | Purpose |
//! |-------|---------|
//! | `marten-core` | `Error`, `Result`, `bail!` |
//! | `marten-data` | datasets, decoder, transforms, loader, configs |

pub use marten_core::{bail, Error, Result};

/// Re-export the dataset adapters.
pub mod data {
    pub use marten_data::*;
}

pub use marten_data::{
    DataLoader, DataLoaderConfig, Dataset, ImageDataset, LabelTable, LabelledDataset, Sample,
};

/// Everything needed to build and iterate a dataset.
pub mod prelude {
    pub use marten_data::config::{DatasetConfig, ImageDatasetConfig, LabelledDatasetConfig};
    pub use marten_data::transform::{
        from_fn, Grayscale, Identity, Normalize, Resize, ToSample, Transform, TransformExt,
    };
    pub use marten_data::{
        load_config, DataLoader, DataLoaderConfig, Dataset, ImageDataset, LabelTable,
        LabelledDataset, RootSpec, Sample,
    };
    pub use marten_core::{Error, Result};
}
