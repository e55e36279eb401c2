// Dataset trait — unified indexed-collection interface

use marten_core::Result;

/// A dense numeric sample: a pair of (input features, label/target).
///
/// Both are stored as `Vec<f64>` with their associated shapes so a batching
/// layer can stack them into tensors later. Images converted with
/// [`ToSample`](crate::transform::ToSample) use `[C, H, W]` layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Input feature vector (flattened).
    pub features: Vec<f64>,
    /// Shape of the feature tensor (e.g. `[3, 224, 224]`).
    pub feature_shape: Vec<usize>,
    /// Target value(s) (flattened). Empty for unlabelled data.
    pub target: Vec<f64>,
    /// Shape of the target tensor (e.g. `[1]` for a class index).
    pub target_shape: Vec<usize>,
}

impl Sample {
    /// Attach a class index as a `[1]`-shaped target.
    pub fn with_class(mut self, class: usize) -> Self {
        self.target = vec![class as f64];
        self.target_shape = vec![1];
        self
    }
}

/// A dataset is an indexed collection of samples.
///
/// Implementations must be `Send + Sync` so [`DataLoader`](crate::DataLoader)
/// can read from multiple threads when parallel fetching is enabled.
pub trait Dataset: Send + Sync {
    /// The value produced for each index.
    type Item;

    /// Total number of samples in the dataset.
    fn len(&self) -> usize;

    /// Whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve the sample at position `index`.
    ///
    /// Fails with [`Error::IndexOutOfBounds`](marten_core::Error::IndexOutOfBounds)
    /// past the end, and with [`Error::Sample`](marten_core::Error::Sample)
    /// when the underlying file cannot be read or decoded.
    fn get(&self, index: usize) -> Result<Self::Item>;

    /// Optional human-readable name.
    fn name(&self) -> &str {
        "dataset"
    }
}
