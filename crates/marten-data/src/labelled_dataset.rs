// LabelledDataset — images paired with class labels
//
// Two sources are understood:
//
//   1. A label table (`*.csv`) with an image path column and a label column,
//      by default `names` and `pseudo_labels`:
//
//        names,pseudo_labels
//        crops/0001.png,cluster_3
//        crops/0002.png,cluster_0
//
//      With an image root set, each entry is resolved as `root/<file name>`,
//      which lets a table written on one machine be used on another.
//
//   2. A directory whose immediate sub-directories are classes:
//
//        root/
//          class_a/img_001.png
//          class_b/img_002.jpg
//
// Anything else is rejected with `Error::Format`. Raw labels are translated to
// dense indices through a `LabelTable`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use marten_core::{Error, Result};

use crate::config::LabelledDatasetConfig;
use crate::dataset::Dataset;
use crate::decoder::{read_and_decode, DefaultDecoder, ImageDecoder};
use crate::labels::LabelTable;
use crate::scan::list_images;
use crate::transform::{Identity, Transform};

/// Builder for [`LabelledDataset`].
pub struct LabelledDatasetBuilder {
    config: LabelledDatasetConfig,
    decoder: Arc<dyn ImageDecoder>,
}

impl LabelledDatasetBuilder {
    /// Create a builder for a label table or class directory.
    pub fn new<P: AsRef<Path>>(data_path: P) -> Self {
        Self::from_config(LabelledDatasetConfig::new(data_path.as_ref()))
    }

    fn from_config(config: LabelledDatasetConfig) -> Self {
        Self {
            config,
            decoder: Arc::new(DefaultDecoder),
        }
    }

    /// Resolve table entries against this directory.
    pub fn root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.config.root = Some(root.as_ref().to_path_buf());
        self
    }

    /// Header of the image path column.
    pub fn path_column(mut self, name: impl Into<String>) -> Self {
        self.config.path_column = name.into();
        self
    }

    /// Header of the label column.
    pub fn label_column(mut self, name: impl Into<String>) -> Self {
        self.config.label_column = name.into();
        self
    }

    /// Use a custom decoder instead of [`DefaultDecoder`].
    pub fn decoder<D: ImageDecoder + 'static>(mut self, decoder: D) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Read the table or directory and build the dataset.
    pub fn build(self) -> Result<LabelledDataset> {
        let data_path = &self.config.data_path;
        let (paths, labels) = if has_csv_extension(data_path) {
            read_table(&self.config)?
        } else if data_path.is_dir() {
            scan_class_dirs(data_path)?
        } else {
            return Err(Error::Format(format!(
                "the data path format isn't recognized: {}",
                data_path.display()
            )));
        };

        let table = LabelTable::from_labels(&labels);
        tracing::debug!(
            source = %data_path.display(),
            images = paths.len(),
            classes = table.len(),
            "labelled dataset built"
        );

        Ok(LabelledDataset {
            paths,
            labels,
            table,
            decoder: self.decoder,
            transform: Identity,
        })
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn column_index(headers: &csv::StringRecord, name: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| Error::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

/// Last `/`-separated component of a table entry.
fn file_name_of(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}

fn read_table(config: &LabelledDatasetConfig) -> Result<(Vec<PathBuf>, Vec<String>)> {
    let path = config.data_path.as_path();
    let csv_err = |e: csv::Error| Error::Csv {
        path: path.to_path_buf(),
        source: Box::new(e),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();
    let path_col = column_index(&headers, &config.path_column, path)?;
    let label_col = column_index(&headers, &config.label_column, path)?;

    let mut paths = Vec::new();
    let mut labels = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let entry = record.get(path_col).unwrap_or_default();
        let label = record.get(label_col).unwrap_or_default();
        let image = match &config.root {
            Some(root) => root.join(file_name_of(entry)),
            None => PathBuf::from(entry),
        };
        paths.push(image);
        labels.push(label.to_string());
    }
    Ok((paths, labels))
}

fn scan_class_dirs(dir: &Path) -> Result<(Vec<PathBuf>, Vec<String>)> {
    let mut classes = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                classes.push((name.to_string(), path));
            }
        }
    }
    classes.sort();

    let mut paths = Vec::new();
    let mut labels = Vec::new();
    for (name, class_dir) in classes {
        let images = list_images(&class_dir).map_err(|e| Error::io(&class_dir, e))?;
        labels.extend(std::iter::repeat(name).take(images.len()));
        paths.extend(images);
    }
    Ok((paths, labels))
}

/// Images with string labels translated to dense class indices.
pub struct LabelledDataset<T = Identity> {
    paths: Vec<PathBuf>,
    /// Raw label of each path.
    labels: Vec<String>,
    table: LabelTable,
    decoder: Arc<dyn ImageDecoder>,
    transform: T,
}

impl LabelledDataset {
    /// Convenience entry-point: `LabelledDataset::new(path)` returns a builder.
    pub fn new<P: AsRef<Path>>(data_path: P) -> LabelledDatasetBuilder {
        LabelledDatasetBuilder::new(data_path)
    }

    /// Build from a deserialized configuration.
    pub fn from_config(config: &LabelledDatasetConfig) -> Result<Self> {
        LabelledDatasetBuilder::from_config(config.clone()).build()
    }
}

impl<T> LabelledDataset<T> {
    /// Replace the post-decode transform.
    pub fn with_transform<U>(self, transform: U) -> LabelledDataset<U>
    where
        U: Transform<DynamicImage>,
    {
        LabelledDataset {
            paths: self.paths,
            labels: self.labels,
            table: self.table,
            decoder: self.decoder,
            transform,
        }
    }

    /// The label translation table.
    pub fn labels(&self) -> &LabelTable {
        &self.table
    }

    /// Number of distinct labels.
    pub fn num_classes(&self) -> usize {
        self.table.len()
    }

    /// Raw label of the i-th sample.
    pub fn raw_label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Class index of the i-th sample.
    pub fn label_of(&self, index: usize) -> Option<usize> {
        self.raw_label(index).and_then(|l| self.table.index_of(l))
    }

    /// File path of the i-th sample.
    pub fn path_of(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    /// Enumerated files, in index order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn load(&self, index: usize) -> Result<(DynamicImage, usize)> {
        let path = &self.paths[index];
        let raw = &self.labels[index];
        let label = self
            .table
            .index_of(raw)
            .ok_or_else(|| Error::UnknownLabel(raw.clone()))?;
        let image = read_and_decode(self.decoder.as_ref(), path)?;
        Ok((image, label))
    }
}

impl<T> Dataset for LabelledDataset<T>
where
    T: Transform<DynamicImage>,
{
    type Item = (T::Output, usize);

    fn len(&self) -> usize {
        self.paths.len()
    }

    fn get(&self, index: usize) -> Result<Self::Item> {
        if index >= self.paths.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.paths.len(),
            });
        }
        let (image, label) = self.load(index).map_err(|e| e.at_sample(index))?;
        Ok((self.transform.apply(image), label))
    }

    fn name(&self) -> &str {
        "LabelledDataset"
    }
}

impl<T> fmt::Debug for LabelledDataset<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelledDataset")
            .field("len", &self.paths.len())
            .field("classes", &self.table.names())
            .finish_non_exhaustive()
    }
}
