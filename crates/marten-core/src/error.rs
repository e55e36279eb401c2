use std::path::PathBuf;

/// All errors that can occur within marten.
///
/// Construction-time problems (bad arguments, unreadable tables) and
/// access-time problems (a sample that cannot be read or decoded) share this
/// single enum so callers can propagate them with `?`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading a file or directory failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The decoder rejected the bytes of an image file.
    #[error("failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// A label table could not be parsed.
    #[error("csv error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// A label table lacks one of the required columns.
    #[error("column {column:?} not found in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// A path or table argument has a shape that is not understood.
    #[error("unrecognized input format: {0}")]
    Format(String),

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Reading, decoding or transforming the sample at `index` failed.
    #[error("can not read image for sample {index}")]
    Sample {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    /// Index past the end of a dataset.
    #[error("index {index} out of bounds for dataset of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A label that is absent from the translation table.
    #[error("unknown label {0:?}")]
    UnknownLabel(String),

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }

    /// Wrap `self` as the cause of a failed access to sample `index`.
    pub fn at_sample(self, index: usize) -> Self {
        Error::Sample {
            index,
            source: Box::new(self),
        }
    }

    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

