use thiserror::Error;

/// Errors reported by network construction, inference, training and persistence.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{what} has {actual} values but the layer has {expected} neurons")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("layer `{0}` already exists")]
    DuplicateLayerName(String),

    #[error("network has no layers")]
    EmptyTopology,

    #[error("cannot append layer `{name}`: {reason}")]
    InvalidLayer { name: String, reason: &'static str },

    #[error("network has no layer {0}")]
    NoSuchLayer(usize),

    #[error("last layer is not an output layer")]
    MissingOutputLayer,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt network artifact: {0}")]
    CorruptArtifact(String),
}

// Artifacts are always encoded to and decoded from memory, so any bincode
// failure (including a short read) means the bytes are bad.
impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::CorruptArtifact(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
