use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read scene source: {0}")]
    SourceReadError(String),

    #[error("Malformed scene description: {0}")]
    SceneParseError(String),

    #[error("Missing required field `{field}` in {context}")]
    MissingField { field: &'static str, context: String },

    #[error("Scene sources disagree on coordinate convention: {0} vs {1}")]
    ConventionConflict(String, String),

    #[error("Invalid normalization scale {0}, scale must be positive")]
    InvalidScale(f32),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Image {index}: {what} has {got} elements, expected {expected}")]
    ResolutionMismatch {
        index: usize,
        what: &'static str,
        got: usize,
        expected: usize,
    },

    #[error("Unsupported element type: {0}")]
    UnsupportedFormat(String),

    #[error("Image index {0} out of range, dataset has {1} slots")]
    SlotOutOfRange(usize, usize),

    #[error("Device error: {0}")]
    DeviceError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DatasetError>;
