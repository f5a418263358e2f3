#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid polygon header: {0}")]
    InvalidPolygonHeader(String),

    #[error("Malformed property name: {0:?}")]
    MalformedPropertyName(String),

    #[error("Mismatched count of {0} properties: expected {1}, but got {2}")]
    MismatchedPropertyCount(String, usize, usize),

    #[error("Missing polygon element: {0:?}")]
    MissingPolygonElement(String),

    #[error("Missing polygon property: {0:?}")]
    MissingPolygonProperty(String),

    #[error("Tensor error: {0}")]
    Tensor(String),

    #[error("Unknown scaling activation: {0:?}")]
    UnknownScalingActivation(String),

    #[error("Unsupported polygon format: {0}")]
    UnsupportedPolygonFormat(String),

    #[error("Unsupported SH degree for the viewer variant: {0} (no more than 3)")]
    UnsupportedViewerDegree(u32),

    #[error("Validation Error: {0} should be {1}")]
    Validation(String, String),
}
