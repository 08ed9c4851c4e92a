use std::fmt;

pub type GeoreferenceResult<T> = Result<T, GeoreferenceError>;

#[derive(Debug, Clone, PartialEq)]
pub enum GeoreferenceError {
    /// Malformed camera parameters, pixel array shape, or GPS metadata
    InvalidInput(String),
    /// Control points do not span a plane (count given)
    SingularControlPoints(usize),
}

impl fmt::Display for GeoreferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for GeoreferenceError {}
