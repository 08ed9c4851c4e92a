use crate::encode::EncodeError;
use crate::georef::GeoreferenceError;
use crate::raster::RasterError;
use crate::table::TableError;
use std::fmt;
use std::io;

pub type CogifyResult<T> = Result<T, CogifyError>;

#[derive(Debug)]
pub enum CogifyError {
    Georeference(GeoreferenceError),
    Encode(EncodeError),
    Table(TableError),
    Raster(RasterError),
    Io(io::Error),
    #[cfg(feature = "image")]
    Decode(image::ImageError),
    #[cfg(feature = "async")]
    AsyncJoinError(tokio::task::JoinError),
}

impl fmt::Display for CogifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for CogifyError {}

impl From<GeoreferenceError> for CogifyError {
    fn from(e: GeoreferenceError) -> Self {
        CogifyError::Georeference(e)
    }
}

impl From<EncodeError> for CogifyError {
    fn from(e: EncodeError) -> Self {
        CogifyError::Encode(e)
    }
}

impl From<TableError> for CogifyError {
    fn from(e: TableError) -> Self {
        CogifyError::Table(e)
    }
}

impl From<RasterError> for CogifyError {
    fn from(e: RasterError) -> Self {
        CogifyError::Raster(e)
    }
}

impl From<io::Error> for CogifyError {
    fn from(e: io::Error) -> Self {
        CogifyError::Io(e)
    }
}

#[cfg(feature = "image")]
impl From<image::ImageError> for CogifyError {
    fn from(e: image::ImageError) -> Self {
        CogifyError::Decode(e)
    }
}

#[cfg(feature = "async")]
impl From<tokio::task::JoinError> for CogifyError {
    fn from(e: tokio::task::JoinError) -> Self {
        CogifyError::AsyncJoinError(e)
    }
}
