use thiserror::Error;

use crate::view::render_pass::BitmapId;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("cannot allocate a {width}x{height} bitmap")]
    Allocation { width: u32, height: u32 },
    #[error("unknown bitmap {0:?}")]
    UnknownBitmap(BitmapId),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] ::image::ImageError),
    #[error(transparent)]
    Svg(#[from] resvg::usvg::Error),
    #[error("svg has an empty canvas")]
    EmptySvg,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
