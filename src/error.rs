use image::ImageError;
use thiserror::Error;

use std::error::Error;
use std::fmt;
use std::io::Error as IOError;
use std::path::PathBuf;

pub type LprResult<T> = Result<T, LprError>;

#[derive(Debug)]
pub struct LprError(LprErrorKind);

#[derive(Debug, Error)]
pub enum LprErrorKind {
    #[error(transparent)]
    IOError(#[from] IOError),

    #[error(transparent)]
    ImageError(#[from] ImageError),

    #[error("can not decode {path:?}: {source}")]
    DecodeError {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    #[error("image {0:?} has no pixels")]
    EmptyImage(PathBuf),

    #[error("no `word<N>` position marker in file name {0:?}")]
    MissingPosition(String),

    #[error("invalid position {value:?} in file name {filename:?}, expected an integer >= 1")]
    InvalidPosition { filename: String, value: String },

    #[error("size mismatch: image is {image:?}, template is {template:?}")]
    SizeMismatch {
        image: (u32, u32),
        template: (u32, u32),
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unknown match method {0:?}, expected `ccoeff-normed` or `ccorr-normed`")]
    UnknownMethod(String),

    #[error("no template image could be loaded from {0:?}")]
    NoTemplates(PathBuf),
}

impl LprError {
    pub fn kind(&self) -> &LprErrorKind {
        &self.0
    }
}

impl<T> From<T> for LprError
where T: Into<LprErrorKind>
{
    fn from(e: T) -> Self {
        Self(e.into())
    }
}

impl fmt::Display for LprError {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind().fmt(f)
    }
}

impl Error for LprError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.kind().source()
    }
}
