use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("TOML Parsing Error: {0}")]
    TomlParse(String),

    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File Read Error: Path '{path}', Error: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File Write Error: Path '{path}', Error: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory Creation Error: Path '{path}', Error: {source}")]
    DirCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),
}

impl From<walkdir::Error> for AppError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
        match err.into_io_error() {
            Some(source) => AppError::FileRead { path, source },
            None => AppError::Io(std::io::Error::other(format!(
                "Filesystem loop detected at '{}'",
                path.display()
            ))),
        }
    }
}

impl From<std::str::Utf8Error> for AppError {
    fn from(err: std::str::Utf8Error) -> Self {
        AppError::Config(format!("UTF-8 decoding error in embedded data: {}", err))
    }
}
