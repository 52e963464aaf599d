#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Model(#[from] shoal_core::Error),

    #[error(transparent)]
    Layout(#[from] narwhal::Error),

    #[error("invalid configuration at `{key}`: {message}")]
    Config { key: String, message: String },
}

impl Error {
    pub(crate) fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            key: key.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
