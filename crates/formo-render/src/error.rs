pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] formo_core::Error),

    /// Provider-boundary failure: the built-in provider reports unparsable snapshots here,
    /// and external providers map their own transport or measurement failures into it.
    #[error("Geometry provider failure: {message}")]
    Geometry { message: String },
}
