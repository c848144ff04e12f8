pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Markup syntax error: {0}")]
    Syntax(#[from] roxmltree::Error),

    #[error("No root <svg> element found in template markup")]
    MissingRoot,
}
