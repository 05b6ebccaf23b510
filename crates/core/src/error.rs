pub type Result<T> = eyre::Result<T>;

#[derive(Debug, thiserror::Error)]
pub enum ClamError {
    #[error("daemon IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("scan aborted by daemon: {0}")]
    Aborted(String),
}
