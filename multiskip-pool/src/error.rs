#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Out of memory: size class {class} cannot grow by {bytes} bytes")]
    OutOfMemory { class: usize, bytes: usize },

    #[error("Unknown size class: {0}")]
    UnknownClass(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
