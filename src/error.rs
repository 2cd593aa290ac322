#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The node allocator refused a slot; the list is unchanged.
    #[error("Allocation failed: {0}")]
    OutOfMemory(#[from] multiskip_pool::Error),

    #[error("Record not found")]
    NotFound,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn test_allocation_error_message() {
        let oom = Error::from(multiskip_pool::Error::OutOfMemory { class: 2, bytes: 64 });
        assert_eq!(
            oom.to_string(),
            "Allocation failed: Out of memory: size class 2 cannot grow by 64 bytes"
        );

        let unknown = Error::from(multiskip_pool::Error::UnknownClass(9));
        assert_eq!(unknown.to_string(), "Allocation failed: Unknown size class: 9");
    }
}
