use crate::BLOCK_SIZE;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "invalid ciphertext length {len} (must be a multiple of block length {} \
         and at least two blocks)",
        BLOCK_SIZE
    )]
    InvalidCiphertextLength { len: usize },

    #[error("oracle transport failed: {0}")]
    OracleTransport(#[from] std::io::Error),

    /// The oracle answered, but not with a verdict we understand.
    #[error("malformed oracle reply while guessing byte {position} of block {block}")]
    MalformedVerdict { block: usize, position: usize },

    /// Backtracking emptied the discovered bytes of a block without success.
    #[error("attack failed: exhausted every guess for block {block}")]
    AttackExhausted { block: usize },

    #[error("invalid value for {var}: {reason}")]
    InvalidConfig { var: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_length_message_names_length() {
        let err = Error::InvalidCiphertextLength { len: 17 };

        assert_eq!(
            err.to_string(),
            "invalid ciphertext length 17 (must be a multiple of block length 16 \
             and at least two blocks)"
        );
    }

    #[test]
    fn exhausted_message_names_block() {
        let err = Error::AttackExhausted { block: 3 };

        assert_eq!(
            err.to_string(),
            "attack failed: exhausted every guess for block 3"
        );
    }

    #[test]
    fn io_errors_convert_to_transport_errors() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");

        let err: Error = io_err.into();

        assert!(matches!(err, Error::OracleTransport(_)));
        assert!(err.to_string().contains("reset"));
    }
}
