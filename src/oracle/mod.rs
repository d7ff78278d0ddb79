// Padding oracles: anything that can tell us whether a two-block ciphertext
// decrypts to correctly padded plaintext.
mod client;
pub mod wire;

pub use client::OracleClient;

use crate::{Block, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid,
    /// The reply could not be understood. Carries no information about the
    /// padding.
    Malformed,
}

#[allow(async_fn_in_trait)]
pub trait Oracle {
    /// Submit `forged || following` and report whether it decrypts to valid
    /// padding. Errors are transport failures and end the attack.
    async fn query(&mut self, forged: &Block, following: &Block) -> Result<Verdict>;
}
