mod cbc;
mod config;
mod decryptor;
mod error;
mod guess;
pub mod oracle;
mod recovery;
pub mod server;

pub use cbc::{decrypt_aes_128_cbc, encrypt_aes_128_cbc, pkcs7_pad, pkcs7_unpad, CbcError};
pub use config::{AttackConfig, ServerConfig};
pub use decryptor::{decrypt_concurrently, PaddingOracleAttack};
pub use error::{Error, Result};
pub use guess::{guesses_from, is_plausible, next_guess, GUESS_LIMIT};
pub use oracle::{Oracle, OracleClient, Verdict};
pub use recovery::recover_block;

pub const BLOCK_SIZE: usize = 16;

pub type Block = [u8; BLOCK_SIZE];
