// AES-128-CBC with PKCS#7 padding, as used by the oracle we attack.
use crate::{Block, BLOCK_SIZE};

use aes::{
    cipher::{BlockDecrypt, BlockEncrypt, KeyInit},
    Aes128,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CbcError {
    #[error("ciphertext length {0} is not a positive multiple of {}", BLOCK_SIZE)]
    InvalidLength(usize),
    #[error("invalid pkcs7 padding")]
    InvalidPadding,
}

/// Pad `bytes` to a multiple of `block_size`. A zero block size leaves the
/// input unpadded.
pub fn pkcs7_pad(bytes: &[u8], block_size: u8) -> Vec<u8> {
    if block_size == 0 {
        return bytes.to_vec();
    }
    let n_pad = block_size - (bytes.len() % block_size as usize) as u8;
    let mut out = Vec::with_capacity(bytes.len() + n_pad as usize);
    out.extend_from_slice(bytes);
    out.resize(bytes.len() + n_pad as usize, n_pad);
    out
}

pub fn pkcs7_unpad(bytes: &mut Vec<u8>) -> Result<(), CbcError> {
    let n_pad = pkcs7_padding_len(bytes).ok_or(CbcError::InvalidPadding)?;
    bytes.truncate(bytes.len() - n_pad);
    Ok(())
}

/// Length of the PKCS#7 padding on `bytes`, if the padding is well formed.
pub(crate) fn pkcs7_padding_len(bytes: &[u8]) -> Option<usize> {
    let n_pad = *bytes.last()? as usize;
    if n_pad == 0 || n_pad > BLOCK_SIZE || n_pad > bytes.len() {
        return None;
    }
    let padded = &bytes[(bytes.len() - n_pad)..];
    padded
        .iter()
        .all(|&el| el as usize == n_pad)
        .then_some(n_pad)
}

pub fn encrypt_aes_128_cbc(plaintext: &[u8], key: &[u8; 16], iv: &Block) -> Vec<u8> {
    let cipher = Aes128::new(key.into());
    let padded = pkcs7_pad(plaintext, BLOCK_SIZE as u8);
    let mut ciphertext = Vec::with_capacity(padded.len());

    let mut last_block = *iv;
    for plaintext_block in padded.chunks_exact(BLOCK_SIZE) {
        let mut block = xor_blocks(&last_block, plaintext_block);
        cipher.encrypt_block((&mut block).into());
        ciphertext.extend_from_slice(&block);
        last_block = block;
    }
    ciphertext
}

pub fn decrypt_aes_128_cbc(
    ciphertext: &[u8],
    key: &[u8; 16],
    iv: &Block,
) -> Result<Vec<u8>, CbcError> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CbcError::InvalidLength(ciphertext.len()));
    }
    let cipher = Aes128::new(key.into());
    let mut message = Vec::with_capacity(ciphertext.len());

    let mut last_block = *iv;
    for ciphertext_block in ciphertext.chunks_exact(BLOCK_SIZE) {
        let mut block = [0u8; BLOCK_SIZE];
        block.copy_from_slice(ciphertext_block);
        cipher.decrypt_block((&mut block).into());
        message.extend_from_slice(&xor_blocks(&last_block, &block));
        last_block.copy_from_slice(ciphertext_block);
    }
    pkcs7_unpad(&mut message)?;
    Ok(message)
}

fn xor_blocks(a: &Block, b: &[u8]) -> Block {
    let mut out = *a;
    out.iter_mut().zip(b).for_each(|(x, y)| *x ^= y);
    out
}
