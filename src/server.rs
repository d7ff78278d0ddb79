// A padding oracle service speaking the same protocol as the one we attack.
//
// It holds an AES-128 key, treats the first block of each request as the IV
// and only ever tells the client whether the rest decrypts to valid padding.
use crate::{
    decrypt_aes_128_cbc,
    oracle::wire::{encode_reply, REQUEST_TERMINATOR},
    Block, Verdict, BLOCK_SIZE,
};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream, ToSocketAddrs},
};
use tracing::{debug, info, warn};

use std::{io, net::SocketAddr, sync::Arc};

/// Bind `address` and serve `server` in the background. Returns the address
/// actually bound, so port 0 can be used to pick a free port.
pub async fn spawn_server(
    address: impl ToSocketAddrs,
    server: PaddingOracleServer,
) -> io::Result<SocketAddr> {
    let listener = TcpListener::bind(address).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = server.serve(listener).await {
            warn!(error = %e, "padding oracle server stopped");
        }
    });
    Ok(addr)
}

#[derive(Debug, Clone)]
pub struct PaddingOracleServer {
    key: [u8; 16],
}

impl PaddingOracleServer {
    pub fn new(key: [u8; 16]) -> Self {
        Self { key }
    }

    pub async fn serve(self, listener: TcpListener) -> io::Result<()> {
        info!(addr = %listener.local_addr()?, "padding oracle listening");
        let server = Arc::new(self);
        loop {
            let (stream, peer) = listener.accept().await?;
            debug!(%peer, "client connected");
            let server = server.clone();
            tokio::spawn(async move {
                if let Err(e) = server.handle_connection(stream).await {
                    debug!(%peer, error = %e, "connection closed with error");
                }
            });
        }
    }

    /// Whether `ciphertext` (IV first) decrypts to correctly padded plaintext.
    pub fn judge(&self, ciphertext: &[u8]) -> Verdict {
        if ciphertext.len() < 2 * BLOCK_SIZE || ciphertext.len() % BLOCK_SIZE != 0 {
            return Verdict::Malformed;
        }
        let (iv, body) = ciphertext.split_at(BLOCK_SIZE);
        let mut iv_block: Block = [0; BLOCK_SIZE];
        iv_block.copy_from_slice(iv);
        match decrypt_aes_128_cbc(body, &self.key, &iv_block) {
            Ok(_) => Verdict::Valid,
            Err(_) => Verdict::Invalid,
        }
    }

    async fn handle_connection(&self, mut stream: TcpStream) -> io::Result<()> {
        loop {
            let n_blocks = match stream.read_u8().await {
                Ok(n) => n as usize,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(e),
            };
            let mut ciphertext = vec![0u8; n_blocks * BLOCK_SIZE];
            stream.read_exact(&mut ciphertext).await?;
            let terminator = stream.read_u8().await?;

            let verdict = if terminator == REQUEST_TERMINATOR {
                self.judge(&ciphertext)
            } else {
                Verdict::Malformed
            };
            stream.write_all(&encode_reply(verdict)).await?;
        }
    }
}
