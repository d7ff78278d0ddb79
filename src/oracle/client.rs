use super::wire::{encode_request, parse_verdict, REPLY_LEN};
use crate::{Block, Oracle, Result, Verdict, BLOCK_SIZE};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpStream, ToSocketAddrs},
};
use tracing::{debug, info};

use std::{future::Future, io, time::Duration};

/// A padding oracle reached over one persistent TCP connection.
#[derive(Debug)]
pub struct OracleClient {
    stream: TcpStream,
    timeout: Duration,
    queries: u64,
}

impl OracleClient {
    pub async fn connect(address: impl ToSocketAddrs, timeout: Duration) -> Result<Self> {
        let stream = within(timeout, TcpStream::connect(address)).await?;
        if let Ok(peer) = stream.peer_addr() {
            info!(%peer, "connected to padding oracle");
        }
        Ok(Self {
            stream,
            timeout,
            queries: 0,
        })
    }

    /// Send a whole ciphertext to the oracle and wait for its verdict.
    pub async fn send(&mut self, ciphertext: &[u8]) -> Result<Verdict> {
        let request = encode_request(ciphertext)?;
        within(self.timeout, self.stream.write_all(&request)).await?;

        // A reply may be the verdict byte alone.
        let mut reply = [0u8; REPLY_LEN];
        let n = within(self.timeout, self.stream.read(&mut reply)).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "oracle closed the connection without answering",
            )
            .into());
        }
        self.queries += 1;

        let verdict = parse_verdict(&reply[..n]);
        if verdict == Verdict::Malformed {
            debug!(reply = ?&reply[..n], "oracle sent a malformed reply");
        }
        Ok(verdict)
    }

    pub fn queries(&self) -> u64 {
        self.queries
    }

    pub async fn disconnect(mut self) -> Result<()> {
        self.stream.shutdown().await?;
        info!(queries = self.queries, "disconnected from padding oracle");
        Ok(())
    }
}

impl Oracle for OracleClient {
    async fn query(&mut self, forged: &Block, following: &Block) -> Result<Verdict> {
        let mut ciphertext = [0u8; 2 * BLOCK_SIZE];
        ciphertext[..BLOCK_SIZE].copy_from_slice(forged);
        ciphertext[BLOCK_SIZE..].copy_from_slice(following);
        self.send(&ciphertext).await
    }
}

// A silent oracle must not stall the attack forever, so every round-trip is
// bounded and running out of time is reported as an I/O error.
async fn within<T, F>(timeout: Duration, fut: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(res) => res,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("no answer from oracle within {timeout:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{server::spawn_server, server::PaddingOracleServer, Error, PaddingOracleAttack};

    use tokio::net::TcpListener;

    use std::net::SocketAddr;

    const TIMEOUT: Duration = Duration::from_secs(5);
    const KEY: [u8; 16] = *b"YELLOW SUBMARINE";

    // Answers every two-block request on one connection with `reply`.
    async fn spawn_fixed_reply_oracle(reply: &'static [u8]) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2 + 2 * BLOCK_SIZE];
            while stream.read_exact(&mut request).await.is_ok() {
                if stream.write_all(reply).await.is_err() {
                    break;
                }
            }
        });
        addr
    }

    #[tokio::test]
    async fn send_returns_valid_for_well_padded_ciphertext() {
        let addr = spawn_server("127.0.0.1:0", PaddingOracleServer::new(KEY))
            .await
            .unwrap();
        let iv = [7u8; 16];
        let body = crate::encrypt_aes_128_cbc(b"hi", &KEY, &iv);
        let ciphertext = [iv.as_slice(), body.as_slice()].concat();
        let mut client = OracleClient::connect(addr, TIMEOUT).await.unwrap();

        let verdict = client.send(&ciphertext).await.unwrap();

        assert_eq!(verdict, Verdict::Valid);
        assert_eq!(client.queries(), 1);
    }

    #[tokio::test]
    async fn query_returns_invalid_for_bad_padding() {
        let addr = spawn_server("127.0.0.1:0", PaddingOracleServer::new(KEY))
            .await
            .unwrap();
        let iv = [7u8; 16];
        let block: Block = crate::encrypt_aes_128_cbc(b"hi", &KEY, &iv)
            .try_into()
            .unwrap();
        // Flipping the last IV byte turns the 0x0E padding into 0x0F.
        let mut forged = iv;
        forged[15] ^= 0x0E ^ 0x0F;
        let mut client = OracleClient::connect(addr, TIMEOUT).await.unwrap();

        let verdict = client.query(&forged, &block).await.unwrap();

        assert_eq!(verdict, Verdict::Invalid);
    }

    #[tokio::test]
    async fn send_times_out_when_oracle_is_silent() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        let mut client = OracleClient::connect(addr, Duration::from_millis(100))
            .await
            .unwrap();

        let res = client.send(&[0u8; 32]).await;

        match res {
            Err(Error::OracleTransport(e)) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
            other => panic!("expected a timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connect_fails_when_nothing_is_listening() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let res = OracleClient::connect(addr, TIMEOUT).await;

        assert!(matches!(res, Err(Error::OracleTransport(_))));
    }

    #[tokio::test]
    async fn disconnect_closes_connection() {
        let addr = spawn_server("127.0.0.1:0", PaddingOracleServer::new(KEY))
            .await
            .unwrap();
        let client = OracleClient::connect(addr, TIMEOUT).await.unwrap();

        assert!(client.disconnect().await.is_ok());
    }

    #[tokio::test]
    async fn send_accepts_single_byte_reply() {
        let addr = spawn_fixed_reply_oracle(b"1").await;
        let mut client = OracleClient::connect(addr, Duration::from_millis(500))
            .await
            .unwrap();

        let verdict = client.send(&[0u8; 32]).await.unwrap();

        assert_eq!(verdict, Verdict::Valid);
        assert_eq!(client.queries(), 1);
    }

    #[tokio::test]
    async fn send_fails_when_oracle_hangs_up_without_answering() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 34];
            stream.read_exact(&mut request).await.unwrap();
        });
        let mut client = OracleClient::connect(addr, TIMEOUT).await.unwrap();

        let res = client.send(&[0u8; 32]).await;

        match res {
            Err(Error::OracleTransport(e)) => {
                assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof)
            }
            other => panic!("expected end of stream, got {other:?}"),
        }
        assert_eq!(client.queries(), 0);
    }

    #[tokio::test]
    async fn decrypt_aborts_when_oracle_reply_is_malformed() {
        let addr = spawn_fixed_reply_oracle(b"-1").await;
        let client = OracleClient::connect(addr, TIMEOUT).await.unwrap();
        let mut attack = PaddingOracleAttack::new(client);

        let res = attack.decrypt(&[0u8; 48]).await;

        assert!(matches!(
            res,
            Err(Error::MalformedVerdict {
                block: 1,
                position: 15
            })
        ));
        assert_eq!(attack.oracle().queries(), 1);
    }
}
