//! Async I/O traits and utilities.
//!
//! ```rust
//! use core_async::io::{AsyncRead, AsyncReadExt};
//!
//! async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<Vec<u8>> {
//!     let mut buffer = Vec::new();
//!     reader.read_to_end(&mut buffer).await?;
//!     Ok(buffer)
//! }
//! ```

pub use tokio::io::{
    AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt, BufReader,
    BufWriter, ReadBuf,
};
