//! Streaming AES-128-CTR decryption of encrypted track containers.

use aes::Aes128;
use core_async::fs::File;
use core_async::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use ctr::cipher::{KeyIvInit, StreamCipher};
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::error::{PlaybackError, Result};

/// Fixed initialization vector of the upstream media protocol.
///
/// Shared by every track; the counter starts here and runs big-endian over
/// the full 128 bits.
pub const TRACK_IV: [u8; 16] = [
    0x72, 0xe0, 0x67, 0xfb, 0xdd, 0xcb, 0xcf, 0x77, 0xeb, 0xe8, 0xbc, 0x64, 0x3f, 0x63, 0x0d, 0x93,
];

/// Bytes read and decrypted per step.
pub const DECRYPT_CHUNK_SIZE: usize = 8 * 1024;

type TrackCipher = ctr::Ctr128BE<Aes128>;

/// A validated 16-byte track key.
#[derive(Clone)]
pub struct TrackKey([u8; 16]);

impl TrackKey {
    pub fn from_hex(track_id: &str, hex_key: &str) -> Result<Self> {
        let invalid = |reason: String| PlaybackError::InvalidKey {
            track_id: track_id.to_string(),
            reason,
        };

        let bytes = hex::decode(hex_key.trim()).map_err(|e| invalid(e.to_string()))?;
        let key: [u8; 16] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| invalid(format!("expected 16 bytes, got {}", b.len())))?;
        Ok(Self(key))
    }

    fn cipher(&self) -> TrackCipher {
        TrackCipher::new(&self.0.into(), &TRACK_IV.into())
    }
}

impl fmt::Debug for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TrackKey([REDACTED])")
    }
}

/// In-memory form, used for small buffers and tests.
pub fn decrypt_in_place(key: &TrackKey, data: &mut [u8]) {
    key.cipher().apply_keystream(data);
}

/// Decrypts `source` into `destination` one chunk at a time.
///
/// Never holds more than [`DECRYPT_CHUNK_SIZE`] bytes of the file in memory.
pub async fn decrypt_file(key: &TrackKey, source: &Path, destination: &Path) -> Result<u64> {
    let mut input = File::open(source)
        .await
        .map_err(|e| PlaybackError::io(source, e))?;
    let output = File::create(destination)
        .await
        .map_err(|e| PlaybackError::io(destination, e))?;
    let mut output = BufWriter::new(output);

    let mut cipher = key.cipher();
    let mut buffer = vec![0u8; DECRYPT_CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let read = input
            .read(&mut buffer)
            .await
            .map_err(|e| PlaybackError::io(source, e))?;
        if read == 0 {
            break;
        }
        cipher.apply_keystream(&mut buffer[..read]);
        output
            .write_all(&buffer[..read])
            .await
            .map_err(|e| PlaybackError::io(destination, e))?;
        total += read as u64;
    }

    output
        .flush()
        .await
        .map_err(|e| PlaybackError::io(destination, e))?;

    debug!(bytes = total, "Decrypted track container");
    Ok(total)
}
