//! Fixed-offset repair of decrypted Ogg Vorbis headers.
//!
//! The origin server substitutes placeholder bytes into the first page and
//! the identification header. Restoring them is a byte patch at known
//! offsets, not a general Ogg parser.

use core_async::fs::OpenOptions;
use core_async::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use std::io::SeekFrom;
use std::path::Path;

use crate::error::{PlaybackError, Result};

const OGG_SYNC: &[u8] = b"OggS";
const ZEROES: &[u8] = &[0u8; 10];

/// `(offset, bytes)` writes that rebuild a minimal valid header.
const HEADER_PATCHES: &[(usize, &[u8])] = &[
    // First page: capture pattern and cleared granule position
    (0, OGG_SYNC),
    (6, ZEROES),
    // Identification packet: type, "vorbis"
    (26, b"\x01\x1e\x01vorbis"),
    // Channels
    (39, b"\x02"),
    // Sample rate (44100 LE)
    (40, b"\x44\xac\x00\x00"),
    // Nominal bitrate (320000 LE)
    (48, b"\x00\xe2\x04\x00"),
    // Block sizes and framing
    (56, b"\xb8\x01"),
    // Next page boundary
    (58, OGG_SYNC),
    (62, ZEROES),
];

/// Smallest file the patches fit into.
pub const REPAIR_HEADER_LEN: usize = 72;

/// Applies the header patches to the leading bytes of a container.
pub fn repair_header(header: &mut [u8]) -> Result<()> {
    if header.len() < REPAIR_HEADER_LEN {
        return Err(PlaybackError::Repair(format!(
            "container is {} bytes, header needs {}",
            header.len(),
            REPAIR_HEADER_LEN
        )));
    }

    for (offset, bytes) in HEADER_PATCHES {
        header[*offset..*offset + bytes.len()].copy_from_slice(bytes);
    }
    Ok(())
}

/// Repairs the header of the file at `path` in place.
pub async fn repair_file(path: &Path) -> Result<()> {
    let io_err = |e: std::io::Error| PlaybackError::io(path, e);

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .await
        .map_err(io_err)?;

    let len = file.metadata().await.map_err(io_err)?.len();
    if len < REPAIR_HEADER_LEN as u64 {
        return Err(PlaybackError::Repair(format!(
            "container is {} bytes, header needs {}",
            len, REPAIR_HEADER_LEN
        )));
    }

    let mut header = [0u8; REPAIR_HEADER_LEN];
    file.read_exact(&mut header).await.map_err(io_err)?;
    repair_header(&mut header)?;

    file.seek(SeekFrom::Start(0)).await.map_err(io_err)?;
    file.write_all(&header).await.map_err(io_err)?;
    file.flush().await.map_err(io_err)?;
    file.sync_all().await.map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patches_land_at_fixed_offsets() {
        let mut data = vec![0xffu8; 100];
        repair_header(&mut data).unwrap();

        assert_eq!(&data[0..4], b"OggS");
        assert_eq!(&data[4..6], &[0xff, 0xff]);
        assert_eq!(&data[6..16], &[0u8; 10]);
        assert_eq!(&data[26..35], b"\x01\x1e\x01vorbis");
        assert_eq!(data[39], 0x02);
        assert_eq!(&data[40..44], &[0x44, 0xac, 0x00, 0x00]);
        assert_eq!(&data[48..52], &[0x00, 0xe2, 0x04, 0x00]);
        assert_eq!(&data[56..58], &[0xb8, 0x01]);
        assert_eq!(&data[58..62], b"OggS");
        assert_eq!(&data[62..72], &[0u8; 10]);
        assert!(data[72..].iter().all(|b| *b == 0xff));
    }

    #[test]
    fn test_short_header_is_rejected() {
        let mut data = vec![0u8; REPAIR_HEADER_LEN - 1];
        assert!(matches!(
            repair_header(&mut data),
            Err(PlaybackError::Repair(_))
        ));
    }

    #[tokio::test]
    async fn test_repair_file_keeps_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.decrypted.ogg");
        let original: Vec<u8> = (0..500u32).map(|i| (i % 200) as u8 + 1).collect();
        std::fs::write(&path, &original).unwrap();

        repair_file(&path).await.unwrap();

        let repaired = std::fs::read(&path).unwrap();
        assert_eq!(repaired.len(), original.len());
        assert_eq!(&repaired[..4], b"OggS");
        assert_eq!(&repaired[72..], &original[72..]);
    }

    #[tokio::test]
    async fn test_repair_file_rejects_truncated_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.ogg");
        std::fs::write(&path, b"OggS").unwrap();

        let err = repair_file(&path).await.unwrap_err();
        assert!(matches!(err, PlaybackError::Repair(_)));
        assert_eq!(std::fs::read(&path).unwrap(), b"OggS");
    }
}
