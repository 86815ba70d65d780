use crate::Compression;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::io::{Read, Seek, SeekFrom};

/// Leading bytes identifying each format, checked in order.
const SIGNATURES: &[(&[u8], Compression)] = &[
    (b"BZh", Compression::Bzip2),
    (&[0x1F, 0x8B], Compression::Gzip),
    #[cfg(feature = "xz")]
    (&[0xFD, b'7', b'z', b'X', b'Z', 0x00], Compression::Xz),
    #[cfg(feature = "zstd")]
    (&[0x28, 0xB5, 0x2F, 0xFD], Compression::Zstd),
];
/// Enough for the longest signature.
const HEAD_LENGTH: u64 = 6;

impl Compression {
    /// Identify the format from the start of a payload. Anything unrecognised
    /// (including too little input) is taken to be uncompressed.
    #[must_use]
    pub fn detect(head: &[u8]) -> Self {
        SIGNATURES
            .iter()
            .find(|(signature, _)| head.starts_with(signature))
            .map_or(Self::None, |(_, compression)| *compression)
    }

    /// Identify the format of `source`, then rewind it to the start.
    pub fn sniff<R: Read + Seek>(source: &mut R) -> Result<Self> {
        let mut head = Vec::new();
        source.by_ref().take(HEAD_LENGTH).read_to_end(&mut head).or_raise(|| ErrorKind::Io)?;
        source.seek(SeekFrom::Start(0)).or_raise(|| ErrorKind::Io)?;
        Ok(Self::detect(&head))
    }
}
