use crate::Compression;
#[cfg(feature = "zstd")]
use crate::error::ErrorKind;
use crate::error::Result;
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};
#[cfg(feature = "xz")]
use xz2::{read::XzDecoder, write::XzEncoder};

impl Compression {
    /// Stream-decode `reader`.
    ///
    /// Corrupt input surfaces as I/O errors from the returned reader.
    pub fn wrap_reader<'a, R: Read + 'a>(self, reader: R) -> Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Self::None => Box::new(reader),
            Self::Bzip2 => Box::new(BzDecoder::new(reader)),
            Self::Gzip => Box::new(GzDecoder::new(reader)),
            #[cfg(feature = "xz")]
            Self::Xz => Box::new(XzDecoder::new(reader)),
            #[cfg(feature = "zstd")]
            Self::Zstd => Box::new(zstd::Decoder::new(reader).map_err(|_| ErrorKind::Codec(self))?),
        })
    }

    /// Stream-encode into `writer`. The stream is finished when the returned
    /// writer is dropped.
    ///
    /// Only archive fixtures are ever written, so the fastest levels are used.
    pub fn wrap_writer<'a, W: Write + 'a>(self, writer: W) -> Result<Box<dyn Write + 'a>> {
        Ok(match self {
            Self::None => Box::new(writer),
            Self::Bzip2 => Box::new(BzEncoder::new(writer, bzip2::Compression::fast())),
            Self::Gzip => Box::new(GzEncoder::new(writer, flate2::Compression::fast())),
            #[cfg(feature = "xz")]
            Self::Xz => Box::new(XzEncoder::new(writer, 1)),
            #[cfg(feature = "zstd")]
            Self::Zstd => Box::new(zstd::Encoder::new(writer, 1).map_err(|_| ErrorKind::Codec(self))?.auto_finish()),
        })
    }
}
