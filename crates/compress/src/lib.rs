//! Compression layers of package archives.
//!
//! Bottles are gzip-compressed tarballs, but archives cached under their
//! content hash carry no file extension, so the layer is recognised from the
//! payload itself ([`Compression::sniff()`]) and peeled off with a streaming
//! decoder ([`Compression::wrap_reader()`]).
//!
//! Bzip2 and gzip are always available; xz and zstd sit behind the `xz` and
//! `zstd` features.

mod codec;
mod detect;
pub mod error;

use derive_more::Display;

/// The compression wrapped around a tarball.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum Compression {
    /// A plain tarball.
    #[default]
    #[display("none")]
    None,
    #[display("bzip2")]
    Bzip2,
    #[display("gzip")]
    Gzip,
    #[cfg(feature = "xz")]
    #[display("xz")]
    Xz,
    #[cfg(feature = "zstd")]
    #[display("zstd")]
    Zstd,
}
