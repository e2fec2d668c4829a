//! Библиотека формата rfcap
//!
//! Эталонная реализация формата rfcap v1 для записи сырых I/Q выборок SDR:
//! 48-байтный заголовок, полезная нагрузка в объявленном порядке байт,
//! опциональная 12-битная nibble-упаковка и внешний слой LZ4.
//!
//! # Быстрый старт
//!
//! ```no_run
//! use rfcap_core::{RfcapReader, RfcapWriter};
//! use rfcap_types::{Header, SampleFormat, Samples};
//! use std::fs::File;
//!
//! let header = Header::new(1_602_000_000.0, 2_000_000, SampleFormat::I16);
//! let mut writer = RfcapWriter::new(File::create("signal.rfcap")?, header)?;
//! writer.write(&Samples::I16(vec![[0, 0]; 1024]))?;
//! writer.finish()?;
//!
//! let mut reader = RfcapReader::new(File::open("signal.rfcap")?)?;
//! let mut buf = Samples::new(reader.header().sample_format, 1024)?;
//! let n = reader.read(&mut buf)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod binary;
pub mod compression;
pub mod format;
pub mod pack_stream;
pub mod packer;
pub mod payload;
pub mod sdr;
pub mod stream;
#[cfg(all(target_os = "linux", feature = "uring"))]
pub mod uring;

pub use binary::*;
pub use compression::*;
pub use format::*;
pub use pack_stream::*;
pub use packer::*;
pub use payload::*;
pub use sdr::*;
pub use stream::*;
#[cfg(all(target_os = "linux", feature = "uring"))]
pub use uring::*;

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        assert_eq!(HEADER_SIZE, 48);
        assert_eq!(rfcap_types::Magic::VERSION_1.0, *b"RFCAP1");
        assert!(!VERSION.is_empty());
    }
}
