pub mod byte_order;
pub mod compression;
pub mod error;
pub mod header;
pub mod sample_format;
pub mod samples;
pub mod sdr;

pub use byte_order::*;
pub use compression::*;
pub use error::*;
pub use header::*;
pub use sample_format::*;
pub use samples::*;
pub use sdr::*;
