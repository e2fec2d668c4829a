pub mod config;
pub mod device;
pub mod drain;
pub mod error;
pub mod record;
pub mod stats;

pub use config::*;
pub use device::*;
pub use drain::*;
pub use error::*;
pub use record::*;
pub use stats::*;
