//! Recursive archive unpacking engine.
//!
//! `unnest-core` takes a file that may be a plain archive, an encrypted
//! archive, an archive hiding behind an unrelated extension, one volume of a
//! split set, or a container nested inside other containers, and reduces it
//! to its final non-archive content inside an output directory.
//!
//! The byte-level decoding is delegated to an [`ArchiveBackend`]. The crate
//! itself decides what to recurse into, which password to try, which
//! strategy to use and when to stop.
//!
//! # Examples
//!
//! ```no_run
//! use unnest_core::Settings;
//! use unnest_core::unpack;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::default().with_passwords(["secret"]);
//! let report = unpack("bundle.zip", "bundle_Unpacked", &settings)?;
//! println!("Extracted {} archives", report.archives_extracted);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod batch;
pub mod config;
pub mod error;
pub mod formats;
pub mod io;
pub mod password;
pub mod placement;
pub mod policy;
pub mod report;
pub mod session;
pub mod strategy;
#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;

// Re-export main API types
pub use api::unpack;
pub use api::unpack_with_reporter;
pub use config::Settings;
pub use error::ExtractionError;
pub use error::Result;
pub use formats::ArchiveBackend;
pub use formats::Format;
pub use formats::NativeBackend;
pub use formats::OpenedArchive;
pub use password::PasswordSequencer;
pub use policy::ArchivePolicy;
pub use policy::Classification;
pub use report::ChannelReporter;
pub use report::MemoryReporter;
pub use report::NoopReporter;
pub use report::Reporter;
pub use report::SessionEvent;
pub use report::SessionReport;
pub use session::MAX_DEPTH;
pub use session::Unpacker;
