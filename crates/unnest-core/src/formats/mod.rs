//! Archive format detection, naming rules and the built-in decoders.

pub mod common;
pub mod compression;
pub mod detect;
mod format;
pub mod native;
pub mod sevenz;
pub mod split;
pub mod tar;
pub mod traits;
pub mod zip;

// Re-export main types for convenience
pub use format::Format;
pub use format::expected_formats;
pub use native::NativeBackend;
pub use traits::ArchiveBackend;
pub use traits::OpenedArchive;
