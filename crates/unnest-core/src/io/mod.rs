//! I/O utilities.

mod progress;
mod scratch;

pub use progress::ProgressReader;
pub use progress::percent;
pub use scratch::Scratch;
