//! External decode tool integration
//!
//! Validation and remux both shell out to an ffmpeg-class binary behind the
//! [`MediaTool`] trait:
//!
//! - [`CliMediaTool`]: runs the external `ffmpeg` binary
//! - [`NoOpMediaTool`]: stub used when ffmpeg is not installed

mod cli;
mod noop;
mod traits;

pub use cli::CliMediaTool;
pub use noop::NoOpMediaTool;
pub use traits::{MediaTool, MediaToolCapabilities, ToolRun};
