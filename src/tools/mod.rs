//! External programs doing the actual image work.
//!
//! Both adapters are thin: they build a command line, run it under a timeout
//! and interpret the exit status (and, for the extractor, stdout). Nothing is
//! retried here; the scan simply tries again on its next pass.

use std::{
    io,
    num::ParseFloatError,
    path::Path,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::{process::Command, time};
use tracing::trace;

mod exiftool;
mod magick;
pub use exiftool::ExifTool;
pub use magick::MagickConvert;

/// Upper bound for a single tool invocation unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// A position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("`{program}` did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    #[error("unexpected output from `{program}`: {reason}")]
    Output { program: String, reason: String },

    #[error("invalid {field} '{value}': {source}")]
    Coordinate {
        field: &'static str,
        value: String,
        #[source]
        source: ParseFloatError,
    },
}

/// Turns any image into the canonical format.
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(&self, source: &Path, dest: &Path) -> Result<(), ToolError>;
}

/// Reads GPS coordinates from an image.
///
/// `Ok(None)` means the tool ran fine but the image carries no position.
#[async_trait]
pub trait LocationExtractor: Send + Sync {
    async fn extract_location(&self, path: &Path) -> Result<Option<Coordinates>, ToolError>;
}

/// Run `command` to completion and hand back its stdout.
///
/// The child is killed if it outlives `timeout`.
pub(crate) async fn run(mut command: Command, timeout: Duration) -> Result<Vec<u8>, ToolError> {
    let program = command
        .as_std()
        .get_program()
        .to_string_lossy()
        .into_owned();
    command.stdin(Stdio::null()).kill_on_drop(true);
    trace!("Running {:?}", command.as_std());

    let output = match time::timeout(timeout, command.output()).await {
        Ok(result) => result.map_err(|source| ToolError::Spawn {
            program: program.clone(),
            source,
        })?,
        Err(_) => return Err(ToolError::TimedOut { program, timeout }),
    };

    if !output.status.success() {
        return Err(ToolError::Failed {
            program,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output.stdout)
}
