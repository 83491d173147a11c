//! Format conversion through ImageMagick's `convert`

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use tokio::process::Command;

use super::{run, Converter, ToolError, DEFAULT_TIMEOUT};

/// Invokes `<program> <source> <dest>`; the output format follows from the
/// extension of `dest`.
#[derive(Debug, Clone)]
pub struct MagickConvert {
    program: String,
    timeout: Duration,
}

impl MagickConvert {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl Default for MagickConvert {
    fn default() -> Self {
        Self::new("convert", DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl Converter for MagickConvert {
    async fn convert(&self, source: &Path, dest: &Path) -> Result<(), ToolError> {
        let mut command = Command::new(&self.program);
        command.arg(source).arg(dest);
        run(command, self.timeout).await?;
        Ok(())
    }
}
