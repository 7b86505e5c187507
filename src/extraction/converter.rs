//! External PDF-to-text converter invocation.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use super::ExtractionError;

/// Synchronous converter turning a binary document into plain text.
pub trait TextConverter: Send + Sync {
    /// Convert raw document bytes to text.
    fn convert(&self, document: &[u8]) -> Result<String, ExtractionError>;
}

/// Runs a `pdftotext`-compatible executable as `<program> <input> -`.
///
/// The input is written to a temporary file owned by the call; the file is removed when
/// the call returns, whatever the outcome.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
    temp_dir: Option<PathBuf>,
}

impl CommandConverter {
    /// Converter using the given executable and the system temp dir.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: vec!["-enc".into(), "UTF-8".into()],
            temp_dir: None,
        }
    }

    /// Replace the arguments passed before the input path.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Place temporary inputs in `dir` instead of the system temp dir.
    pub fn with_temp_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.temp_dir = dir;
        self
    }

    fn write_input(&self, document: &[u8]) -> Result<tempfile::NamedTempFile, ExtractionError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("iadb-").suffix(".pdf");
        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(ExtractionError::TempFile)?;
        file.write_all(document).map_err(ExtractionError::TempFile)?;
        file.flush().map_err(ExtractionError::TempFile)?;
        Ok(file)
    }
}

impl TextConverter for CommandConverter {
    fn convert(&self, document: &[u8]) -> Result<String, ExtractionError> {
        let input = self.write_input(document)?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(input.path())
            .arg("-")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ExtractionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExtractionError::ConverterFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
