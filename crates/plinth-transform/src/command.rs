//! External command invocation for transformers backed by other tools.
//!
//! Arguments may contain `{input}` and `{output}` placeholders, replaced by
//! temporary file paths holding the asset and receiving the result.

use std::fs;
use std::path::Path;
use std::process::Command;

use crate::traits::{Asset, TransformError};

/// A configured external tool, e.g. `["esbuild", "{input}", "--bundle", "--outfile={output}"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
}

impl ExternalCommand {
    /// Build from an argv list; an empty list means "not configured".
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run with the given input and output paths substituted.
    pub fn run(&self, input: &Path, output: &Path, cwd: Option<&Path>) -> Result<(), TransformError> {
        let input = input.display().to_string();
        let output = output.display().to_string();
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace("{input}", &input).replace("{output}", &output))
            .collect();

        let mut command = Command::new(&self.program);
        command.args(&args);
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }

        tracing::debug!("Running {} {}", self.program, args.join(" "));
        let result = command.output().map_err(|e| self.error(e.to_string()))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(self.error(format!("{}: {}", result.status, stderr.trim())));
        }

        Ok(())
    }

    /// Feed an asset through the command and return the produced bytes.
    ///
    /// `source` is the original file when the tool needs to resolve sibling
    /// files (imports); otherwise the asset contents are written to a
    /// temporary file.
    pub fn transform(
        &self,
        asset: &Asset,
        source: Option<&Path>,
        output_extension: &str,
    ) -> Result<Vec<u8>, TransformError> {
        let scratch = tempfile::tempdir()?;
        let file_name = asset
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "input".into());

        let input = match source {
            Some(path) => path.to_path_buf(),
            None => {
                let input = scratch.path().join(&file_name);
                fs::write(&input, &asset.contents)?;
                input
            }
        };
        let output = scratch.path().join(format!("output.{}", output_extension));

        self.run(&input, &output, None)?;

        fs::read(&output).map_err(|e| self.error(format!("no output produced: {}", e)))
    }

    fn error(&self, message: String) -> TransformError {
        TransformError::Command {
            program: self.program.clone(),
            message,
        }
    }
}
