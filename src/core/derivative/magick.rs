//! ImageMagick resizer.

use super::{ImageResizer, ResizeRequest};
use crate::error::DerivativeError;
use std::ffi::OsString;
use std::process::Command;
use tracing::{debug, error};

/// Resizes by running `magick` as a blocking subprocess
#[derive(Debug, Clone)]
pub struct MagickResizer {
    program: OsString,
}

impl MagickResizer {
    /// Use `magick` from `PATH`
    pub fn new() -> Self {
        Self::with_program("magick")
    }

    /// Use a specific executable
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for one request, without the program name.
    ///
    /// `input[0] [-trim] -thumbnail WxH -quality Q output`
    pub fn command_args(request: &ResizeRequest<'_>) -> Vec<OsString> {
        let mut input = request.input.as_os_str().to_os_string();
        if request.first_page {
            input.push("[0]");
        }

        let mut args = vec![input];
        if request.trim {
            args.push("-trim".into());
        }
        args.push("-thumbnail".into());
        args.push(format!("{}x{}", request.width, request.height).into());
        args.push("-quality".into());
        args.push(request.quality.to_string().into());
        args.push(request.output.as_os_str().to_os_string());
        args
    }

    fn command_line(&self, args: &[OsString]) -> String {
        std::iter::once(&self.program)
            .chain(args)
            .map(|a| {
                let a = a.to_string_lossy();
                if a.starts_with('-') {
                    a.into_owned()
                } else {
                    format!("\"{}\"", a)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for MagickResizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageResizer for MagickResizer {
    fn resize(&self, request: &ResizeRequest<'_>) -> Result<(), DerivativeError> {
        let args = Self::command_args(request);
        let command = self.command_line(&args);
        debug!("Executing: {}", command);

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| DerivativeError::ToolLaunch {
                command: command.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let code = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        error!("Command failed with {}: {}", code, command);

        Err(DerivativeError::ToolFailed {
            command,
            code,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "magick"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn request<'a>(input: &'a Path, output: &'a Path) -> ResizeRequest<'a> {
        ResizeRequest {
            input,
            output,
            width: 400,
            height: 400,
            quality: 85,
            trim: false,
            first_page: false,
        }
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn image_arguments() {
        let req = request(Path::new("/in/a.tif"), Path::new("/in/a_TN.jpg"));

        assert_eq!(
            strings(MagickResizer::command_args(&req)),
            vec!["/in/a.tif", "-thumbnail", "400x400", "-quality", "85", "/in/a_TN.jpg"]
        );
    }

    #[test]
    fn pdf_uses_first_page_and_trim_is_optional() {
        let mut req = request(Path::new("/in/doc.pdf"), Path::new("/in/doc_TN.jpg"));
        req.first_page = true;
        req.trim = true;

        let args = strings(MagickResizer::command_args(&req));

        assert_eq!(args[0], "/in/doc.pdf[0]");
        assert_eq!(args[1], "-trim");
    }

    #[test]
    fn command_line_quotes_paths() {
        let resizer = MagickResizer::new();
        let req = request(Path::new("/in/a.png"), Path::new("/in/a_TN.jpg"));

        let line = resizer.command_line(&MagickResizer::command_args(&req));

        assert_eq!(
            line,
            "\"magick\" \"/in/a.png\" -thumbnail \"400x400\" -quality \"85\" \"/in/a_TN.jpg\""
        );
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let resizer = MagickResizer::with_program("/nonexistent/bin/magick-xyz");
        let req = request(Path::new("/in/a.png"), Path::new("/in/a_TN.jpg"));

        assert!(matches!(
            resizer.resize(&req),
            Err(DerivativeError::ToolLaunch { .. })
        ));
    }
}
