//! Helpers for engines that run as child processes and read the image from
//! stdin.

use std::ffi::OsStr;
use std::io::{self, Cursor, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use image::{DynamicImage, ImageFormat};

use crate::engine::OcrError;

/// Encodes the image as PNG, the one format every supported engine reads.
pub(crate) fn png_bytes(image: &DynamicImage) -> Result<Vec<u8>, OcrError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| OcrError::InvalidInput(format!("cannot encode image for OCR: {e}")))?;
    Ok(buf.into_inner())
}

/// Runs `program args...`, feeding `input` on stdin, and returns stdout.
/// A non-zero exit status is an engine error carrying stderr.
pub(crate) fn run_with_stdin<I, S>(program: &Path, args: I, input: &[u8]) -> Result<Vec<u8>, OcrError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let display = program.display();
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| OcrError::Engine(format!("failed to launch {display}: {e}")))?;

    // Stdin is written on its own thread so a child that fills its stdout or
    // stderr pipe before draining stdin cannot stall both sides.
    let stdin = child.stdin.take();
    let (written, output) = thread::scope(|scope| {
        let writer = stdin.map(|mut stdin| scope.spawn(move || stdin.write_all(input)));
        let output = child.wait_with_output();
        (writer.map(|handle| handle.join()), output)
    });

    match written {
        // The engine may exit without draining stdin; its status decides.
        Some(Ok(Err(e))) if e.kind() != io::ErrorKind::BrokenPipe => {
            return Err(OcrError::Engine(format!("failed to write to {display}: {e}")));
        }
        Some(Err(_)) => {
            return Err(OcrError::Engine(format!("stdin writer for {display} panicked")));
        }
        _ => {}
    }

    let output = output.map_err(|e| OcrError::Engine(format!("failed to wait for {display}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(OcrError::Engine(format!(
            "{display} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(output.stdout)
}
