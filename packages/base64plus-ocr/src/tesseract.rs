use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use tracing::debug;

use crate::engine::{OcrError, TokenDetector};
use crate::process::{png_bytes, run_with_stdin};
use crate::raw::TokenTable;

/// Tesseract invoked through its command line, reading the image from stdin
/// and writing TSV to stdout.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: PathBuf,
    languages: Vec<String>,
}

impl TesseractCli {
    pub fn new() -> Self {
        Self::with_program("tesseract")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            languages: Vec::new(),
        }
    }

    /// Languages passed as `-l a+b`. Empty means Tesseract's own default.
    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Checks that the binary runs, returning its version banner.
    pub fn probe(&self) -> Result<String, OcrError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|e| {
                OcrError::Engine(format!("failed to launch {}: {e}", self.program.display()))
            })?;
        if !output.status.success() {
            return Err(OcrError::Engine(format!(
                "{} --version exited with {}",
                self.program.display(),
                output.status
            )));
        }
        // Older releases print the banner on stderr.
        let banner = if output.stdout.is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        Ok(String::from_utf8_lossy(&banner)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec!["stdin".to_string(), "stdout".to_string()];
        if !self.languages.is_empty() {
            args.push("-l".to_string());
            args.push(self.languages.join("+"));
        }
        args.push("tsv".to_string());
        args
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenDetector for TesseractCli {
    fn detect_tokens(&self, image: &DynamicImage) -> Result<TokenTable, OcrError> {
        let png = png_bytes(image)?;
        debug!(program = %self.program.display(), bytes = png.len(), "invoking tesseract");
        let stdout = run_with_stdin(&self.program, self.args(), &png)?;
        parse_tsv(&String::from_utf8_lossy(&stdout))
    }
}

/// Parses `tesseract ... tsv` output into a token table.
///
/// Columns are located by header name. Rows whose `text` cell is missing
/// (Tesseract trims trailing tabs on structural rows) get empty text.
pub fn parse_tsv(tsv: &str) -> Result<TokenTable, OcrError> {
    let mut lines = tsv.lines().filter(|line| !line.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| OcrError::Engine("tesseract produced no TSV header".into()))?;
    let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
    let column = |name: &str| {
        columns
            .iter()
            .position(|c| *c == name)
            .ok_or_else(|| OcrError::Engine(format!("tesseract TSV is missing column `{name}`")))
    };
    let (left, top, width, height, conf, text) = (
        column("left")?,
        column("top")?,
        column("width")?,
        column("height")?,
        column("conf")?,
        column("text")?,
    );

    let mut table = TokenTable::new();
    for (line_no, line) in lines.enumerate() {
        let cells: Vec<&str> = line.split('\t').collect();
        let int = |idx: usize, name: &str| -> Result<i64, OcrError> {
            let cell = cells.get(idx).map(|c| c.trim()).unwrap_or_default();
            cell.parse().map_err(|_| {
                OcrError::Engine(format!(
                    "tesseract TSV row {}: bad {name} value {cell:?}",
                    line_no + 1
                ))
            })
        };
        let confidence: f32 = {
            let cell = cells.get(conf).map(|c| c.trim()).unwrap_or_default();
            cell.parse().map_err(|_| {
                OcrError::Engine(format!(
                    "tesseract TSV row {}: bad conf value {cell:?}",
                    line_no + 1
                ))
            })?
        };
        table.push(
            cells.get(text).copied().unwrap_or_default(),
            int(left, "left")?,
            int(top, "top")?,
            int(width, "width")?,
            int(height, "height")?,
            confidence,
        );
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::normalize_tokens;

    const SAMPLE: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t300\t100\t-1\t
2\t1\t1\t0\t0\t0\t10\t10\t220\t64\t-1
5\t1\t1\t1\t1\t1\t10\t10\t130\t24\t96.063751\tBase64Plus
5\t1\t1\t1\t1\t2\t150\t10\t60\t24\t91.5\tTest
5\t1\t1\t1\t2\t1\t10\t50\t8\t24\t95\t
";

    #[test]
    fn test_parse_tsv_reads_all_rows() {
        let table = parse_tsv(SAMPLE).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.text[1], "");
        assert_eq!(table.conf[0], -1.0);
        assert_eq!(table.left[3], 150);
    }

    #[test]
    fn test_parsed_tsv_normalizes_to_words() {
        let detections = normalize_tokens(parse_tsv(SAMPLE).unwrap()).unwrap();
        let texts: Vec<_> = detections.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, ["Base64Plus", "Test"]);
        assert_eq!(detections[1].confidence, Some(0.915));
    }

    #[test]
    fn test_parse_tsv_requires_header() {
        assert!(matches!(parse_tsv(""), Err(OcrError::Engine(_))));
        assert!(matches!(
            parse_tsv("level\tleft\ttop\n"),
            Err(OcrError::Engine(msg)) if msg.contains("width")
        ));
    }

    #[test]
    fn test_parse_tsv_rejects_garbage_numbers() {
        let tsv = "left\ttop\twidth\theight\tconf\ttext\nx\t1\t1\t1\t50\tword\n";
        assert!(matches!(parse_tsv(tsv), Err(OcrError::Engine(msg)) if msg.contains("left")));
    }

    #[test]
    fn test_args_join_languages() {
        let cli = TesseractCli::new().with_languages(vec!["eng".into(), "deu".into()]);
        assert_eq!(cli.args(), ["stdin", "stdout", "-l", "eng+deu", "tsv"]);
        assert_eq!(TesseractCli::new().args(), ["stdin", "stdout", "tsv"]);
    }

    #[test]
    fn test_program_defaults_and_overrides() {
        assert_eq!(TesseractCli::new().program(), Path::new("tesseract"));
        let cli = TesseractCli::with_program("/opt/tesseract/bin/tesseract");
        assert_eq!(cli.program(), Path::new("/opt/tesseract/bin/tesseract"));
    }

    #[test]
    fn test_probe_missing_binary_fails() {
        let cli = TesseractCli::with_program("b64p-no-such-tesseract");
        assert!(cli.probe().is_err());
    }
}
