//! Deal memo → PDF.
//!
//! Rendering is a two-step chain. The rich layout interprets the memo as
//! markdown; if it refuses (a token wider than a line), the plain layout
//! renders the same text with character-level hard wrap, which always
//! succeeds.

mod layout;
mod text;
mod writer;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

pub use text::sanitize;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("token does not fit on a line: {word}")]
    Overflow { word: String },
}

/// Which layout produced the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    Rich,
    Plain,
}

pub trait MemoRenderer: Send + Sync {
    /// Render `text` to a PDF at `path`, creating parent directories.
    fn render(&self, text: &str, path: &Path) -> Result<PathBuf, RenderError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    /// Lay out and serialise `text`, reporting which layout was used.
    pub fn to_bytes(&self, text: &str) -> (Vec<u8>, LayoutMode) {
        let clean = sanitize(text);
        match layout::rich(&clean) {
            Ok(pages) => (writer::write_pdf(&pages), LayoutMode::Rich),
            Err(e) => {
                warn!(error = %e, "rich layout refused; using plain layout");
                (writer::write_pdf(&layout::plain(&clean)), LayoutMode::Plain)
            }
        }
    }
}

impl MemoRenderer for PdfRenderer {
    fn render(&self, text: &str, path: &Path) -> Result<PathBuf, RenderError> {
        let (bytes, mode) = self.to_bytes(text);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), ?mode, "rendered memo PDF");
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_memo_uses_rich_layout() {
        let (bytes, mode) = PdfRenderer.to_bytes("# AcmeAI\n\n**Team**: strong\n\n- point");
        assert_eq!(mode, LayoutMode::Rich);
        assert!(bytes.starts_with(b"%PDF-1.4"));
    }

    #[test]
    fn overlong_token_falls_back_to_plain() {
        let memo = format!("# AcmeAI\n\n{}", "https://example.com/".repeat(40));
        let (bytes, mode) = PdfRenderer.to_bytes(&memo);
        assert_eq!(mode, LayoutMode::Plain);
        assert!(bytes.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn render_creates_directories_and_tolerates_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/AcmeAI_DealMemo.pdf");
        let memo = "## 🛡️ Moat\nProprietary data — 50k docs ✅\n中文 ignored";
        let written = PdfRenderer.render(memo, &path).unwrap();
        assert_eq!(written, path);
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.is_ascii());
    }

    #[test]
    fn empty_memo_still_renders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        PdfRenderer.render("", &path).unwrap();
        assert!(path.exists());
    }
}
