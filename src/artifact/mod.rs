//! Final artifact: sanitize the article text and render it to a file.

mod pdf;

pub use pdf::PdfRenderer;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Header used when no title was suggested.
pub const DEFAULT_TITLE: &str = "Final Draft";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to build document: {0}")]
    Document(String),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Sanitized content handed to a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDocument {
    pub title: String,
    pub body: String,
}

/// Turns a document into a file on disk.
pub trait DocumentRenderer: Send + Sync {
    /// File extension (without the dot) of the produced artifact.
    fn extension(&self) -> &str;

    fn render(&self, document: &ArticleDocument, path: &Path) -> Result<(), RenderError>;
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<.*?>").expect("tag pattern is valid"))
}

/// Remove `<...>` markup. Tags do not span lines.
pub fn strip_tags(text: &str) -> String {
    tag_pattern().replace_all(text, "").into_owned()
}

/// Keep only characters the renderer's single-byte font encoding can show.
pub fn strip_unrepresentable(text: &str) -> String {
    text.chars().filter(|c| (*c as u32) < 256).collect()
}

/// Full sanitization. Idempotent.
pub fn sanitize(text: &str) -> String {
    strip_unrepresentable(&strip_tags(text))
}

/// Writes the finished article into the output directory.
pub struct ArtifactWriter {
    output_dir: PathBuf,
    renderer: Box<dyn DocumentRenderer>,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>, renderer: Box<dyn DocumentRenderer>) -> Self {
        Self {
            output_dir: output_dir.into(),
            renderer,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render under the default header.
    pub fn render(&self, keyword: &str, text: &str) -> Result<PathBuf, RenderError> {
        self.render_titled(keyword, None, text)
    }

    /// Sanitize and render to `{keyword}_{timestamp}.{ext}`, returning the path.
    pub fn render_titled(
        &self,
        keyword: &str,
        title: Option<&str>,
        text: &str,
    ) -> Result<PathBuf, RenderError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| RenderError::OutputDir {
            path: self.output_dir.clone(),
            source: e,
        })?;

        let title = title
            .map(|t| sanitize(t).trim().trim_matches('"').trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let document = ArticleDocument {
            title,
            body: sanitize(text),
        };

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let file_name = format!(
            "{}_{}.{}",
            file_stem(keyword),
            timestamp,
            self.renderer.extension()
        );
        let path = self.output_dir.join(file_name);

        self.renderer.render(&document, &path)?;
        tracing::info!(path = %path.display(), bytes = document.body.len(), "Artifact written");
        Ok(path)
    }
}

/// Keyword made safe for use as a file name component.
fn file_stem(keyword: &str) -> String {
    let stem: String = keyword
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    if stem.is_empty() {
        "article".to_string()
    } else {
        stem
    }
}


#[cfg(test)]
mod tests {
    use super::testing::CaptureRenderer;
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<h1>Title</h1>\nBody <b>bold</b>"), "Title\nBody bold");
        assert_eq!(strip_tags("a < b and c > d"), "a  d");
        assert_eq!(strip_tags("no tags"), "no tags");
    }

    #[test]
    fn test_tags_do_not_span_lines() {
        assert_eq!(strip_tags("1 < 2\n3 > 2"), "1 < 2\n3 > 2");
    }

    #[test]
    fn test_strip_unrepresentable() {
        assert_eq!(strip_unrepresentable("café — naïve “quote” 🎨"), "café  naïve quote ");
        assert_eq!(strip_unrepresentable("ÿ\u{100}"), "ÿ");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            "<p>Monet’s <i>Impression</i>, soleil levant</p>",
            "<<a>b>",
            "a<b<c>d>e",
            "x <y\n> z",
            "<a\u{2014}>",
            "<\u{1F3A8}<b>>",
            "plain",
            "",
        ];
        for s in samples {
            let once = sanitize(s);
            assert_eq!(sanitize(&once), once, "input: {:?}", s);
        }
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("impressionism"), "impressionism");
        assert_eq!(file_stem("art/market"), "art_market");
        assert_eq!(file_stem("  "), "article");
    }

    #[test]
    fn test_writer_names_and_sanitizes() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("articles");
        let renderer = CaptureRenderer::default();
        let writer = ArtifactWriter::new(&out, Box::new(renderer.clone()));

        let path = writer.render("impressionism", "<h1>Light</h1> ✨and colour").unwrap();

        assert!(path.starts_with(&out));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("impressionism_"));
        assert!(name.ends_with(".txt"));
        // impressionism_YYYYmmdd_HHMMSS.txt
        assert_eq!(name.len(), "impressionism_".len() + 15 + ".txt".len());

        let rendered = renderer.rendered();
        assert_eq!(rendered[0].body, "Light and colour");
        assert_eq!(rendered[0].title, DEFAULT_TITLE);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Light and colour");
    }

    #[test]
    fn test_writer_uses_cleaned_title() {
        let dir = tempdir().unwrap();
        let renderer = CaptureRenderer::default();
        let writer = ArtifactWriter::new(dir.path(), Box::new(renderer.clone()));

        writer
            .render_titled("k", Some("  \"Brushstrokes of Light\"\n"), "body")
            .unwrap();
        writer.render_titled("k", Some("<b></b>"), "body").unwrap();

        let rendered = renderer.rendered();
        assert_eq!(rendered[0].title, "Brushstrokes of Light");
        assert_eq!(rendered[1].title, DEFAULT_TITLE);
    }

    #[test]
    fn test_writer_reports_unwritable_dir() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let writer = ArtifactWriter::new(blocker.join("sub"), Box::new(CaptureRenderer::default()));

        assert!(matches!(
            writer.render("k", "text"),
            Err(RenderError::OutputDir { .. })
        ));
    }
}
