//! PDF output via lopdf: A4 pages, Helvetica, header title and page footer.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use super::{ArticleDocument, DocumentRenderer, RenderError};

const PAGE_WIDTH: f64 = 595.0;
const PAGE_HEIGHT: f64 = 842.0;
const MARGIN: f64 = 56.0;
const BODY_SIZE: f64 = 12.0;
const LINE_HEIGHT: f64 = 16.0;
const HEADER_SIZE: f64 = 12.0;
const FOOTER_SIZE: f64 = 8.0;
const HEADER_Y: f64 = PAGE_HEIGHT - 42.0;
const BODY_TOP: f64 = HEADER_Y - 30.0;
const BODY_BOTTOM: f64 = 60.0;
const FOOTER_Y: f64 = 30.0;

/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f64 = 0.5;

/// Renders articles as paginated PDF documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }

    fn build(&self, document: &ArticleDocument) -> Result<Document, RenderError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular = doc.add_object(font("Helvetica"));
        let bold = doc.add_object(font("Helvetica-Bold"));
        let italic = doc.add_object(font("Helvetica-Oblique"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
                "F3" => italic,
            },
        });

        let max_chars = ((PAGE_WIDTH - 2.0 * MARGIN) / (BODY_SIZE * AVG_GLYPH_WIDTH)) as usize;
        let lines = wrap_text(&document.body, max_chars);
        let lines_per_page = ((BODY_TOP - BODY_BOTTOM) / LINE_HEIGHT) as usize + 1;

        let mut kids: Vec<Object> = Vec::new();
        let blank: &[String] = &[];
        let chunks: Vec<&[String]> = if lines.is_empty() {
            vec![blank]
        } else {
            lines.chunks(lines_per_page).collect()
        };
        for (index, chunk) in chunks.iter().enumerate() {
            let content = page_content(&document.title, chunk, index + 1);
            let encoded = content
                .encode()
                .map_err(|e| RenderError::Document(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let media_box: Vec<Object> = vec![
            0i64.into(),
            0i64.into(),
            (PAGE_WIDTH as i64).into(),
            (PAGE_HEIGHT as i64).into(),
        ];
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();
        Ok(doc)
    }
}

impl DocumentRenderer for PdfRenderer {
    fn extension(&self) -> &str {
        "pdf"
    }

    fn render(&self, document: &ArticleDocument, path: &Path) -> Result<(), RenderError> {
        let mut doc = self.build(document)?;
        doc.save(path).map_err(|e| RenderError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn page_content(title: &str, lines: &[String], page_no: usize) -> Content {
    let mut operations = Vec::new();

    let header_x = centered_x(title, HEADER_SIZE);
    push_text(&mut operations, "F2", HEADER_SIZE, header_x, HEADER_Y, title);

    let mut y = BODY_TOP;
    for line in lines {
        if !line.is_empty() {
            push_text(&mut operations, "F1", BODY_SIZE, MARGIN, y, line);
        }
        y -= LINE_HEIGHT;
    }

    let footer = format!("Page {}", page_no);
    let footer_x = centered_x(&footer, FOOTER_SIZE);
    push_text(&mut operations, "F3", FOOTER_SIZE, footer_x, FOOTER_Y, &footer);

    Content { operations }
}

fn push_text(ops: &mut Vec<Operation>, font: &str, size: f64, x: f64, y: f64, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![font.into(), (size.round() as i64).into()],
    ));
    ops.push(Operation::new(
        "Td",
        vec![(x.round() as i64).into(), (y.round() as i64).into()],
    ));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(latin1_bytes(text))],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn centered_x(text: &str, size: f64) -> f64 {
    let width = text.chars().count() as f64 * size * AVG_GLYPH_WIDTH;
    ((PAGE_WIDTH - width) / 2.0).max(MARGIN)
}

/// Single-byte encoding of already-sanitized text.
fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .filter_map(|c| u8::try_from(c as u32).ok())
        .collect()
}

/// Word-wrap paragraphs to at most `max_chars` characters per line.
///
/// Blank input lines are kept as blank output lines; words longer than a line
/// are split.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut out = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if line_len > 0 {
                    out.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                let rest = word.split_off(max_chars);
                out.push(word.into_iter().collect());
                word = rest;
            }
            if word.is_empty() {
                continue;
            }

            let needed = if line_len == 0 { word.len() } else { line_len + 1 + word.len() };
            if needed > max_chars {
                out.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line_len += word.len();
            line.extend(word);
        }
        out.push(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
    }

    #[test]
    fn test_wrap_keeps_blank_lines() {
        let lines = wrap_text("first\n\nsecond", 80);
        assert_eq!(lines, vec!["first", "", "second"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap_text("ab abcdefghij", 4);
        assert_eq!(lines, vec!["ab", "abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_latin1_bytes() {
        assert_eq!(latin1_bytes("café"), vec![b'c', b'a', b'f', 0xE9]);
    }

    #[test]
    fn test_render_single_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let document = ArticleDocument {
            title: "Final Draft".to_string(),
            body: "Impressionism (and its legacy) in one short paragraph.".to_string(),
        };

        PdfRenderer::new().render(&document, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let loaded = Document::load(&path).unwrap();
        assert_eq!(loaded.get_pages().len(), 1);
    }

    #[test]
    fn test_render_paginates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("long.pdf");
        let body = (0..200)
            .map(|i| format!("Paragraph {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let document = ArticleDocument {
            title: "Long".to_string(),
            body,
        };

        PdfRenderer::new().render(&document, &path).unwrap();

        let loaded = Document::load(&path).unwrap();
        assert!(loaded.get_pages().len() > 1);
    }

    #[test]
    fn test_render_empty_body() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        let document = ArticleDocument {
            title: "Empty".to_string(),
            body: String::new(),
        };

        PdfRenderer::new().render(&document, &path).unwrap();
        assert_eq!(Document::load(&path).unwrap().get_pages().len(), 1);
    }
}
