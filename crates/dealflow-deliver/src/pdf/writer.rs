//! Minimal PDF 1.4 serialiser.
//!
//! Pages hold positioned text runs in the two built-in Helvetica faces, so no
//! font program is embedded. The output is pure ASCII: bytes above 0x7E are
//! written as octal escapes inside string literals.

use std::fmt::Write;

/// A4 in points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub font: Font,
    pub size: f32,
    /// Latin-1 text; see [`super::text::sanitize`].
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub runs: Vec<TextRun>,
}

impl Page {
    pub fn push(&mut self, run: TextRun) {
        self.runs.push(run);
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// PDF string literal body for `text`.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            c if (c as u32) <= 0xff => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            _ => out.push('?'),
        }
    }
    out
}

fn content_stream(page: &Page) -> String {
    let mut ops = String::new();
    for run in &page.runs {
        let _ = writeln!(
            ops,
            "BT /{} {:.1} Tf {:.2} {:.2} Td ({}) Tj ET",
            run.font.resource(),
            run.size,
            run.x,
            run.y,
            escape(&run.text)
        );
    }
    ops
}

/// Serialise `pages` into a complete PDF file. An empty slice yields one
/// blank page.
pub fn write_pdf(pages: &[Page]) -> Vec<u8> {
    let blank = [Page::default()];
    let pages = if pages.is_empty() { &blank[..] } else { pages };

    // 1 catalog, 2 page tree, 3-4 fonts, then a (page, content) pair per page.
    let page_id = |i: usize| 5 + 2 * i;
    let mut objects: Vec<String> = Vec::with_capacity(4 + 2 * pages.len());
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", page_id(i)))
        .collect();
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages.len()
    ));
    for base in ["Helvetica", "Helvetica-Bold"] {
        objects.push(format!(
            "<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>"
        ));
    }
    for (i, page) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.2} {PAGE_HEIGHT:.2}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            page_id(i) + 1
        ));
        let stream = content_stream(page);
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}endstream",
            stream.len()
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{body}\nendobj\n", i + 1);
    }
    let xref_at = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(out, "{offset:010} 00000 n \n");
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    );
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> TextRun {
        TextRun {
            x: 56.0,
            y: 780.0,
            font: Font::Regular,
            size: 11.0,
            text: text.to_string(),
        }
    }

    #[test]
    fn escapes_delimiters_and_high_bytes() {
        assert_eq!(escape("a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(escape("Café"), "Caf\\351");
    }

    #[test]
    fn empty_document_has_one_page() {
        let bytes = write_pdf(&[]);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("%PDF-1.4\n"));
        assert!(text.contains("/Count 1"));
        assert!(text.ends_with("%%EOF\n"));
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let mut page = Page::default();
        page.push(run("Hello"));
        let text = String::from_utf8(write_pdf(&[page.clone(), page])).unwrap();
        assert!(text.contains("/Count 2"));

        let xref_at: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .unwrap()
            .parse()
            .unwrap();
        assert!(text[xref_at..].starts_with("xref\n0 9\n"));

        let entries: Vec<usize> = text[xref_at..]
            .lines()
            .skip(3)
            .take(8)
            .map(|l| l[..10].parse().unwrap())
            .collect();
        for (i, offset) in entries.iter().enumerate() {
            assert!(text[*offset..].starts_with(&format!("{} 0 obj", i + 1)));
        }
    }

    #[test]
    fn runs_land_in_content_stream() {
        let mut page = Page::default();
        page.push(TextRun {
            font: Font::Bold,
            ..run("Deal (memo)")
        });
        let text = String::from_utf8(write_pdf(&[page])).unwrap();
        assert!(text.contains("BT /F2 11.0 Tf 56.00 780.00 Td (Deal \\(memo\\)) Tj ET"));
    }
}
