//! Page layout: markdown-aware rich layout and the plain-text fallback.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use super::RenderError;
use super::text::width;
use super::writer::{Font, PAGE_HEIGHT, PAGE_WIDTH, Page, TextRun};

const MARGIN: f32 = 56.0;
const BODY_SIZE: f32 = 11.0;
const LEADING: f32 = 1.4;
const BULLET_INDENT: f32 = 14.0;
const BLOCK_GAP: f32 = 6.0;

fn text_width() -> f32 {
    PAGE_WIDTH - 2.0 * MARGIN
}

/// Cursor over a growing list of pages.
struct Cursor {
    pages: Vec<Page>,
    current: Page,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Page::default(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn break_page(&mut self) {
        let full = std::mem::take(&mut self.current);
        self.pages.push(full);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Move down one line of `size`, starting a new page when the bottom
    /// margin would be crossed. Returns the baseline for the line.
    fn advance(&mut self, size: f32) -> f32 {
        let step = size * LEADING;
        if self.y - step < MARGIN && !self.current.is_empty() {
            self.break_page();
        }
        self.y -= step;
        self.y
    }

    fn gap(&mut self, points: f32) {
        self.y -= points;
    }

    fn put(&mut self, x: f32, y: f32, font: Font, size: f32, text: String) {
        if !text.is_empty() {
            self.current.push(TextRun {
                x,
                y,
                font,
                size,
                text,
            });
        }
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

// ── Rich layout ──

#[derive(Debug, Clone, Copy, PartialEq)]
enum BlockKind {
    Paragraph,
    Heading(f32),
    Bullet(usize),
    /// Later paragraph of a list item: indented, no marker.
    ItemBody(usize),
    Code,
}

#[derive(Debug, Clone)]
struct Word {
    text: String,
    font: Font,
}

struct Block {
    kind: BlockKind,
    /// Lines of words; hard breaks start a new inner vec.
    lines: Vec<Vec<Word>>,
    /// A space is owed before the next word.
    pending_space: bool,
}

impl Block {
    fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            lines: vec![Vec::new()],
            pending_space: false,
        }
    }

    fn push_text(&mut self, text: &str, font: Font) {
        let starts_with_space = text.starts_with(char::is_whitespace);
        let ends_with_space = text.ends_with(char::is_whitespace);
        let line = self.lines.last_mut();
        let Some(line) = line else { return };
        let mut first = true;
        for piece in text.split_whitespace() {
            let glue = !first || starts_with_space || self.pending_space;
            // Continuation of a word split across spans (e.g. `**Bold**:`).
            if !glue && let Some(last) = line.last_mut() {
                last.text.push_str(piece);
            } else {
                line.push(Word {
                    text: piece.to_string(),
                    font,
                });
            }
            first = false;
            self.pending_space = false;
        }
        if ends_with_space {
            self.pending_space = true;
        }
    }

    fn soft_break(&mut self) {
        self.pending_space = true;
    }

    fn hard_break(&mut self) {
        self.lines.push(Vec::new());
        self.pending_space = false;
    }

    fn is_empty(&self) -> bool {
        self.lines.iter().all(Vec::is_empty)
    }
}

fn heading_size(level: HeadingLevel) -> f32 {
    match level {
        HeadingLevel::H1 => 18.0,
        HeadingLevel::H2 => 15.0,
        _ => 13.0,
    }
}

/// Lay out markdown with headings, bold spans, and bullets.
///
/// Fails with [`RenderError::Overflow`] when a single word does not fit on a
/// line; the caller falls back to [`plain`].
pub fn rich(markdown: &str) -> Result<Vec<Page>, RenderError> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let mut cursor = Cursor::new();
    let mut block: Option<Block> = None;
    let mut bold = 0usize;
    let mut list_depth = 0usize;
    let mut item_started = false;

    for event in Parser::new_ext(markdown, options) {
        let font = if bold > 0 { Font::Bold } else { Font::Regular };
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                flush(&mut cursor, block.take())?;
                block = Some(Block::new(BlockKind::Heading(heading_size(level))));
            }
            Event::Start(Tag::Paragraph) => {
                if block.is_none() {
                    let kind = if list_depth == 0 {
                        BlockKind::Paragraph
                    } else if item_started {
                        BlockKind::ItemBody(list_depth)
                    } else {
                        item_started = true;
                        BlockKind::Bullet(list_depth)
                    };
                    block = Some(Block::new(kind));
                }
            }
            Event::Start(Tag::Item) => {
                flush(&mut cursor, block.take())?;
                item_started = false;
            }
            Event::Start(Tag::List(_)) => {
                flush(&mut cursor, block.take())?;
                list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => {
                flush(&mut cursor, block.take())?;
                list_depth = list_depth.saturating_sub(1);
            }
            Event::Start(Tag::CodeBlock(_)) => {
                flush(&mut cursor, block.take())?;
                block = Some(Block::new(BlockKind::Code));
            }
            Event::Start(Tag::Strong) => bold += 1,
            Event::End(TagEnd::Strong) => bold = bold.saturating_sub(1),
            Event::End(
                TagEnd::Heading(_)
                | TagEnd::Paragraph
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::TableRow
                | TagEnd::TableHead,
            ) => flush(&mut cursor, block.take())?,
            Event::Text(text) | Event::Code(text) => {
                let b = block.get_or_insert_with(|| {
                    if list_depth > 0 && !item_started {
                        item_started = true;
                        Block::new(BlockKind::Bullet(list_depth))
                    } else {
                        Block::new(BlockKind::Paragraph)
                    }
                });
                if b.kind == BlockKind::Code {
                    for (i, line) in text.split('\n').enumerate() {
                        if i > 0 {
                            b.hard_break();
                        }
                        b.push_text(line, Font::Regular);
                    }
                } else {
                    let font = match b.kind {
                        BlockKind::Heading(_) => Font::Bold,
                        _ => font,
                    };
                    b.push_text(&text, font);
                }
            }
            Event::SoftBreak => {
                if let Some(b) = block.as_mut() {
                    b.soft_break();
                }
            }
            Event::HardBreak => {
                if let Some(b) = block.as_mut() {
                    b.hard_break();
                }
            }
            Event::End(TagEnd::TableCell) => {
                if let Some(b) = block.as_mut() {
                    b.push_text(" | ", Font::Regular);
                }
            }
            Event::Rule => {
                flush(&mut cursor, block.take())?;
                cursor.gap(BLOCK_GAP * 2.0);
            }
            _ => {}
        }
    }
    flush(&mut cursor, block)?;
    Ok(cursor.finish())
}

fn flush(cursor: &mut Cursor, block: Option<Block>) -> Result<(), RenderError> {
    let Some(block) = block else { return Ok(()) };
    if block.is_empty() {
        return Ok(());
    }

    let (size, indent, marker) = match block.kind {
        BlockKind::Paragraph | BlockKind::Code => (BODY_SIZE, 0.0, false),
        BlockKind::Heading(size) => {
            cursor.gap(BLOCK_GAP);
            (size, 0.0, false)
        }
        BlockKind::Bullet(depth) => (BODY_SIZE, BULLET_INDENT * depth as f32, true),
        BlockKind::ItemBody(depth) => (BODY_SIZE, BULLET_INDENT * depth as f32, false),
    };
    let left = MARGIN + indent;
    let available = text_width() - indent;

    let mut first_line = true;
    for words in &block.lines {
        for line in wrap_words(words, size, available)? {
            let y = cursor.advance(size);
            if marker && first_line {
                cursor.put(left - BULLET_INDENT * 0.7, y, Font::Regular, size, "-".into());
            }
            first_line = false;
            let mut x = left;
            for (i, word) in line.iter().enumerate() {
                if i > 0 {
                    x += width(" ", word.font, size);
                }
                cursor.put(x, y, word.font, size, word.text.clone());
                x += width(&word.text, word.font, size);
            }
        }
    }
    cursor.gap(BLOCK_GAP);
    Ok(())
}

/// Greedy word wrap; a word wider than the line is an overflow.
fn wrap_words<'a>(
    words: &'a [Word],
    size: f32,
    available: f32,
) -> Result<Vec<Vec<&'a Word>>, RenderError> {
    let mut lines: Vec<Vec<&Word>> = Vec::new();
    let mut line: Vec<&Word> = Vec::new();
    let mut used = 0.0;
    for word in words {
        let w = width(&word.text, word.font, size);
        if w > available {
            return Err(RenderError::Overflow {
                word: word.text.chars().take(40).collect(),
            });
        }
        let space = if line.is_empty() {
            0.0
        } else {
            width(" ", word.font, size)
        };
        if !line.is_empty() && used + space + w > available {
            lines.push(std::mem::take(&mut line));
            used = 0.0;
        } else {
            used += space;
        }
        used += w;
        line.push(word);
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    Ok(lines)
}

// ── Plain layout ──

/// Lay out `text` line by line in the body font. Words longer than a line
/// are hard-wrapped at character boundaries, so this never fails.
pub fn plain(text: &str) -> Vec<Page> {
    let mut cursor = Cursor::new();
    let available = text_width();
    for source_line in text.lines() {
        let words: Vec<&str> = source_line.split_whitespace().collect();
        if words.is_empty() {
            cursor.advance(BODY_SIZE);
            continue;
        }
        for line in hard_wrap(&words, available) {
            let y = cursor.advance(BODY_SIZE);
            cursor.put(MARGIN, y, Font::Regular, BODY_SIZE, line);
        }
    }
    cursor.finish()
}

fn hard_wrap(words: &[&str], available: f32) -> Vec<String> {
    let fits = |s: &str| width(s, Font::Regular, BODY_SIZE) <= available;
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in words {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{line} {word}")
        };
        if fits(&candidate) {
            line = candidate;
            continue;
        }
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if fits(word) {
            line = word.to_string();
            continue;
        }
        for c in word.chars() {
            line.push(c);
            if !fits(&line) {
                line.pop();
                lines.push(std::mem::take(&mut line));
                line.push(c);
            }
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
