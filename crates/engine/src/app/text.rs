use std::collections::HashMap;

use serde::Deserialize;
use tracing::warn;

use crate::app::queue::{DrawPayload, RenderQueue};
use crate::app::surface::{Frame, Vec2};

pub const GLYPH_WIDTH: u32 = 3;
pub const GLYPH_HEIGHT: u32 = 5;
const GLYPH_GAP: u32 = 1;

/// Vertical distance between wrapped text lines, in pixels.
pub const LINE_SPACING_PX: i32 = 35;

/// Lines shown per dialogue page.
pub const LINES_PER_PAGE: usize = 3;

#[derive(Clone, Copy)]
struct Glyph {
    rows: [u8; GLYPH_HEIGHT as usize],
}

const fn g(rows: [u8; 5]) -> Glyph {
    Glyph { rows }
}

fn glyph_for(ch: char) -> Option<Glyph> {
    let glyph = match ch.to_ascii_uppercase() {
        'A' => g([0b010, 0b101, 0b111, 0b101, 0b101]),
        'B' => g([0b110, 0b101, 0b110, 0b101, 0b110]),
        'C' => g([0b011, 0b100, 0b100, 0b100, 0b011]),
        'D' => g([0b110, 0b101, 0b101, 0b101, 0b110]),
        'E' => g([0b111, 0b100, 0b110, 0b100, 0b111]),
        'F' => g([0b111, 0b100, 0b110, 0b100, 0b100]),
        'G' => g([0b011, 0b100, 0b101, 0b101, 0b011]),
        'H' => g([0b101, 0b101, 0b111, 0b101, 0b101]),
        'I' => g([0b111, 0b010, 0b010, 0b010, 0b111]),
        'J' => g([0b001, 0b001, 0b001, 0b101, 0b010]),
        'K' => g([0b101, 0b101, 0b110, 0b101, 0b101]),
        'L' => g([0b100, 0b100, 0b100, 0b100, 0b111]),
        'M' => g([0b101, 0b111, 0b111, 0b101, 0b101]),
        'N' => g([0b110, 0b101, 0b101, 0b101, 0b101]),
        'O' => g([0b010, 0b101, 0b101, 0b101, 0b010]),
        'P' => g([0b110, 0b101, 0b110, 0b100, 0b100]),
        'Q' => g([0b010, 0b101, 0b101, 0b110, 0b011]),
        'R' => g([0b110, 0b101, 0b110, 0b101, 0b101]),
        'S' => g([0b011, 0b100, 0b010, 0b001, 0b110]),
        'T' => g([0b111, 0b010, 0b010, 0b010, 0b010]),
        'U' => g([0b101, 0b101, 0b101, 0b101, 0b111]),
        'V' => g([0b101, 0b101, 0b101, 0b101, 0b010]),
        'W' => g([0b101, 0b101, 0b111, 0b111, 0b101]),
        'X' => g([0b101, 0b101, 0b010, 0b101, 0b101]),
        'Y' => g([0b101, 0b101, 0b010, 0b010, 0b010]),
        'Z' => g([0b111, 0b001, 0b010, 0b100, 0b111]),
        '0' => g([0b111, 0b101, 0b101, 0b101, 0b111]),
        '1' => g([0b010, 0b110, 0b010, 0b010, 0b111]),
        '2' => g([0b111, 0b001, 0b111, 0b100, 0b111]),
        '3' => g([0b111, 0b001, 0b111, 0b001, 0b111]),
        '4' => g([0b101, 0b101, 0b111, 0b001, 0b001]),
        '5' => g([0b111, 0b100, 0b111, 0b001, 0b111]),
        '6' => g([0b111, 0b100, 0b111, 0b101, 0b111]),
        '7' => g([0b111, 0b001, 0b001, 0b001, 0b001]),
        '8' => g([0b111, 0b101, 0b111, 0b101, 0b111]),
        '9' => g([0b111, 0b101, 0b111, 0b001, 0b111]),
        '.' => g([0b000, 0b000, 0b000, 0b000, 0b010]),
        ',' => g([0b000, 0b000, 0b000, 0b010, 0b100]),
        '!' => g([0b010, 0b010, 0b010, 0b000, 0b010]),
        '?' => g([0b110, 0b001, 0b010, 0b000, 0b010]),
        ':' => g([0b000, 0b010, 0b000, 0b010, 0b000]),
        '\'' => g([0b010, 0b010, 0b000, 0b000, 0b000]),
        '-' => g([0b000, 0b000, 0b111, 0b000, 0b000]),
        _ => return None,
    };
    Some(glyph)
}

/// Pixel width of `text` at the given scale. Unknown glyphs and spaces
/// still advance the pen.
pub fn text_width(text: &str, scale: u32) -> u32 {
    let count = text.chars().count() as u32;
    if count == 0 {
        return 0;
    }
    count * (GLYPH_WIDTH + GLYPH_GAP) * scale - GLYPH_GAP * scale
}

pub fn text_height(scale: u32) -> u32 {
    GLYPH_HEIGHT * scale
}

/// Rasterise `text` onto the frame. Glyphs falling outside the frame
/// are clipped per pixel; unknown characters leave a gap.
pub fn draw_text(frame: &mut Frame<'_>, x: i32, y: i32, scale: u32, color: [u8; 4], text: &str) {
    let scale = scale.max(1);
    let advance = ((GLYPH_WIDTH + GLYPH_GAP) * scale) as i32;
    let (rgba, width, height) = frame.raw_parts_mut();
    let mut pen_x = x;
    for ch in text.chars() {
        if let Some(glyph) = glyph_for(ch) {
            for (row, bits) in glyph.rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    for sy in 0..scale as i32 {
                        for sx in 0..scale as i32 {
                            super::surface::write_pixel_rgba(
                                rgba,
                                width,
                                height,
                                pen_x + (col * scale) as i32 + sx,
                                y + (row as u32 * scale) as i32 + sy,
                                color,
                            );
                        }
                    }
                }
            }
        }
        pen_x += advance;
    }
}

/// Word-wrap `text` into lines no wider than `max_width` pixels. A
/// single word wider than the limit gets its own line and is clipped
/// at draw time.
pub fn wrap_text(text: &str, max_width: u32, scale: u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, scale) <= max_width || current.is_empty() {
            current = candidate;
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Dialogue text shown a page at a time, three wrapped lines per page.
pub struct TextBox {
    pages: Vec<Vec<String>>,
    page_index: usize,
    position: Vec2,
    scale: u32,
    color: [u8; 4],
}

impl TextBox {
    pub fn new(text: &str, position: Vec2, max_width: u32, scale: u32, color: [u8; 4]) -> Self {
        let lines = wrap_text(text, max_width, scale);
        let pages = lines
            .chunks(LINES_PER_PAGE)
            .map(|chunk| chunk.to_vec())
            .collect();
        Self {
            pages,
            page_index: 0,
            position,
            scale,
            color,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_page(&self) -> Option<&[String]> {
        self.pages.get(self.page_index).map(|page| page.as_slice())
    }

    /// Move to the next page. Returns false once all pages are spent.
    pub fn advance(&mut self) -> bool {
        self.page_index += 1;
        self.page_index < self.pages.len()
    }

    pub fn is_finished(&self) -> bool {
        self.page_index >= self.pages.len()
    }

    pub fn draw(&self, queue: &mut RenderQueue, layer: i32) {
        let Some(page) = self.current_page() else {
            return;
        };
        let lines: Vec<String> = page.to_vec();
        let (x, y) = (self.position.x.round() as i32, self.position.y.round() as i32);
        let (scale, color) = (self.scale, self.color);
        queue.push(
            layer,
            DrawPayload::Call(Box::new(move |frame| {
                for (index, line) in lines.iter().enumerate() {
                    draw_text(
                        frame,
                        x,
                        y + index as i32 * LINE_SPACING_PX,
                        scale,
                        color,
                        line,
                    );
                }
            })),
        );
    }

    pub fn rescale(&mut self, multiplier: f32) {
        self.position.x *= multiplier;
        self.position.y *= multiplier;
        let scaled = (self.scale as f32 * multiplier).round() as u32;
        self.scale = scaled.max(1);
    }
}

/// Keyed dialogue lines loaded from an external table. The table is a
/// flat mapping of node name to text.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct DialogueTable(HashMap<String, String>);

impl DialogueTable {
    pub fn line(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a line, warning once per frame path if the key is
    /// absent so mistyped node actions show up in logs.
    pub fn line_or_warn(&self, key: &str) -> Option<&str> {
        let line = self.line(key);
        if line.is_none() {
            warn!(key, "dialogue_key_missing");
        }
        line
    }
}
