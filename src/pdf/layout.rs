use pdf_writer::{Content, Name, Rect, Str};

use crate::fonts::{FontSet, FontStyle};
use crate::markup::Span;
use crate::model::Alignment;

pub(super) struct WordChunk {
    pub(super) font: FontStyle,
    pub(super) text: String,
    pub(super) font_size: f32,
    pub(super) color: Option<[u8; 3]>,
    pub(super) x_offset: f32, // x relative to line start
    pub(super) width: f32,
    pub(super) underline: bool,
    pub(super) hyperlink_url: Option<String>,
}

pub(super) struct LinkAnnotation {
    pub(super) rect: Rect,
    pub(super) url: String,
}

pub(super) struct TextLine {
    pub(super) chunks: Vec<WordChunk>,
    pub(super) total_width: f32,
}

/// Defaults applied to spans that do not set their own style.
#[derive(Clone, Copy)]
pub(super) struct RunDefaults {
    pub(super) bold: bool,
    pub(super) color: Option<[u8; 3]>,
    pub(super) font_size: f32,
}

fn finish_line(chunks: &mut Vec<WordChunk>) -> TextLine {
    let total_width = chunks.last().map(|c| c.x_offset + c.width).unwrap_or(0.0);
    TextLine {
        chunks: std::mem::take(chunks),
        total_width,
    }
}

/// Lay out styled spans into lines no wider than `max_width` (a single word
/// wider than that gets a line of its own). `\n` forces a break; consecutive
/// breaks leave empty lines. No space is inserted between spans unless the
/// text on either side of the boundary has whitespace.
pub(super) fn build_lines(
    spans: &[Span],
    fonts: &FontSet,
    defaults: RunDefaults,
    max_width: f32,
) -> Vec<TextLine> {
    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<WordChunk> = Vec::new();
    let mut current_x: f32 = 0.0;
    let mut prev_ended_with_ws = false;
    let mut prev_space_w: f32 = 0.0;
    let size = defaults.font_size;

    for span in spans {
        let font = FontStyle::new(span.style.bold || defaults.bold, span.style.italic);
        let entry = fonts.get(font);
        let space_w = entry.space_width(size);

        for (seg_idx, segment) in span.text.split('\n').enumerate() {
            if seg_idx > 0 {
                lines.push(finish_line(&mut current));
                current_x = 0.0;
                prev_ended_with_ws = false;
            }
            let starts_with_ws = segment.starts_with(char::is_whitespace);

            for (i, word) in segment.split_whitespace().enumerate() {
                let ww = entry.word_width(word, size);
                let need_space =
                    !current.is_empty() && (i > 0 || starts_with_ws || prev_ended_with_ws);
                // The space belongs to whichever run owns the whitespace
                let effective_space_w = if i > 0 || starts_with_ws {
                    space_w
                } else {
                    prev_space_w
                };
                let proposed_x = if need_space {
                    current_x + effective_space_w
                } else {
                    current_x
                };

                if !current.is_empty() && proposed_x + ww > max_width {
                    lines.push(finish_line(&mut current));
                    current_x = 0.0;
                } else {
                    current_x = proposed_x;
                }

                current.push(WordChunk {
                    font,
                    text: word.to_string(),
                    font_size: size,
                    color: span.style.color.or(defaults.color),
                    x_offset: current_x,
                    width: ww,
                    underline: span.style.underline,
                    hyperlink_url: span.style.link.clone(),
                });
                current_x += ww;
            }

            if !segment.is_empty() {
                prev_ended_with_ws = segment.ends_with(char::is_whitespace);
            }
        }
        prev_space_w = space_w;
    }

    if !current.is_empty() {
        lines.push(finish_line(&mut current));
    }
    lines
}

/// Widest unwrapped line: the width the text needs to avoid wrapping.
pub(super) fn natural_width(spans: &[Span], fonts: &FontSet, defaults: RunDefaults) -> f32 {
    build_lines(spans, fonts, defaults, f32::INFINITY)
        .iter()
        .map(|l| l.total_width)
        .fold(0.0, f32::max)
}

/// Widest single word: the narrowest the text can wrap to.
pub(super) fn min_width(spans: &[Span], fonts: &FontSet, defaults: RunDefaults) -> f32 {
    build_lines(spans, fonts, defaults, 0.0)
        .iter()
        .flat_map(|l| l.chunks.iter())
        .map(|c| c.width)
        .fold(0.0, f32::max)
}

pub(super) fn line_start_x(line: &TextLine, alignment: Alignment, left: f32, width: f32) -> f32 {
    match alignment {
        Alignment::Left => left,
        Alignment::Center => left + (width - line.total_width) / 2.0,
        Alignment::Right => left + width - line.total_width,
    }
}

fn set_fill(content: &mut Content, color: Option<[u8; 3]>) {
    match color {
        Some([r, g, b]) => {
            content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        }
        None => {
            content.set_fill_gray(0.0);
        }
    }
}

pub(super) fn fill_rect(content: &mut Content, rgb: [u8; 3], x: f32, y: f32, w: f32, h: f32) {
    content.save_state();
    set_fill(content, Some(rgb));
    content.rect(x, y, w, h);
    content.fill_nonzero();
    content.restore_state();
}

/// Draw one line whose first chunk starts at `line_x`, with its baseline at
/// `baseline_y`. Hyperlinked words produce link annotations; adjacent words
/// sharing a URL on the same line are merged into one rectangle.
pub(super) fn render_line(
    content: &mut Content,
    fonts: &mut FontSet,
    line: &TextLine,
    line_x: f32,
    baseline_y: f32,
    links: &mut Vec<LinkAnnotation>,
) {
    if line.chunks.is_empty() {
        return;
    }

    let mut current_color: Option<[u8; 3]> = None;
    let mut cur_font: Option<(FontStyle, f32)> = None;
    let mut decorations: Vec<(f32, f32, f32, f32, Option<[u8; 3]>)> = Vec::new();

    content.begin_text();
    let mut td_x = 0.0_f32;
    let mut td_y = 0.0_f32;

    for chunk in &line.chunks {
        let x = line_x + chunk.x_offset;

        if chunk.color != current_color {
            set_fill(content, chunk.color);
            current_color = chunk.color;
        }

        if cur_font != Some((chunk.font, chunk.font_size)) {
            let entry = fonts.get(chunk.font);
            content.set_font(Name(entry.pdf_name.as_bytes()), chunk.font_size);
            cur_font = Some((chunk.font, chunk.font_size));
        }

        content.next_line(x - td_x, baseline_y - td_y);
        td_x = x;
        td_y = baseline_y;

        let bytes = fonts.get_mut(chunk.font).encode(&chunk.text);
        content.show(Str(&bytes));

        if chunk.underline {
            let thick = (chunk.font_size * 0.05).max(0.5);
            let ul_y = baseline_y - chunk.font_size * 0.12;
            decorations.push((x, ul_y - thick, chunk.width, thick, chunk.color));
        }

        if let Some(ref url) = chunk.hyperlink_url {
            let bottom = baseline_y - chunk.font_size * 0.2;
            let top = baseline_y + chunk.font_size * 0.8;
            let merged = links
                .last_mut()
                .filter(|prev| prev.url == *url && (prev.rect.y1 - bottom).abs() < 1.0);
            if let Some(prev) = merged {
                prev.rect.x2 = x + chunk.width;
            } else {
                links.push(LinkAnnotation {
                    rect: Rect::new(x, bottom, x + chunk.width, top),
                    url: url.clone(),
                });
            }
        }
    }
    content.end_text();

    for &(dx, dy, dw, dh, dcolor) in &decorations {
        if dcolor != current_color {
            set_fill(content, dcolor);
            current_color = dcolor;
        }
        content.rect(dx, dy, dw, dh).fill_nonzero();
    }
    if current_color.is_some() {
        content.set_fill_gray(0.0);
    }
}
