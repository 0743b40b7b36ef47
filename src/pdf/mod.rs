//! Page canvas: the drawing primitives the receipt sections are built from.
//!
//! Coordinates are PDF points with the origin at the bottom-left of the page.
//! The canvas keeps a vertical cursor that text, images and tables advance
//! downwards; a line or table row that would cross the bottom margin starts a
//! new page.

mod layout;
mod raster;
mod table;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::error::Error;
use crate::fonts::{FontSet, FontStyle};
use crate::markup;
use crate::model::{Alignment, PageSize, TextStyle};

use layout::{LinkAnnotation, RunDefaults, build_lines, fill_rect, line_start_x, render_line};

/// Page margin on all four sides.
pub const PAGE_MARGIN: f32 = 36.0;
/// Font size used when a call does not give one.
pub const DEFAULT_FONT_SIZE: f32 = 8.0;

struct Page {
    content: Content,
    links: Vec<LinkAnnotation>,
}

/// A fixed-size region placed by [`Canvas::bounding_box`], in absolute page
/// coordinates.
#[derive(Clone, Copy, Debug)]
pub struct BoxFrame {
    pub x: f32,
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
}

impl BoxFrame {
    pub fn top(&self) -> f32 {
        self.bottom + self.height
    }
}

pub struct Canvas {
    pdf: Pdf,
    next_id: i32,
    catalog_id: Ref,
    pages_id: Ref,
    fonts: FontSet,
    page_width: f32,
    page_height: f32,
    finished_pages: Vec<Page>,
    content: Content,
    links: Vec<LinkAnnotation>,
    images: Vec<(String, Ref)>,
    /// Absolute y of the cursor.
    y: f32,
    indent: f32,
}

impl Canvas {
    pub fn new(page_size: PageSize, font: Option<&str>) -> Self {
        let (page_width, page_height) = page_size.dimensions();
        let mut canvas = Self {
            pdf: Pdf::new(),
            next_id: 1,
            catalog_id: Ref::new(1),
            pages_id: Ref::new(2),
            fonts: FontSet::load(font),
            page_width,
            page_height,
            finished_pages: Vec::new(),
            content: Content::new(),
            links: Vec::new(),
            images: Vec::new(),
            y: page_height - PAGE_MARGIN,
            indent: 0.0,
        };
        canvas.catalog_id = canvas.alloc();
        canvas.pages_id = canvas.alloc();
        canvas
    }

    fn alloc(&mut self) -> Ref {
        let r = Ref::new(self.next_id);
        self.next_id += 1;
        r
    }

    fn top(&self) -> f32 {
        self.page_height - PAGE_MARGIN
    }

    /// Left edge of the current bounds (page margin plus any indent).
    pub fn bounds_left(&self) -> f32 {
        PAGE_MARGIN + self.indent
    }

    pub fn bounds_width(&self) -> f32 {
        self.page_width - 2.0 * PAGE_MARGIN - self.indent
    }

    /// Distance of the cursor above the bottom margin.
    pub fn cursor(&self) -> f32 {
        self.y - PAGE_MARGIN
    }

    pub fn move_down(&mut self, dy: f32) {
        self.y -= dy;
    }

    pub fn move_up(&mut self, dy: f32) {
        self.y += dy;
    }

    pub fn page_count(&self) -> usize {
        self.finished_pages.len() + 1
    }

    /// Shift the left edge of the bounds by `left` for the duration of `f`.
    pub fn indent<T>(&mut self, left: f32, f: impl FnOnce(&mut Self) -> T) -> T {
        self.indent += left;
        let out = f(self);
        self.indent -= left;
        out
    }

    pub fn start_new_page(&mut self) {
        log::debug!("page break after page {}", self.page_count());
        self.finished_pages.push(Page {
            content: std::mem::replace(&mut self.content, Content::new()),
            links: std::mem::take(&mut self.links),
        });
        self.y = self.top();
    }

    /// Start a new page if `height` does not fit above the bottom margin,
    /// unless the cursor is already at the top of a page.
    pub fn ensure_room(&mut self, height: f32) {
        let at_page_top = (self.y - self.top()).abs() < 1.0;
        if !at_page_top && self.y - height < PAGE_MARGIN {
            self.start_new_page();
        }
    }

    fn spans(text: &str, inline_format: bool) -> Vec<markup::Span> {
        if inline_format {
            markup::parse(text)
        } else {
            markup::literal(text)
        }
    }

    fn line_height(&self, size: f32) -> f32 {
        self.fonts.get(FontStyle::default()).line_height(size)
    }

    fn ascent(&self, size: f32) -> f32 {
        self.fonts.get(FontStyle::default()).ascender_ratio * size
    }

    /// Flow text across the bounds width at the cursor, advancing it by the
    /// height of the wrapped lines.
    pub fn text(&mut self, text: &str, style: &TextStyle) {
        let spans = Self::spans(text, style.inline_format);
        let defaults = RunDefaults {
            bold: style.bold,
            color: style.color,
            font_size: style.size,
        };
        let left = self.bounds_left();
        let width = self.bounds_width();
        let lines = build_lines(&spans, &self.fonts, defaults, width);
        let line_h = self.line_height(style.size);
        let ascent = self.ascent(style.size);

        for line in &lines {
            self.ensure_room(line_h);
            let x = line_start_x(line, style.align, left, width);
            if let Some(bg) = style.background
                && !line.chunks.is_empty()
            {
                fill_rect(&mut self.content, bg, x, self.y - line_h, line.total_width, line_h);
            }
            render_line(
                &mut self.content,
                &mut self.fonts,
                line,
                x,
                self.y - ascent,
                &mut self.links,
            );
            self.y -= line_h;
        }
    }

    /// Draw text inside a fixed box whose top-left corner is at `(x, top)`.
    /// Lines that do not fit in `height` are dropped (the first line is
    /// always drawn). The cursor does not move.
    pub fn text_box(&mut self, text: &str, x: f32, top: f32, width: f32, height: f32, style: &TextStyle) {
        let spans = Self::spans(text, style.inline_format);
        let defaults = RunDefaults {
            bold: style.bold,
            color: style.color,
            font_size: style.size,
        };
        let lines = build_lines(&spans, &self.fonts, defaults, width);
        let line_h = self.line_height(style.size);
        let ascent = self.ascent(style.size);

        let mut line_top = top;
        for (i, line) in lines.iter().enumerate() {
            if i > 0 && top - (line_top - line_h) > height {
                log::debug!("text_box: dropped {} overflowing line(s)", lines.len() - i);
                break;
            }
            let lx = line_start_x(line, style.align, x, width);
            render_line(
                &mut self.content,
                &mut self.fonts,
                line,
                lx,
                line_top - ascent,
                &mut self.links,
            );
            line_top -= line_h;
        }
    }

    /// Draw an image scaled to `height`, aligned within the bounds, and move
    /// the cursor below it.
    pub fn image(&mut self, bytes: &[u8], location: &str, height: f32, align: Alignment) -> Result<(), Error> {
        let img = raster::decode(bytes, location)?;
        let width = height * img.pixel_width as f32 / img.pixel_height as f32;

        let next_id = &mut self.next_id;
        let mut alloc = || {
            let r = Ref::new(*next_id);
            *next_id += 1;
            r
        };
        let xobj_ref = raster::embed(&mut self.pdf, &img, &mut alloc);
        let name = format!("Im{}", self.images.len() + 1);
        self.images.push((name.clone(), xobj_ref));

        self.ensure_room(height);
        let left = self.bounds_left();
        let avail = self.bounds_width();
        let x = match align {
            Alignment::Left => left,
            Alignment::Center => left + (avail - width) / 2.0,
            Alignment::Right => left + avail - width,
        };
        let y_bottom = self.y - height;
        self.content.save_state();
        self.content.transform([width, 0.0, 0.0, height, x, y_bottom]);
        self.content.x_object(Name(name.as_bytes()));
        self.content.restore_state();
        self.y = y_bottom;
        Ok(())
    }

    /// Stroke the outline of a rectangle whose top-left corner is `(x, top)`.
    pub fn stroke_rect(&mut self, x: f32, top: f32, width: f32, height: f32) {
        self.content.save_state();
        self.content.set_line_width(1.0);
        self.content.set_stroke_gray(0.0);
        self.content.rect(x, top - height, width, height);
        self.content.stroke();
        self.content.restore_state();
    }

    /// Place a `width` x `height` box with its top-left corner at `left`
    /// within the bounds and `top` above the bottom margin, run `f` with it,
    /// then leave the cursor at the bottom of the box.
    pub fn bounding_box<T>(
        &mut self,
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        f: impl FnOnce(&mut Self, &BoxFrame) -> T,
    ) -> T {
        let frame = BoxFrame {
            x: self.bounds_left() + left,
            bottom: PAGE_MARGIN + top - height,
            width,
            height,
        };
        let out = f(self, &frame);
        self.y = frame.bottom;
        out
    }

    pub fn stroke_bounds(&mut self, frame: &BoxFrame) {
        self.stroke_rect(frame.x, frame.top(), frame.width, frame.height);
    }

    /// Assemble the document: fonts, page tree, annotations and compressed
    /// content streams.
    pub fn finish(mut self) -> Vec<u8> {
        self.finished_pages.push(Page {
            content: std::mem::replace(&mut self.content, Content::new()),
            links: std::mem::take(&mut self.links),
        });

        let Canvas {
            mut pdf,
            mut next_id,
            catalog_id,
            pages_id,
            fonts,
            page_width,
            page_height,
            finished_pages,
            images,
            ..
        } = self;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };

        let font_pairs = fonts.write_used(&mut pdf, &mut alloc);
        let n = finished_pages.len();
        let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

        let mut page_annot_refs: Vec<Vec<Ref>> = Vec::with_capacity(n);
        for page in &finished_pages {
            let mut refs = Vec::with_capacity(page.links.len());
            for link in &page.links {
                let annot_ref = alloc();
                let mut annot = pdf.annotation(annot_ref);
                annot
                    .subtype(pdf_writer::types::AnnotationType::Link)
                    .rect(link.rect)
                    .border(0.0, 0.0, 0.0, None);
                annot
                    .action()
                    .action_type(pdf_writer::types::ActionType::Uri)
                    .uri(Str(link.url.as_bytes()));
                refs.push(annot_ref);
            }
            page_annot_refs.push(refs);
        }

        for (i, page) in finished_pages.into_iter().enumerate() {
            let raw = page.content.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
        }

        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);

        for i in 0..n {
            let mut page = pdf.page(page_ids[i]);
            page.media_box(Rect::new(0.0, 0.0, page_width, page_height))
                .parent(pages_id)
                .contents(content_ids[i]);
            if !page_annot_refs[i].is_empty() {
                page.annotations(page_annot_refs[i].iter().copied());
            }
            let mut resources = page.resources();
            {
                let mut font_dict = resources.fonts();
                for (name, font_ref) in &font_pairs {
                    font_dict.pair(Name(name.as_bytes()), *font_ref);
                }
            }
            if !images.is_empty() {
                let mut xobjects = resources.x_objects();
                for (name, xobj_ref) in &images {
                    xobjects.pair(Name(name.as_bytes()), *xobj_ref);
                }
            }
        }

        pdf.finish()
    }
}
