use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum CellVAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

/// Page dimensions in points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageSize {
    #[default]
    Letter,
    Legal,
    A4,
}

impl PageSize {
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::A4 => (595.28, 841.89),
        }
    }
}

/// How a cell's text behaves when it is wider than its column.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Overflow {
    /// Wrap at word boundaries; the column may shrink to its longest word.
    #[default]
    Wrap,
    /// The column never shrinks below the cell's unwrapped line width; the
    /// table grows past its nominal width instead.
    Expand,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub bold: bool,
    pub color: Option<[u8; 3]>,
    pub align: Alignment,
    pub background: Option<[u8; 3]>,
    pub inline_format: bool,
}

impl TextStyle {
    pub fn sized(size: f32) -> Self {
        Self {
            size,
            bold: false,
            color: None,
            align: Alignment::Left,
            background: None,
            inline_format: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn color(mut self, rgb: [u8; 3]) -> Self {
        self.color = Some(rgb);
        self
    }

    pub fn align(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }

    pub fn background(mut self, rgb: [u8; 3]) -> Self {
        self.background = Some(rgb);
        self
    }

    pub fn inline_format(mut self) -> Self {
        self.inline_format = true;
        self
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CellBorder {
    pub present: bool,
    pub color: Option<[u8; 3]>,
    pub width: f32,
}

impl Default for CellBorder {
    fn default() -> Self {
        Self {
            present: false,
            color: None,
            width: 1.0,
        }
    }
}

impl CellBorder {
    pub fn visible(color: Option<[u8; 3]>, width: f32) -> Self {
        Self {
            present: true,
            color,
            width,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CellBorders {
    pub top: CellBorder,
    pub bottom: CellBorder,
    pub left: CellBorder,
    pub right: CellBorder,
}

impl CellBorders {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all(color: Option<[u8; 3]>) -> Self {
        let b = CellBorder::visible(color, 1.0);
        Self {
            top: b,
            bottom: b,
            left: b,
            right: b,
        }
    }

    pub fn bottom(color: Option<[u8; 3]>) -> Self {
        Self {
            bottom: CellBorder::visible(color, 1.0),
            ..Self::default()
        }
    }
}

/// Cell padding, in the `[top, right, bottom, left]` order used by the
/// receipt sections.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellMargins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl CellMargins {
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn uniform(p: f32) -> Self {
        Self::new(p, p, p, p)
    }
}

impl Default for CellMargins {
    fn default() -> Self {
        Self::uniform(5.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum TablePosition {
    #[default]
    Left,
    Right,
}

#[derive(Clone, Debug)]
pub struct TableCell {
    pub content: String,
    pub inline_format: bool,
    pub font_size: Option<f32>,
    pub bold: bool,
    pub text_color: Option<[u8; 3]>,
    pub background: Option<[u8; 3]>,
    pub borders: CellBorders,
    pub padding: CellMargins,
    pub align: Alignment,
    pub v_align: CellVAlign,
    pub overflow: Overflow,
}

impl TableCell {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            inline_format: false,
            font_size: None,
            bold: false,
            text_color: None,
            background: None,
            borders: CellBorders::all(None),
            padding: CellMargins::default(),
            align: Alignment::Left,
            v_align: CellVAlign::Top,
            overflow: Overflow::Wrap,
        }
    }
}

#[derive(Debug)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug)]
pub struct Table {
    pub rows: Vec<TableRow>,
    /// Total table width; `None` sizes the table to its natural width, capped
    /// at the available width.
    pub width: Option<f32>,
    /// Per-column width hints. Missing or `None` entries are auto-sized.
    pub column_widths: Vec<Option<f32>>,
    pub position: TablePosition,
}

impl Table {
    pub fn new(rows: Vec<TableRow>) -> Self {
        Self {
            rows,
            width: None,
            column_widths: Vec::new(),
            position: TablePosition::Left,
        }
    }

    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }

    pub fn row(&mut self, index: usize) -> impl Iterator<Item = &mut TableCell> {
        self.rows
            .get_mut(index)
            .into_iter()
            .flat_map(|r| r.cells.iter_mut())
    }
}

/// Decoded image ready for embedding.
#[derive(Clone)]
pub struct EmbeddedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageFormat {
    Jpeg,
    Other,
}
