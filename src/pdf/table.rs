use crate::markup::{self, Span};
use crate::model::{CellBorder, CellVAlign, Overflow, Table, TableCell, TablePosition};

use super::layout::{
    RunDefaults, TextLine, build_lines, fill_rect, line_start_x, min_width, natural_width,
    render_line,
};
use super::{Canvas, DEFAULT_FONT_SIZE};

fn cell_spans(cell: &TableCell) -> Vec<Span> {
    if cell.inline_format {
        markup::parse(&cell.content)
    } else {
        markup::literal(&cell.content)
    }
}

fn cell_defaults(cell: &TableCell) -> RunDefaults {
    RunDefaults {
        bold: cell.bold,
        color: cell.text_color,
        font_size: cell.font_size.unwrap_or(DEFAULT_FONT_SIZE),
    }
}

/// Distribute `target` across columns. Hinted columns keep their width; the
/// rest grow in proportion to their natural width when there is room, and
/// shrink towards their minimum width when there is not. Columns never go
/// below their minimum, so content that cannot wrap pushes the table wider.
pub(super) fn fit_columns(
    natural: &[f32],
    minimum: &[f32],
    hints: &[Option<f32>],
    target: f32,
) -> Vec<f32> {
    let ncols = natural.len();
    let hint = |i: usize| hints.get(i).copied().flatten();
    let fixed_total: f32 = (0..ncols).filter_map(hint).sum();
    let free: Vec<usize> = (0..ncols).filter(|&i| hint(i).is_none()).collect();

    let remaining = (target - fixed_total).max(0.0);
    let free_nat: f32 = free.iter().map(|&i| natural[i]).sum();
    let free_min: f32 = free.iter().map(|&i| minimum[i]).sum();

    (0..ncols)
        .map(|i| {
            if let Some(w) = hint(i) {
                return w;
            }
            if free_nat <= remaining {
                let extra = remaining - free_nat;
                if free_nat > 0.0 {
                    natural[i] + extra * natural[i] / free_nat
                } else {
                    remaining / free.len() as f32
                }
            } else if free_min < remaining {
                let ratio = (remaining - free_min) / (free_nat - free_min);
                minimum[i] + (natural[i] - minimum[i]) * ratio
            } else {
                minimum[i]
            }
        })
        .collect()
}

struct CellLayout {
    lines: Vec<TextLine>,
    content_h: f32,
    line_h: f32,
    ascent: f32,
}

impl Canvas {
    fn column_widths(&self, table: &Table) -> Vec<f32> {
        let ncols = table.column_count();
        let mut natural = vec![0.0f32; ncols];
        let mut minimum = vec![0.0f32; ncols];

        for row in &table.rows {
            for (c, cell) in row.cells.iter().enumerate() {
                let spans = cell_spans(cell);
                let defaults = cell_defaults(cell);
                let pad_h = cell.padding.left + cell.padding.right;
                let nat = natural_width(&spans, &self.fonts, defaults) + pad_h;
                let min = match cell.overflow {
                    Overflow::Expand => nat,
                    Overflow::Wrap => min_width(&spans, &self.fonts, defaults) + pad_h,
                };
                natural[c] = natural[c].max(nat);
                minimum[c] = minimum[c].max(min);
            }
        }

        let target = table.width.unwrap_or_else(|| {
            let wanted: f32 = (0..ncols)
                .map(|i| {
                    table
                        .column_widths
                        .get(i)
                        .copied()
                        .flatten()
                        .unwrap_or(natural[i])
                })
                .sum();
            wanted.min(self.bounds_width())
        });
        fit_columns(&natural, &minimum, &table.column_widths, target)
    }

    fn layout_cell(&self, cell: &TableCell, col_w: f32) -> CellLayout {
        let defaults = cell_defaults(cell);
        let text_w = (col_w - cell.padding.left - cell.padding.right).max(0.0);
        let lines = build_lines(&cell_spans(cell), &self.fonts, defaults, text_w);
        let line_h = self.line_height(defaults.font_size);
        CellLayout {
            content_h: lines.len().max(1) as f32 * line_h,
            lines,
            line_h,
            ascent: self.ascent(defaults.font_size),
        }
    }

    /// Draw a table at the cursor and move the cursor below its last row.
    /// Rows that do not fit on the current page move to the next one.
    pub fn table(&mut self, table: &Table) {
        let col_widths = self.column_widths(table);
        let total_w: f32 = col_widths.iter().sum();
        let table_left = match table.position {
            TablePosition::Left => self.bounds_left(),
            TablePosition::Right => self.bounds_left() + self.bounds_width() - total_w,
        };
        let col_x: Vec<f32> = col_widths
            .iter()
            .scan(table_left, |x, w| {
                let start = *x;
                *x += w;
                Some(start)
            })
            .collect();

        for (ri, row) in table.rows.iter().enumerate() {
            let layouts: Vec<CellLayout> = row
                .cells
                .iter()
                .zip(&col_widths)
                .map(|(cell, &w)| self.layout_cell(cell, w))
                .collect();
            let row_h = row
                .cells
                .iter()
                .zip(&layouts)
                .map(|(cell, l)| l.content_h + cell.padding.top + cell.padding.bottom)
                .fold(0.0f32, f32::max);

            self.ensure_room(row_h);
            let row_top = self.y;
            let row_bottom = row_top - row_h;
            log::debug!(
                "TABLE row={} row_h={:.2} cells={} top={:.2}",
                ri,
                row_h,
                row.cells.len(),
                row_top
            );

            for (ci, (cell, layout)) in row.cells.iter().zip(&layouts).enumerate() {
                let (cell_x, col_w) = (col_x[ci], col_widths[ci]);

                if let Some(bg) = cell.background {
                    fill_rect(&mut self.content, bg, cell_x, row_bottom, col_w, row_h);
                }

                let pad = &cell.padding;
                let avail = row_h - pad.top - pad.bottom;
                let offset = match cell.v_align {
                    CellVAlign::Top => 0.0,
                    CellVAlign::Center => ((avail - layout.content_h) / 2.0).max(0.0),
                    CellVAlign::Bottom => (avail - layout.content_h).max(0.0),
                };
                let text_x = cell_x + pad.left;
                let text_w = (col_w - pad.left - pad.right).max(0.0);
                let mut baseline_y = row_top - pad.top - offset - layout.ascent;
                for line in &layout.lines {
                    let lx = line_start_x(line, cell.align, text_x, text_w);
                    render_line(
                        &mut self.content,
                        &mut self.fonts,
                        line,
                        lx,
                        baseline_y,
                        &mut self.links,
                    );
                    baseline_y -= layout.line_h;
                }

                let b = &cell.borders;
                let content = &mut self.content;
                let mut draw_border = |border: &CellBorder, x1: f32, y1: f32, x2: f32, y2: f32| {
                    if !border.present {
                        return;
                    }
                    content.save_state();
                    content.set_line_width(border.width);
                    if let Some([r, g, b]) = border.color {
                        content.set_stroke_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
                    }
                    content.move_to(x1, y1);
                    content.line_to(x2, y2);
                    content.stroke();
                    content.restore_state();
                };
                draw_border(&b.top, cell_x, row_top, cell_x + col_w, row_top);
                draw_border(&b.bottom, cell_x, row_bottom, cell_x + col_w, row_bottom);
                draw_border(&b.left, cell_x, row_top, cell_x, row_bottom);
                draw_border(&b.right, cell_x + col_w, row_top, cell_x + col_w, row_bottom);
            }

            self.y = row_bottom;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spare_width_follows_natural_proportions() {
        let widths = fit_columns(&[100.0, 50.0], &[20.0, 20.0], &[], 300.0);
        assert!((widths[0] - 200.0).abs() < 1e-3);
        assert!((widths[1] - 100.0).abs() < 1e-3);
    }

    #[test]
    fn hinted_columns_keep_their_width() {
        let widths = fit_columns(&[100.0, 50.0, 50.0], &[10.0; 3], &[Some(40.0)], 240.0);
        assert_eq!(widths[0], 40.0);
        assert!((widths[1] + widths[2] - 200.0).abs() < 1e-3);
    }

    #[test]
    fn shrinks_towards_minimum_but_not_below() {
        let widths = fit_columns(&[200.0, 200.0], &[50.0, 150.0], &[], 300.0);
        assert!((widths.iter().sum::<f32>() - 300.0).abs() < 1e-3);
        assert!(widths[0] >= 50.0 && widths[1] >= 150.0);

        let overflowing = fit_columns(&[200.0, 200.0], &[150.0, 150.0], &[], 200.0);
        assert_eq!(overflowing, vec![150.0, 150.0]);
    }
}
