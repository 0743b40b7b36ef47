use std::ops::RangeInclusive;

use serde::Deserialize;

use crate::error::Error;
use crate::markup::parse_hex_color;
use crate::model::{Alignment, Table, TableCell, TableRow};

/// One cell of an input table: plain text (markup allowed) or text with its
/// own styling.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Styled(StyledCell),
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StyledCell {
    pub content: String,
    pub bold: bool,
    /// `RRGGBB`
    pub text_color: Option<String>,
    /// `RRGGBB`
    pub background_color: Option<String>,
    pub align: Option<Alignment>,
    pub size: Option<f32>,
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<StyledCell> for Cell {
    fn from(s: StyledCell) -> Self {
        Cell::Styled(s)
    }
}

pub type Rows = Vec<Vec<Cell>>;

/// Build rows of cells from string literals.
pub fn rows<R, C>(input: R) -> Rows
where
    R: IntoIterator,
    R::Item: IntoIterator<Item = C>,
    C: Into<Cell>,
{
    input
        .into_iter()
        .map(|row| row.into_iter().map(Into::into).collect())
        .collect()
}

/// Rows that get a bottom border: every row but the last.
///
/// Tables with a header need at least one data row, so fewer than two rows
/// is an error rather than an empty range.
pub fn bottom_border_rows(table: &'static str, row_count: usize) -> Result<RangeInclusive<usize>, Error> {
    if row_count < 2 {
        return Err(Error::InvalidTableShape {
            table,
            rows: row_count,
        });
    }
    Ok(0..=row_count - 2)
}

fn color(value: &Option<String>) -> Option<[u8; 3]> {
    let raw = value.as_deref()?;
    let parsed = parse_hex_color(raw);
    if parsed.is_none() {
        log::warn!("ignoring invalid cell color {raw:?}");
    }
    parsed
}

fn table_cell(cell: &Cell, base: &TableCell) -> TableCell {
    match cell {
        Cell::Text(text) => TableCell {
            content: text.clone(),
            ..base.clone()
        },
        Cell::Styled(styled) => {
            let mut out = TableCell {
                content: styled.content.clone(),
                ..base.clone()
            };
            out.bold |= styled.bold;
            out.text_color = color(&styled.text_color).or(out.text_color);
            out.background = color(&styled.background_color).or(out.background);
            out.align = styled.align.unwrap_or(out.align);
            out.font_size = styled.size.or(out.font_size);
            out
        }
    }
}

/// Build a drawing table from input rows. Every cell starts from `base`, then
/// takes its own styling; the section adjusts rows afterwards.
pub(super) fn build_table(rows: &[Vec<Cell>], base: &TableCell) -> Table {
    Table::new(
        rows.iter()
            .map(|row| TableRow {
                cells: row.iter().map(|c| table_cell(c, base)).collect(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_rows_but_last_get_borders() {
        assert_eq!(bottom_border_rows("line_items", 2).unwrap(), 0..=0);
        assert_eq!(bottom_border_rows("line_items", 5).unwrap(), 0..=3);
    }

    #[test]
    fn short_tables_are_rejected() {
        for n in [0, 1] {
            let err = bottom_border_rows("total_items", n).unwrap_err();
            assert!(matches!(
                err,
                Error::InvalidTableShape {
                    table: "total_items",
                    rows
                } if rows == n
            ));
        }
    }

    #[test]
    fn styled_cells_override_base() {
        let base = TableCell {
            inline_format: true,
            ..TableCell::new("")
        };
        let input = vec![vec![
            Cell::from("plain"),
            Cell::Styled(StyledCell {
                content: "$20".into(),
                bold: true,
                text_color: Some("#ff0000".into()),
                background_color: Some("nonsense".into()),
                align: Some(Alignment::Right),
                size: None,
            }),
        ]];
        let table = build_table(&input, &base);
        let cells = &table.rows[0].cells;
        assert_eq!(cells[0].content, "plain");
        assert!(cells[0].inline_format && !cells[0].bold);
        assert!(cells[1].bold);
        assert_eq!(cells[1].text_color, Some([255, 0, 0]));
        assert_eq!(cells[1].background, None);
        assert_eq!(cells[1].align, Alignment::Right);
    }

    #[test]
    fn untagged_cells_deserialize_from_json() {
        let parsed: Rows =
            serde_json::from_str(r#"[["Item", {"content": "Total", "bold": true}]]"#).unwrap();
        assert_eq!(parsed[0][0], Cell::from("Item"));
        assert!(matches!(&parsed[0][1], Cell::Styled(s) if s.bold && s.content == "Total"));
    }
}
