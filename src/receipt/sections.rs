//! The fixed receipt layout, one function per section, each drawing at the
//! canvas cursor and leaving it below what it drew.

use serde::Deserialize;

use crate::error::Error;
use crate::model::{
    Alignment, CellBorders, CellMargins, CellVAlign, Overflow, Table, TableCell, TablePosition,
    TableRow, TextStyle,
};
use crate::pdf::{Canvas, DEFAULT_FONT_SIZE};

use super::cells::{Cell, bottom_border_rows, build_table};
use super::company::{Company, HeaderIdentity, PaymentLink, non_blank};

const LINK_BLUE: &str = "326d92";
const NAME_GRAY: [u8; 3] = [0x4b, 0x55, 0x63];
const DARK_TEXT: [u8; 3] = [0x33, 0x33, 0x33];
const HEADER_FILL: [u8; 3] = [0x3c, 0x3d, 0x3a];
const WHITE: [u8; 3] = [0xff, 0xff, 0xff];
const SHADE: [u8; 3] = [0xf5, 0xf4, 0xf3];
const RULE: [u8; 3] = [0xee, 0xee, 0xee];

const PAYMENT_INDENT: f32 = 20.0;
const PAYMENT_WIDTH: f32 = 100.0;
/// How far the totals table is pulled up beside the payment button.
const TOTALS_OVERLAP: f32 = 50.0;
const TOTALS_WIDTH_RATIO: f32 = 0.41;
const SIGNATURE_GAP: f32 = 20.0;
const SIGNATURE_HEIGHT: f32 = 50.0;

/// Space above each section.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SectionMargins {
    pub details: f32,
    pub billing: f32,
    pub line_items: f32,
    pub totals: f32,
    pub signature: f32,
    pub footer: f32,
}

impl Default for SectionMargins {
    fn default() -> Self {
        Self {
            details: 16.0,
            billing: 16.0,
            line_items: 30.0,
            totals: 30.0,
            signature: 30.0,
            footer: 30.0,
        }
    }
}

fn borderless(padding: CellMargins) -> TableCell {
    TableCell {
        inline_format: true,
        borders: CellBorders::none(),
        padding,
        ..TableCell::new("")
    }
}

/// Company identity in the top-right corner, then title and subtitle. The
/// cursor goes back up by the logo height so the title starts level with
/// the identity.
pub(super) fn header(
    canvas: &mut Canvas,
    company: &Company,
    title: &str,
    subtitle: Option<&str>,
    logo_height: f32,
) -> Result<(), Error> {
    match company.identity() {
        HeaderIdentity::Logo(logo) => {
            let bytes = logo.load()?;
            canvas.image(&bytes, &logo.location(), logo_height, Alignment::Right)?;
        }
        HeaderIdentity::Name(name) => {
            let style = TextStyle::sized(16.0)
                .bold()
                .align(Alignment::Right)
                .color(NAME_GRAY);
            canvas.text(name, &style);
        }
    }
    canvas.move_up(logo_height);

    canvas.text(title, &TextStyle::sized(32.0).bold());
    if let Some(subtitle) = subtitle {
        canvas.text(subtitle, &TextStyle::sized(16.0).bold().color(DARK_TEXT));
    }
    Ok(())
}

pub(super) fn details(canvas: &mut Canvas, rows: &[Vec<Cell>], margin_top: f32) {
    canvas.move_down(margin_top);
    let table = build_table(rows, &borderless(CellMargins::new(2.0, 8.0, 3.0, 2.0)));
    canvas.table(&table);
}

/// Seller column text: bold seller key and name, the selected contact
/// fields, a blank line, then the IBAN text.
pub(super) fn seller_block(company: &Company) -> String {
    let mut lines: Vec<String> = Vec::new();
    if !company.seller_key.is_empty() {
        lines.push(format!("<b>{}</b>", company.seller_key));
    }
    lines.push(format!("<b>{}</b>", company.name));
    lines.extend(company.displayed_values().into_iter().map(str::to_string));
    if !company.iban_text.is_empty() {
        lines.push(String::new());
        lines.push(company.iban_text.clone());
    }
    lines.join("\n")
}

pub(super) fn billing(canvas: &mut Canvas, company: &Company, recipient: &[String], margin_top: f32) {
    canvas.move_down(margin_top);
    let cell = |content: String| TableCell {
        content,
        overflow: Overflow::Expand,
        ..borderless(CellMargins::new(2.0, 12.0, 3.0, 2.0))
    };
    let mut table = Table::new(vec![TableRow {
        cells: vec![cell(seller_block(company)), cell(recipient.join("\n"))],
    }]);
    table.width = Some(canvas.bounds_width());
    canvas.table(&table);
}

/// Apply the striped-rule look shared by the line items and totals tables:
/// padding 6, and a light bottom rule under every row but the last.
fn rule_rows(table: &mut Table, name: &'static str) -> Result<(), Error> {
    let bordered = bottom_border_rows(name, table.rows.len())?;
    for (i, row) in table.rows.iter_mut().enumerate() {
        let borders = if bordered.contains(&i) {
            CellBorders::bottom(Some(RULE))
        } else {
            CellBorders::none()
        };
        for cell in &mut row.cells {
            cell.padding = CellMargins::uniform(6.0);
            cell.borders = borders;
        }
    }
    Ok(())
}

pub(super) fn line_items(
    canvas: &mut Canvas,
    rows: &[Vec<Cell>],
    column_widths: &[Option<f32>],
    margin_top: f32,
) -> Result<(), Error> {
    canvas.move_down(margin_top);
    let mut table = build_table(rows, &borderless(CellMargins::uniform(6.0)));
    table.width = Some(canvas.bounds_width());
    table.column_widths = column_widths.to_vec();
    for cell in table.row(0) {
        cell.bold = true;
        cell.background = Some(HEADER_FILL);
        cell.text_color = Some(WHITE);
    }
    rule_rows(&mut table, "line_items")?;
    canvas.table(&table);
    Ok(())
}

fn payment_button(canvas: &mut Canvas, link: &PaymentLink) {
    let content = format!(
        "<link href='{}'><color rgb='{LINK_BLUE}'><b>{}</b></color></link>",
        link.url, link.text
    );
    let cell = TableCell {
        inline_format: true,
        borders: CellBorders::all(Some([0, 0, 0])),
        padding: CellMargins::uniform(10.0),
        align: Alignment::Center,
        v_align: CellVAlign::Center,
        ..TableCell::new(content)
    };
    let mut table = Table::new(vec![TableRow { cells: vec![cell] }]);
    table.width = Some(PAYMENT_WIDTH);
    canvas.indent(PAYMENT_INDENT, |c| c.table(&table));
}

/// Right-hand totals table: bold first row, shaded last row, ruled like
/// the line items.
fn totals_table(
    rows: &[Vec<Cell>],
    column_widths: &[Option<f32>],
    bounds_width: f32,
) -> Result<Table, Error> {
    let mut table = build_table(rows, &borderless(CellMargins::uniform(6.0)));
    table.width = Some(bounds_width * TOTALS_WIDTH_RATIO);
    table.column_widths = column_widths.to_vec();
    table.position = TablePosition::Right;
    for cell in table.row(0) {
        cell.bold = true;
        cell.text_color = Some(DARK_TEXT);
    }
    let last = table.rows.len().saturating_sub(1);
    for cell in table.row(last) {
        cell.background = Some(SHADE);
    }
    rule_rows(&mut table, "total_items")?;
    Ok(table)
}

pub(super) struct Totals<'a> {
    pub payment_link: &'a PaymentLink,
    pub total_text: &'a str,
    pub total_text_in_words: Option<&'a str>,
}

/// Payment button on the left, totals table on the right pulled up beside
/// it, then the total amount and the amount in words as a shaded strip.
pub(super) fn totals(
    canvas: &mut Canvas,
    totals: &Totals<'_>,
    rows: &[Vec<Cell>],
    column_widths: &[Option<f32>],
    margin_top: f32,
) -> Result<(), Error> {
    canvas.move_down(margin_top);
    payment_button(canvas, totals.payment_link);
    canvas.move_up(TOTALS_OVERLAP);

    let table = totals_table(rows, column_widths, canvas.bounds_width())?;
    canvas.table(&table);

    canvas.move_down(margin_top);
    let strip = TextStyle::sized(16.0)
        .bold()
        .align(Alignment::Right)
        .background(SHADE)
        .color(DARK_TEXT);
    canvas.text(totals.total_text, &strip);
    canvas.move_down(2.0);
    if let Some(words) = totals.total_text_in_words {
        let strip = TextStyle::sized(10.0)
            .align(Alignment::Right)
            .background(SHADE)
            .color(DARK_TEXT);
        canvas.text(words, &strip);
    }
    Ok(())
}

/// Two outlined boxes side by side: collection signature on the left, the
/// issuer's name and signature on the right. Missing texts leave the box
/// empty.
pub(super) fn signature(canvas: &mut Canvas, company: &Company, margin_top: f32) {
    canvas.move_down(margin_top);
    canvas.ensure_room(SIGNATURE_HEIGHT);
    let top = canvas.cursor();
    let half = canvas.bounds_width() / 2.0;
    let box_w = half - SIGNATURE_GAP / 2.0;
    let text_w = box_w - 16.0;
    let plain = TextStyle::sized(DEFAULT_FONT_SIZE);
    let marked = plain.inline_format();

    canvas.bounding_box(0.0, top, box_w, SIGNATURE_HEIGHT, |c, frame| {
        c.stroke_bounds(frame);
        if let Some(text) = non_blank(&company.collection_signature_text) {
            c.text_box(text, frame.x + 8.0, frame.bottom + 18.0, text_w, 20.0, &plain);
        }
    });
    canvas.bounding_box(half + SIGNATURE_GAP / 2.0, top, box_w, SIGNATURE_HEIGHT, |c, frame| {
        c.stroke_bounds(frame);
        if let Some(name) = non_blank(&company.issuer_full_name) {
            c.text_box(name, frame.x + 8.0, frame.bottom + 35.0, text_w, 20.0, &marked);
        }
        if let Some(text) = non_blank(&company.issuer_signature_text) {
            c.text_box(text, frame.x + 8.0, frame.bottom + 18.0, text_w, 20.0, &marked);
        }
    });
}

/// `"{contact_text} {email link}"`, or `None` when the company has no email.
pub(super) fn default_footer(company: &Company) -> Option<String> {
    let email = non_blank(&company.email)?;
    Some(format!(
        "{} <color rgb='{LINK_BLUE}'><link href='mailto:{email}'><b>{email}</b></link></color>",
        company.contact_text()
    ))
}

pub(super) fn footer(canvas: &mut Canvas, message: Option<&str>, margin_top: f32) {
    let Some(message) = message else {
        log::debug!("no footer message");
        return;
    };
    canvas.move_down(margin_top);
    canvas.text(message, &TextStyle::sized(DEFAULT_FONT_SIZE).inline_format());
}
