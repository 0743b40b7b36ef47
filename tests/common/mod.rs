#![allow(dead_code)]

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use receipt_pdf::{CallOverrides, Company, PaymentLink, ReceiptOptions, rows};

/// The reference receipt: Acme billing Bob for two widgets.
pub fn scenario() -> ReceiptOptions {
    ReceiptOptions {
        overrides: CallOverrides {
            title: Some("Invoice".into()),
            total_text: Some("$20.00".into()),
            payment_link: Some(PaymentLink {
                url: "https://pay/1".into(),
                text: "Pay now".into(),
            }),
            ..CallOverrides::default()
        },
        company: Some(Company {
            email: Some("a@acme.com".into()),
            ..Company::new("Acme")
        }),
        details: Some(rows([["No.", "INV-1"]])),
        recipient: Some(vec!["Bob".into(), "55 Main St".into()]),
        line_items: Some(rows([["Item", "Qty"], ["Widget", "2"]])),
        total_items: Some(rows([["Subtotal", "$20"], ["Total", "$20"]])),
        ..ReceiptOptions::default()
    }
}

pub fn company(options: &mut ReceiptOptions) -> &mut Company {
    options.company.as_mut().expect("scenario has a company")
}

/// Small opaque PNG for logo tests.
pub fn png_logo(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([0x32, 0x6d, 0x92, 0xff]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode png");
    buf
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Every stream in the file that inflates, decoded lossily. Page content
/// streams are among them, so shown strings like `(Acme) Tj` can be searched.
pub fn inflated_streams(pdf: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(start) = find(pdf, b"stream\n", pos) {
        pos = start + 7;
        if start >= 3 && &pdf[start - 3..start] == b"end" {
            continue;
        }
        let Some(end) = find(pdf, b"\nendstream", pos) else {
            break;
        };
        if let Ok(data) = miniz_oxide::inflate::decompress_to_vec_zlib(&pdf[pos..end]) {
            out.push(String::from_utf8_lossy(&data).into_owned());
        }
        pos = end;
    }
    out
}

/// All inflated stream text joined together.
pub fn page_text(pdf: &[u8]) -> String {
    inflated_streams(pdf).join("\n")
}

/// Number of `Tj` operands exactly equal to `word`.
pub fn shown(pdf_text: &str, word: &str) -> usize {
    pdf_text.matches(&format!("({word}) Tj")).count()
}

pub fn raw_contains(pdf: &[u8], needle: &str) -> bool {
    find(pdf, needle.as_bytes(), 0).is_some()
}

pub fn page_count(pdf: &[u8]) -> usize {
    let text = String::from_utf8_lossy(pdf);
    text.match_indices("/Type /Page")
        .filter(|(i, m)| text[i + m.len()..].chars().next() != Some('s'))
        .count()
}
