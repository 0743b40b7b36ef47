mod common;

use common::{company, inflated_streams, page_count, page_text, png_logo, raw_contains, scenario, shown};
use receipt_pdf::{
    CompanyField, Error, Logo, Receipt, ReceiptOptions, TemplateDefaults, render_receipt, rows,
    write_receipt,
};

fn render(options: ReceiptOptions) -> Vec<u8> {
    let _ = env_logger::builder().is_test(true).try_init();
    render_receipt(options, &TemplateDefaults::default()).expect("render")
}

#[test]
fn scenario_renders_every_section_on_one_page() {
    let pdf = render(scenario());
    assert!(pdf.starts_with(b"%PDF-"));
    assert_eq!(page_count(&pdf), 1);

    let text = page_text(&pdf);
    for word in ["Acme", "Bob", "Widget", "Pay", "now", "$20.00", "a@acme.com", "INV-1"] {
        assert!(shown(&text, word) > 0, "missing {word}");
    }
    assert!(raw_contains(&pdf, "https://pay/1"));
    assert!(raw_contains(&pdf, "mailto:a@acme.com"));
}

#[test]
fn identical_input_gives_identical_bytes() {
    assert_eq!(render(scenario()), render(scenario()));
}

#[test]
fn name_is_drawn_only_without_a_logo() {
    // "Acme" also heads the seller block, so the header adds a second one.
    let named = page_text(&render(scenario()));
    assert_eq!(shown(&named, "Acme"), 2);

    let mut options = scenario();
    company(&mut options).logo = Some(Logo::Bytes(png_logo(40, 20)));
    let pdf = render(options);
    assert_eq!(shown(&page_text(&pdf), "Acme"), 1);
    assert!(raw_contains(&pdf, "/Subtype /Image"));
}

#[test]
fn logo_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logo.png");
    std::fs::write(&path, png_logo(30, 30)).unwrap();

    let mut options = scenario();
    company(&mut options).logo = Some(Logo::Path(path));
    options.logo_height = Some(32.0);
    assert!(raw_contains(&render(options), "/Subtype /Image"));
}

#[test]
fn broken_logo_is_an_error_not_a_blank_header() {
    let mut options = scenario();
    company(&mut options).logo = Some(Logo::Bytes(b"not an image".to_vec()));
    let receipt = Receipt::new(options, &TemplateDefaults::default()).unwrap();
    assert!(matches!(receipt.render(), Err(Error::ImageLoad { .. })));
}

#[test]
fn unselected_address_stays_out_of_billing() {
    let mut options = scenario();
    let acme = company(&mut options);
    acme.address = Some("Elm Street 9".into());
    acme.phone = Some("555-0100".into());

    let text = page_text(&render(options.clone()));
    assert_eq!(shown(&text, "Elm"), 1);

    company(&mut options).display_fields = Some(vec![CompanyField::Phone, CompanyField::Email]);
    let text = page_text(&render(options));
    assert_eq!(shown(&text, "Elm"), 0);
    assert_eq!(shown(&text, "555-0100"), 1);
}

#[test]
fn default_footer_needs_an_email() {
    let text = page_text(&render(scenario()));
    assert_eq!(shown(&text, "Contact"), 1);

    let mut options = scenario();
    company(&mut options).email = None;
    let pdf = render(options);
    assert_eq!(shown(&page_text(&pdf), "Contact"), 0);
    assert!(!raw_contains(&pdf, "mailto:"));
}

#[test]
fn explicit_footer_replaces_contact_line() {
    let mut options = scenario();
    options.footer = Some("Thank you for your <b>business</b>".into());
    let text = page_text(&render(options));
    assert_eq!(shown(&text, "business"), 1);
    assert_eq!(shown(&text, "Contact"), 0);
}

#[test]
fn signature_texts_are_optional() {
    let mut options = scenario();
    let acme = company(&mut options);
    acme.collection_signature_text = Some("Received".into());
    acme.issuer_full_name = Some("<b>Jane</b> Doe".into());
    acme.issuer_signature_text = Some("Issued".into());
    let text = page_text(&render(options));
    for word in ["Received", "Jane", "Doe", "Issued"] {
        assert_eq!(shown(&text, word), 1, "{word}");
    }

    let text = page_text(&render(scenario()));
    assert_eq!(shown(&text, "Received"), 0);
}

#[test]
fn totals_strip_includes_amount_in_words() {
    let mut options = scenario();
    options.overrides.total_text_in_words = Some("twenty dollars".into());
    let text = page_text(&render(options));
    assert_eq!(shown(&text, "twenty"), 1);
    assert_eq!(shown(&text, "dollars"), 1);
}

#[test]
fn long_item_lists_flow_onto_more_pages() {
    let mut items = vec![["Item".to_string(), "Qty".to_string()]];
    items.extend((1..=150).map(|i| [format!("Widget-{i}"), i.to_string()]));

    let mut options = scenario();
    options.line_items = Some(rows(items));
    let pdf = render(options);
    assert!(page_count(&pdf) > 1);
    assert!(inflated_streams(&pdf).iter().any(|s| s.contains("(Widget-150) Tj")));
}

#[test]
fn single_row_totals_are_rejected() {
    let mut options = scenario();
    options.total_items = Some(rows([["Total", "$20"]]));
    let err = render_receipt(options, &TemplateDefaults::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidTableShape {
            table: "total_items",
            rows: 1
        }
    ));
}

#[test]
fn missing_payment_link_is_reported_before_rendering() {
    let mut options = scenario();
    options.overrides.payment_link = None;
    let err = Receipt::new(options, &TemplateDefaults::default()).unwrap_err();
    assert_eq!(err.to_string(), "missing required field `payment_link`");
}

#[test]
fn empty_receipt_is_a_blank_page() {
    let defaults = TemplateDefaults {
        title: Some("Receipt".into()),
        ..TemplateDefaults::default()
    };
    let receipt = Receipt::new(ReceiptOptions::default(), &defaults).unwrap();
    assert!(receipt.is_empty());
    assert_eq!(receipt.context().title.as_deref(), Some("Receipt"));

    let pdf = receipt.render().unwrap();
    assert_eq!(page_count(&pdf), 1);
    assert_eq!(shown(&page_text(&pdf), "Receipt"), 0);
}

#[test]
fn unknown_font_falls_back_to_helvetica() {
    let mut options = scenario();
    options.overrides.font = Some("No Such Font Family".into());
    let pdf = render(options);
    assert!(raw_contains(&pdf, "/BaseFont /Helvetica"));
    assert!(shown(&page_text(&pdf), "Widget") > 0);
}

#[test]
fn write_receipt_creates_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("receipt.pdf");
    write_receipt(scenario(), &TemplateDefaults::default(), &out).unwrap();
    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(bytes, render(scenario()));
}
