//! The receipt document: options, validation and the section pipeline.

mod cells;
mod company;
mod context;
mod sections;

use std::path::Path;
use std::time::Instant;

use serde::Deserialize;

use crate::error::Error;
use crate::model::PageSize;
use crate::pdf::Canvas;

pub use cells::{Cell, Rows, StyledCell, bottom_border_rows, rows};
pub use company::{Company, CompanyField, HeaderIdentity, Logo, PaymentLink};
pub use context::{CallOverrides, ResolvedContext, TemplateDefaults};
pub use sections::SectionMargins;

const DEFAULT_LOGO_HEIGHT: f32 = 16.0;

/// Everything given for one receipt. Context values (title, totals text,
/// payment link, ...) fall back to the template defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReceiptOptions {
    pub page_size: Option<PageSize>,
    #[serde(flatten)]
    pub overrides: CallOverrides,
    pub company: Option<Company>,
    pub recipient: Option<Vec<String>>,
    pub details: Option<Rows>,
    pub line_items: Option<Rows>,
    pub column_widths: Option<Vec<Option<f32>>>,
    pub total_items: Option<Rows>,
    pub total_items_column_widths: Option<Vec<Option<f32>>>,
    pub footer: Option<String>,
    pub logo_height: Option<f32>,
    pub margins: SectionMargins,
}

impl ReceiptOptions {
    fn has_content(&self) -> bool {
        self.company.is_some()
            || self.details.is_some()
            || self.recipient.is_some()
            || self.line_items.is_some()
            || self.total_items.is_some()
    }
}

/// Validated content of a receipt with a body.
#[derive(Debug)]
struct Body {
    company: Company,
    recipient: Vec<String>,
    details: Rows,
    line_items: Rows,
    column_widths: Vec<Option<f32>>,
    total_items: Rows,
    total_items_column_widths: Vec<Option<f32>>,
    footer: Option<String>,
    logo_height: f32,
    margins: SectionMargins,
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, Error> {
    value.ok_or(Error::MissingRequiredField(field))
}

impl Body {
    fn validate(options: ReceiptOptions, context: &ResolvedContext) -> Result<Self, Error> {
        let company = required(options.company, "company")?;
        let details = required(options.details, "details")?;
        let recipient = required(options.recipient, "recipient")?;
        let line_items = required(options.line_items, "line_items")?;
        let total_items = required(options.total_items, "total_items")?;

        bottom_border_rows("line_items", line_items.len())?;
        bottom_border_rows("total_items", total_items.len())?;

        context.require_title()?;
        context.require_total_text()?;
        context.require_payment_link()?;

        let footer = options
            .footer
            .or_else(|| sections::default_footer(&company));

        Ok(Self {
            company,
            recipient,
            details,
            line_items,
            column_widths: options.column_widths.unwrap_or_default(),
            total_items,
            total_items_column_widths: options.total_items_column_widths.unwrap_or_default(),
            footer,
            logo_height: options.logo_height.unwrap_or(DEFAULT_LOGO_HEIGHT),
            margins: options.margins,
        })
    }

    fn draw(&self, canvas: &mut Canvas, context: &ResolvedContext) -> Result<(), Error> {
        let margins = &self.margins;
        sections::header(
            canvas,
            &self.company,
            context.require_title()?,
            context.subtitle.as_deref(),
            self.logo_height,
        )?;
        log::debug!("header done, cursor={:.2}", canvas.cursor());

        sections::details(canvas, &self.details, margins.details);
        sections::billing(canvas, &self.company, &self.recipient, margins.billing);
        log::debug!("billing done, cursor={:.2}", canvas.cursor());

        sections::line_items(canvas, &self.line_items, &self.column_widths, margins.line_items)?;
        log::debug!("line items done, cursor={:.2}", canvas.cursor());

        let totals = sections::Totals {
            payment_link: context.require_payment_link()?,
            total_text: context.require_total_text()?,
            total_text_in_words: context.total_text_in_words.as_deref(),
        };
        sections::totals(
            canvas,
            &totals,
            &self.total_items,
            &self.total_items_column_widths,
            margins.totals,
        )?;
        log::debug!("totals done, cursor={:.2}", canvas.cursor());

        sections::signature(canvas, &self.company, margins.signature);
        sections::footer(canvas, self.footer.as_deref(), margins.footer);
        Ok(())
    }
}

/// A receipt ready to render. Construction resolves the context and checks
/// every required field and table shape, so rendering only fails on I/O
/// (logo loading).
#[derive(Debug)]
pub struct Receipt {
    context: ResolvedContext,
    page_size: PageSize,
    body: Option<Body>,
}

impl Receipt {
    pub fn new(options: ReceiptOptions, defaults: &TemplateDefaults) -> Result<Self, Error> {
        let context = ResolvedContext::resolve(&options.overrides, defaults);
        let page_size = options
            .page_size
            .or(defaults.page_size)
            .unwrap_or_default();
        let body = if options.has_content() {
            Some(Body::validate(options, &context)?)
        } else {
            log::debug!("no content fields given, building an empty receipt");
            None
        };
        Ok(Self {
            context,
            page_size,
            body,
        })
    }

    pub fn context(&self) -> &ResolvedContext {
        &self.context
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// True when built without content: rendering gives a blank page.
    pub fn is_empty(&self) -> bool {
        self.body.is_none()
    }

    /// Lay out the receipt and return the PDF bytes.
    pub fn render(&self) -> Result<Vec<u8>, Error> {
        let t0 = Instant::now();
        let mut canvas = Canvas::new(self.page_size, self.context.font.as_deref());
        if let Some(body) = &self.body {
            body.draw(&mut canvas, &self.context)?;
        }
        let pages = canvas.page_count();
        let t_layout = t0.elapsed();

        let bytes = canvas.finish();
        let t_total = t0.elapsed();

        log::info!(
            "Timing: layout={:.1}ms, assemble={:.1}ms, total={:.1}ms ({} page(s), {} bytes)",
            t_layout.as_secs_f64() * 1000.0,
            (t_total - t_layout).as_secs_f64() * 1000.0,
            t_total.as_secs_f64() * 1000.0,
            pages,
            bytes.len(),
        );
        Ok(bytes)
    }

    /// Render and write the PDF to `path`.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let bytes = self.render()?;
        std::fs::write(path, &bytes)?;
        Ok(())
    }
}
