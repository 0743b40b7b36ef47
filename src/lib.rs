pub mod config;
mod error;
mod fonts;
pub mod markup;
pub mod model;
mod pdf;
mod receipt;

pub use error::Error;
pub use model::PageSize;
pub use receipt::{
    CallOverrides, Cell, Company, CompanyField, HeaderIdentity, Logo, PaymentLink, Receipt,
    ReceiptOptions, ResolvedContext, Rows, SectionMargins, StyledCell, TemplateDefaults,
    bottom_border_rows, rows,
};

use std::path::Path;

/// Build a receipt from `options` and the template `defaults` and return the
/// PDF bytes.
pub fn render_receipt(options: ReceiptOptions, defaults: &TemplateDefaults) -> Result<Vec<u8>, Error> {
    Receipt::new(options, defaults)?.render()
}

/// Build a receipt and write the PDF to `output`.
pub fn write_receipt(
    options: ReceiptOptions,
    defaults: &TemplateDefaults,
    output: &Path,
) -> Result<(), Error> {
    Receipt::new(options, defaults)?.save(output)
}
