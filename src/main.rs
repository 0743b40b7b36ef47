use std::path::PathBuf;
use std::process;

use clap::Parser;
use receipt_pdf::{Error, Receipt, ReceiptOptions, TemplateDefaults, config};

#[derive(Parser)]
#[command(name = "receipt-pdf")]
#[command(version, about = "Render a receipt or invoice description to PDF", long_about = None)]
struct Cli {
    /// Receipt description (TOML, or JSON with a .json extension)
    input: PathBuf,

    /// Output PDF path (default: the input path with a .pdf extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Template defaults applied to every field the receipt leaves out
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Print the resolved context as JSON and exit without rendering
    #[arg(long)]
    print_context: bool,
}

fn run(cli: Cli) -> Result<(), Error> {
    let defaults: TemplateDefaults = match &cli.template {
        Some(path) => config::load(path)?,
        None => TemplateDefaults::default(),
    };
    let options: ReceiptOptions = config::load(&cli.input)?;
    let receipt = Receipt::new(options, &defaults)?;

    if cli.print_context {
        let json = serde_json::to_string_pretty(receipt.context()).map_err(std::io::Error::from)?;
        println!("{json}");
        return Ok(());
    }

    let output = cli
        .output
        .unwrap_or_else(|| cli.input.with_extension("pdf"));
    receipt.save(&output)?;
    println!("Wrote {}", output.display());
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
