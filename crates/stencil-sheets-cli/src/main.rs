//! Stencil CLI - fill XLSX templates from JSON data

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stencil_sheets::prelude::*;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "stencil")]
#[command(author, version, about = "Fill XLSX templates with JSON data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template with data from a JSON file
    Render {
        /// Template workbook (path or, with the `remote` feature, http(s) URL)
        template: String,

        /// JSON data file ("-" reads stdin)
        data: String,

        /// Output workbook ("-" writes stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Turn ISO-8601 date strings in the data into dates
        #[arg(long)]
        parse_dates: bool,

        /// Keep cached values of formula cells
        #[arg(long)]
        keep_formula_values: bool,

        /// Leave merged cells, names and tables where they are
        #[arg(long)]
        no_shift_ranges: bool,

        /// Print per-sheet statistics
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the placeholders used in a template
    Placeholders {
        /// Template workbook
        template: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            template,
            data,
            output,
            parse_dates,
            keep_formula_values,
            no_shift_ranges,
            verbose,
        } => {
            let options = RenderOptions::default()
                .remove_formula_values(!keep_formula_values)
                .shift_ranges(!no_shift_ranges);
            render(&template, &data, &output, parse_dates, &options, verbose)
        }
        Commands::Placeholders { template } => list_placeholders(&template),
    }
}

fn render(
    template: &str,
    data: &str,
    output: &Path,
    parse_dates: bool,
    options: &RenderOptions,
    verbose: bool,
) -> Result<()> {
    let template =
        Template::load(template).with_context(|| format!("Failed to load '{template}'"))?;

    let mut value = read_data(data)?;
    if parse_dates {
        value = value.parse_dates();
    }

    let rendered = template
        .render_with(&value, options)
        .context("Failed to render template")?;

    if output == Path::new("-") {
        io::stdout()
            .write_all(&rendered.bytes)
            .context("Failed to write to stdout")?;
    } else {
        std::fs::write(output, &rendered.bytes)
            .with_context(|| format!("Failed to write '{}'", output.display()))?;
        eprintln!("Wrote '{}'", output.display());
    }

    if verbose {
        print_report(&rendered.report);
    }

    Ok(())
}

fn read_data(data: &str) -> Result<Value> {
    let text = if data == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read data from stdin")?;
        text
    } else {
        std::fs::read_to_string(data).with_context(|| format!("Failed to read '{data}'"))?
    };

    let json: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("Invalid JSON in '{data}'"))?;
    Ok(Value::from(json))
}

fn print_report(report: &RenderReport) {
    for sheet in &report.sheets {
        eprintln!(
            "  {}: {} rows -> {} rows",
            sheet.name, sheet.rows_in, sheet.rows_out
        );
    }
    eprintln!("  {} new shared strings", report.strings_added);
}

fn list_placeholders(template: &str) -> Result<()> {
    let template =
        Template::load(template).with_context(|| format!("Failed to load '{template}'"))?;

    for body in template
        .placeholders()
        .context("Failed to read template")?
    {
        println!("{body}");
    }

    Ok(())
}
