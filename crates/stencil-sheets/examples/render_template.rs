//! Example: fill a template with JSON data
//!
//! ```text
//! cargo run --example render_template -- template.xlsx data.json out.xlsx
//! ```

use stencil_sheets::prelude::*;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [template, data, output] = args.as_slice() else {
        eprintln!("usage: render_template <template.xlsx> <data.json> <out.xlsx>");
        std::process::exit(2);
    };

    let template = Template::load(template.as_str())?;
    let json = std::fs::read_to_string(data).map_err(|e| Error::Source {
        location: data.clone(),
        reason: e.to_string(),
    })?;
    let data = Value::from(serde_json::from_str::<serde_json::Value>(&json)?).parse_dates();

    let rendered = template.render_to_file(&data, output)?;
    for sheet in &rendered.report.sheets {
        println!("{}: {} -> {} rows", sheet.name, sheet.rows_in, sheet.rows_out);
    }
    println!("Saved to {output}");

    Ok(())
}
