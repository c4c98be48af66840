//! Renders an xlsx workbook to an html file next to it.
//!
//! ```bash
//! cargo run --example xlsx_to_html -- report.xlsx 2AS
//! ```
//!
//! The optional second argument is the compact option code: sheet number
//! (or `A` for all sheets), `O`/`A` for replicated or automatic column
//! widths and `P`/`S` for the print or spreadsheet layout. Images are
//! written to an `images` directory beside the html file.

use std::env;
use std::fs;
use std::path::PathBuf;

use xlsx_html::{render, Error, RenderOptions};

fn main() -> Result<(), Error> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let source = PathBuf::from(args.next().expect("Please provide an xlsx file to render"));
    match source.extension().and_then(|s| s.to_str()) {
        Some("xlsx") | Some("xlsm") => (),
        _ => panic!("Expecting an xlsx file"),
    }
    let options: RenderOptions = match args.next() {
        Some(code) => code.parse()?,
        None => RenderOptions::new(),
    };

    let dest = source.with_extension("html");
    let images = dest
        .parent()
        .map(|dir| dir.join("images"))
        .unwrap_or_else(|| PathBuf::from("images"));
    let html = render(&source, &options.with_image_dir(images))?;
    fs::write(&dest, html)?;
    println!("{} written", dest.display());
    Ok(())
}
