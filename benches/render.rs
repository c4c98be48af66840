// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Benchmarks for rendering a styled workbook.
//!
//! The workbook is generated in memory: 2,000 rows of styled text, numbers
//! under several number formats, merges, a color scale and a data bar.
//!
//! ```bash
//! cargo bench --bench render
//! ```

use criterion::{criterion_group, criterion_main, Criterion, SamplingMode};
use rust_xlsxwriter::{
    Color, ConditionalFormat2ColorScale, ConditionalFormatCell, ConditionalFormatCellRule,
    ConditionalFormatDataBar, Format, FormatAlign, FormatBorder, Workbook as Writer, XlsxError,
};
use std::hint::black_box;
use std::io::Cursor;
use std::time::Duration;
use xlsx_html::{NoImages, RenderOptions, Workbook};

const ROWS: u32 = 2_000;

fn styled_workbook() -> Result<Vec<u8>, XlsxError> {
    let mut writer = Writer::new();
    let sheet = writer.add_worksheet();
    sheet.set_name("Styled")?;

    let bold = Format::new().set_bold();
    let boxed = Format::new()
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::Blue);
    let filled = Format::new()
        .set_background_color(Color::Yellow)
        .set_align(FormatAlign::Center);
    let currency = Format::new().set_num_format("\"£\"#,##0.00");
    let percent = Format::new().set_num_format("0.00%");
    let date = Format::new().set_num_format("yyyy-mm-dd");

    for row in 0..ROWS {
        let n = f64::from(row);
        sheet.write_string_with_format(row, 0, "Label", &bold)?;
        sheet.write_number_with_format(row, 1, n * 12.5 - 1000., &currency)?;
        sheet.write_number_with_format(row, 2, n / ROWS as f64, &percent)?;
        sheet.write_number_with_format(row, 3, 40_000. + n, &date)?;
        sheet.write_string_with_format(row, 4, "Boxed", &boxed)?;
        sheet.write_number_with_format(row, 5, n, &filled)?;
        sheet.write_number(row, 6, (n * 7.).sin())?;
        if row % 10 == 0 {
            sheet.merge_range(row, 7, row + 1, 8, "Merged", &Format::new())?;
        }
    }

    let last = ROWS - 1;
    let highlight = ConditionalFormatCell::new()
        .set_rule(ConditionalFormatCellRule::LessThan(0))
        .set_format(Format::new().set_font_color(Color::Red));
    sheet.add_conditional_format(0, 1, last, 1, &highlight)?;
    sheet.add_conditional_format(0, 5, last, 5, &ConditionalFormat2ColorScale::new())?;
    sheet.add_conditional_format(0, 6, last, 6, &ConditionalFormatDataBar::new())?;

    writer.save_to_buffer()
}

fn bench_render(c: &mut Criterion) {
    let bytes = styled_workbook().expect("cannot generate workbook");

    let mut group = c.benchmark_group("render");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(100));
    group.sampling_mode(SamplingMode::Flat);

    group.bench_function("open", |b| {
        b.iter(|| black_box(Workbook::new(Cursor::new(bytes.as_slice())).unwrap()))
    });

    group.bench_function("print_layout", |b| {
        let options = RenderOptions::new();
        b.iter(|| {
            let mut workbook = Workbook::new(Cursor::new(bytes.as_slice())).unwrap();
            black_box(workbook.render(&options, &mut NoImages).unwrap())
        })
    });

    group.bench_function("spreadsheet_layout_auto_widths", |b| {
        let options: RenderOptions = "AAS".parse().unwrap();
        b.iter(|| {
            let mut workbook = Workbook::new(Cursor::new(bytes.as_slice())).unwrap();
            black_box(workbook.render(&options, &mut NoImages).unwrap())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
