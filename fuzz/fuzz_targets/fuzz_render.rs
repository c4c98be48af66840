#![no_main]
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use xlsx_html::{LayoutMode, NoImages, RenderOptions, Workbook};

fuzz_target!(|data: &[u8]| {
    let mut workbook = match Workbook::new(Cursor::new(data)) {
        Ok(wb) => wb,
        Err(_) => return,
    };
    for number in 1..=workbook.sheet_names().len() {
        let _ = workbook.worksheet(number);
    }
    for layout in [LayoutMode::Print, LayoutMode::Spreadsheet] {
        let options = RenderOptions::new().with_layout(layout);
        let _ = workbook.render(&options, &mut NoImages);
    }
});
