use std::io::{Cursor, Write};

use rstest::rstest;
use xlsx_html::{
    render, Error, ImageId, ImageStore, NoImages, RenderOptions, SheetSelector, Workbook,
    XlsxError,
};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const GRID_CELL: &str =
    "<td style=' border-right:1px solid LightGray; border-bottom:1px solid LightGray;'>&nbsp;</td>";

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>
<sheet name="Data" sheetId="1" r:id="rId1"/>
<sheet name="Empty" sheetId="2" r:id="rId2"/>
<sheet name="Pictures &amp; merges" sheetId="3" r:id="rId3"/>
</sheets>
</workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet3.xml"/>
<Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
<Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
</Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="2">
<font><sz val="11"/><color theme="1"/><name val="Calibri"/></font>
<font><b/><sz val="11"/><color theme="1"/><name val="Calibri"/></font>
</fonts>
<fills count="2">
<fill><patternFill patternType="none"/></fill>
<fill><patternFill patternType="gray125"/></fill>
</fills>
<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
<cellXfs count="2">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
<xf numFmtId="0" fontId="1" fillId="0" borderId="0" applyFont="1"/>
</cellXfs>
<dxfs count="1"><dxf><fill><patternFill><bgColor rgb="FFFF0000"/></patternFill></fill></dxf></dxfs>
</styleSheet>"#;

const SHARED_STRINGS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="2" uniqueCount="2">
<si><t>Hello</t></si>
<si><t>Merged</t></si>
</sst>"#;

const SHEET_DATA: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<dimension ref="A1:C3"/>
<sheetData>
<row r="1"><c r="A1"><v>5</v></c></row>
<row r="2"><c r="B2" s="1" t="s"><v>0</v></c></row>
</sheetData>
<conditionalFormatting sqref="A1:C3">
<cfRule type="cellIs" dxfId="0" priority="1" operator="greaterThan"><formula>0</formula></cfRule>
</conditionalFormatting>
<headerFooter><oddHeader>&amp;C&amp;A</oddHeader></headerFooter>
</worksheet>"#;

const SHEET_EMPTY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<dimension ref="A1"/>
<sheetData/>
</worksheet>"#;

const SHEET_PICTURES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheetData>
<row r="2"><c r="B2" t="s"><v>1</v></c></row>
</sheetData>
<mergeCells count="1"><mergeCell ref="B2:D4"/></mergeCells>
<drawing r:id="rId1"/>
</worksheet>"#;

const SHEET_PICTURES_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing" Target="../drawings/drawing1.xml"/>
</Relationships>"#;

const DRAWING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<xdr:twoCellAnchor>
<xdr:from><xdr:col>5</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>1</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
<xdr:to><xdr:col>6</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>2</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
<xdr:pic>
<xdr:blipFill><a:blip r:embed="rId7"/></xdr:blipFill>
<xdr:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="900000" cy="450000"/></a:xfrm></xdr:spPr>
</xdr:pic>
<xdr:clientData/>
</xdr:twoCellAnchor>
</xdr:wsDr>"#;

const DRAWING_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId7" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>
</Relationships>"#;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";

fn package() -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    let parts: [(&str, &[u8]); 10] = [
        ("xl/workbook.xml", WORKBOOK.as_bytes()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes()),
        ("xl/styles.xml", STYLES.as_bytes()),
        ("xl/sharedStrings.xml", SHARED_STRINGS.as_bytes()),
        ("xl/worksheets/sheet1.xml", SHEET_DATA.as_bytes()),
        ("xl/worksheets/sheet2.xml", SHEET_EMPTY.as_bytes()),
        ("xl/worksheets/sheet3.xml", SHEET_PICTURES.as_bytes()),
        ("xl/worksheets/_rels/sheet3.xml.rels", SHEET_PICTURES_RELS.as_bytes()),
        ("xl/drawings/drawing1.xml", DRAWING.as_bytes()),
        ("xl/drawings/_rels/drawing1.xml.rels", DRAWING_RELS.as_bytes()),
    ];
    for (name, content) in parts {
        zip.start_file(name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.start_file("xl/media/image1.png", options).unwrap();
    zip.write_all(PNG).unwrap();
    zip.finish().unwrap().into_inner()
}

fn workbook() -> Workbook<Cursor<Vec<u8>>> {
    let _ = env_logger::try_init();
    Workbook::new(Cursor::new(package()))
        .unwrap()
        .with_file_name("book.xlsx")
}

/// Records the images it is handed
#[derive(Default)]
struct Recorder {
    stored: Vec<(ImageId, usize)>,
}

impl ImageStore for Recorder {
    fn store(&mut self, id: &ImageId, bytes: &[u8]) -> Option<String> {
        self.stored.push((id.clone(), bytes.len()));
        Some(format!("img/{}", id.file_name()))
    }
}

#[test]
fn test_sheet_names() {
    let mut wb = workbook();
    assert_eq!(wb.sheet_names(), ["Data", "Empty", "Pictures & merges"]);
    let sheet = wb.worksheet(1).unwrap();
    assert_eq!(sheet.cells.len(), 2);
    assert_eq!(sheet.conditional_formats.len(), 1);
    assert!(wb.worksheet(0).is_err());
    assert!(wb.worksheet(4).is_err());
}

#[test]
fn test_worksheet_by_name() {
    let mut wb = workbook();
    let sheet = wb.worksheet_by_name("Pictures & merges").unwrap();
    assert_eq!(sheet.merges.len(), 1);
    assert_eq!(sheet.images.len(), 1);
    assert!(wb.worksheet_by_name("Empty").unwrap().cells.is_empty());
    assert!(matches!(
        wb.worksheet_by_name("Missing"),
        Err(Error::Xlsx(XlsxError::WorksheetNotFound(name))) if name == "Missing"
    ));
}

#[test]
fn test_highlight_scenario() {
    let mut wb = workbook();
    let html = wb
        .render(&RenderOptions::new().with_sheet(1), &mut NoImages)
        .unwrap();

    assert!(html.starts_with("<div style=' text-align:center;'><table width='100%'>"));
    // &A field in the header
    assert!(html.contains(">Data</span>"));
    // A1 is greater than zero
    assert!(html.contains(
        "<tr><td style='border-right: 1px solid LightGray;'></td>\
         <td style=' background-color: #FF0000; vertical-align:bottom; text-align:right;'>"
    ));
    assert!(html.contains(">5</span></td>"));
    // B2 keeps its bold font
    assert!(html.contains(" font-weight: bold;'>Hello</span>"));
    // C3 has no value and no overlay
    assert!(html.contains(&format!("{GRID_CELL}{GRID_CELL}</tr>\n</table>")));
    assert!(html.ends_with("<br>&nbsp;<br></div>"));
}

#[test]
fn test_render_is_idempotent() {
    let mut wb = workbook();
    let options = RenderOptions::new();
    let first = wb.render(&options, &mut Recorder::default()).unwrap();
    let second = wb.render(&options, &mut Recorder::default()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, workbook().render(&options, &mut Recorder::default()).unwrap());
}

#[test]
fn test_blank_sheets_are_skipped() {
    let mut wb = workbook();
    let html = wb.render(&RenderOptions::new(), &mut NoImages).unwrap();
    // two tables and two separators: the empty sheet is not rendered
    assert_eq!(html.matches("<table style=").count(), 2);
    assert_eq!(html.matches("<br>&nbsp;<br>").count(), 2);
}

#[rstest]
#[case(2)]
#[case(9)]
fn test_missing_sheet_notice(#[case] number: usize) {
    let mut wb = workbook();
    let html = wb
        .render(&RenderOptions::new().with_sheet(number), &mut NoImages)
        .unwrap();
    assert_eq!(
        html,
        format!(
            "<div style=' text-align:center;'><h2>Sheet {number} of this Excel spreadsheet does not exist.</h2></div>"
        )
    );
}

#[test]
fn test_merges_and_images() {
    let mut wb = workbook();
    let mut images = Recorder::default();
    let options: RenderOptions = "3OS".parse().unwrap();
    let html = wb.render(&options, &mut images).unwrap();

    assert!(html.contains("<h2>Sheet name - 'Pictures &amp; merges'</h2>"));
    // B2:D4 is rendered once from its anchor
    assert!(html.contains("<td colspan='3' rowspan='3' style="));
    assert!(html.contains(">Merged</span></td>"));
    assert_eq!(html.matches("rowspan='3'").count(), 1);

    assert_eq!(
        images.stored,
        [(
            ImageId {
                sheet: 3,
                rel_id: "rId7".to_string(),
                extension: "png".to_string(),
            },
            PNG.len()
        )]
    );
    assert!(html.contains(
        "<td colspan='2' rowspan='2' style=' border-right:1px solid LightGray; border-bottom:1px solid LightGray;'>\
         <img src='img/rId7-3.png' style='width:100px; height:50px; padding:5px 5px 5px 5px;' /></td>"
    ));
}

#[test]
fn test_images_without_store() {
    let mut wb = workbook();
    let html = wb
        .render(&RenderOptions::new().with_sheet(3), &mut NoImages)
        .unwrap();
    assert!(!html.contains("<img"));
    assert!(html.contains(
        "<td colspan='2' rowspan='2' style=' border-right:1px solid LightGray; border-bottom:1px solid LightGray;'>&nbsp;</td>"
    ));
}

#[test]
fn test_sheet_selector() {
    let options = RenderOptions::new().with_sheets(SheetSelector::Number(1));
    let html = workbook().render(&options, &mut NoImages).unwrap();
    assert!(!html.contains("Merged"));
}

#[test]
fn test_missing_file() {
    let path = std::env::temp_dir().join("xlsx-html-does-not-exist.xlsx");
    assert!(matches!(
        render(&path, &RenderOptions::new()),
        Err(Error::FileNotFound(p)) if p == path
    ));
}

#[test]
fn test_rust_xlsxwriter_workbook() {
    use rust_xlsxwriter::{
        Color, ConditionalFormatCell, ConditionalFormatCellRule, Format, Workbook as Writer,
    };

    let _ = env_logger::try_init();
    let mut writer = Writer::new();
    let sheet = writer.add_worksheet().set_name("Written").unwrap();
    sheet.write_number(0, 0, 5).unwrap();
    sheet
        .write_string_with_format(1, 1, "Hello", &Format::new().set_bold())
        .unwrap();
    sheet.write_number(2, 2, -1).unwrap();
    let rule = ConditionalFormatCell::new()
        .set_rule(ConditionalFormatCellRule::GreaterThan(0))
        .set_format(Format::new().set_background_color(Color::Red));
    sheet.add_conditional_format(0, 0, 2, 2, &rule).unwrap();
    let bytes = writer.save_to_buffer().unwrap();

    let mut wb = Workbook::new(Cursor::new(bytes)).unwrap();
    assert_eq!(wb.sheet_names(), ["Written"]);
    let html = wb.render(&RenderOptions::new(), &mut NoImages).unwrap();
    assert!(html.contains("background-color: #FF0000; vertical-align:bottom; text-align:right;'><span style=' font-family: Calibri;"));
    assert!(html.contains(" font-weight: bold;'>Hello</span>"));
    // -1 is not greater than zero
    assert!(html.contains(
        "<td style=' border-right:1px solid LightGray; border-bottom:1px solid LightGray; vertical-align:bottom; text-align:right;'>"
    ));
}
