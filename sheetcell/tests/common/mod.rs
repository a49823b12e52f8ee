//! Minimal xlsx fixtures written with `zip`
#![allow(dead_code)]

use sheetcell::CellAddress;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Cell content of a fixture sheet
#[derive(Debug, Clone)]
pub enum Fx {
    Str(&'static str),
    Num(f64),
    Bool(bool),
}

pub struct FixtureSheet {
    pub name: &'static str,
    pub cells: Vec<(&'static str, Fx)>,
}

impl FixtureSheet {
    pub fn new(name: &'static str, cells: Vec<(&'static str, Fx)>) -> Self {
        Self { name, cells }
    }
}

/// Write a workbook with the given sheets (in document order)
pub fn write_xlsx(path: &Path, sheets: &[FixtureSheet]) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let mut strings: Vec<&str> = Vec::new();
    let mut sheet_xml = Vec::new();
    for sheet in sheets {
        sheet_xml.push(worksheet_xml(sheet, &mut strings)?);
    }

    zip.start_file("[Content_Types].xml", options)?;
    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
"#,
    );
    for i in 1..=sheets.len() {
        content_types.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    content_types.push_str("</Types>");
    zip.write_all(content_types.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#,
    )?;

    zip.start_file("xl/workbook.xml", options)?;
    let mut workbook_xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>"#,
    );
    for (i, sheet) in sheets.iter().enumerate() {
        workbook_xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            sheet.name,
            i + 1,
            i + 1
        ));
    }
    workbook_xml.push_str("</sheets></workbook>");
    zip.write_all(workbook_xml.as_bytes())?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    let mut rels_xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheets.len() {
        rels_xml.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    rels_xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        sheets.len() + 1
    ));
    rels_xml.push_str("</Relationships>");
    zip.write_all(rels_xml.as_bytes())?;

    zip.start_file("xl/sharedStrings.xml", options)?;
    let mut sst = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    );
    for s in &strings {
        sst.push_str(&format!(r#"<si><t xml:space="preserve">{}</t></si>"#, escape(s)));
    }
    sst.push_str("</sst>");
    zip.write_all(sst.as_bytes())?;

    for (i, xml) in sheet_xml.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
        zip.write_all(xml.as_bytes())?;
    }

    zip.finish()?;
    Ok(())
}

fn worksheet_xml<'a>(sheet: &'a FixtureSheet, strings: &mut Vec<&'a str>) -> anyhow::Result<String> {
    let mut cells = Vec::new();
    for (address, value) in &sheet.cells {
        cells.push((CellAddress::parse(address)?, value));
    }
    cells.sort_by_key(|(addr, _)| *addr);

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    let mut current_row = None;
    for (addr, value) in cells {
        if current_row != Some(addr.row) {
            if current_row.is_some() {
                xml.push_str("</row>");
            }
            xml.push_str(&format!(r#"<row r="{}">"#, addr.row_number()));
            current_row = Some(addr.row);
        }
        match value {
            Fx::Str(s) => {
                let s: &'a str = s;
                let index = match strings.iter().position(|known| *known == s) {
                    Some(index) => index,
                    None => {
                        strings.push(s);
                        strings.len() - 1
                    }
                };
                xml.push_str(&format!(r#"<c r="{addr}" t="s"><v>{index}</v></c>"#));
            }
            Fx::Num(n) => xml.push_str(&format!(r#"<c r="{addr}"><v>{n}</v></c>"#)),
            Fx::Bool(b) => xml.push_str(&format!(r#"<c r="{addr}" t="b"><v>{}</v></c>"#, u8::from(*b))),
        }
    }
    if current_row.is_some() {
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    Ok(xml)
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Two-sheet workbook used across the integration tests.
///
/// `People`:
///
/// | row | A     | B   | C    | D    |
/// |-----|-------|-----|------|------|
/// | 1   | Name  | Age | Note | Paid |
/// | 2   | Alice | 30  | N/A  | TRUE |
/// | 3   | Bob   |     | ""   |      |
/// | 4   | Carol | 41  | null |      |
/// | 5   |       |     |      |      |
/// | 6   | Dave  | 50.5|      |      |
///
/// `Summary`: B2 = "Total", C2 = 121
pub fn people_workbook(dir: &Path) -> anyhow::Result<PathBuf> {
    let path = dir.join("people.xlsx");
    write_xlsx(
        &path,
        &[
            FixtureSheet::new(
                "People",
                vec![
                    ("A1", Fx::Str("Name")),
                    ("B1", Fx::Str("Age")),
                    ("C1", Fx::Str("Note")),
                    ("D1", Fx::Str("Paid")),
                    ("A2", Fx::Str("Alice")),
                    ("B2", Fx::Num(30.0)),
                    ("C2", Fx::Str("N/A")),
                    ("D2", Fx::Bool(true)),
                    ("A3", Fx::Str("Bob")),
                    ("C3", Fx::Str("")),
                    ("A4", Fx::Str("Carol")),
                    ("B4", Fx::Num(41.0)),
                    ("C4", Fx::Str("null")),
                    ("A6", Fx::Str("Dave")),
                    ("B6", Fx::Num(50.5)),
                ],
            ),
            FixtureSheet::new(
                "Summary",
                vec![("B2", Fx::Str("Total")), ("C2", Fx::Num(121.0))],
            ),
        ],
    )?;
    Ok(path)
}
