//! Minimal SpreadsheetML (`.xlsx`) writer.
//!
//! Supports what the exports need: sheets of inline-string/number cells
//! with a bold header row, and sheets holding one PNG image anchored at
//! cell A1.

use std::fmt::Write as _;
use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ReportError;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Pixels to English Metric Units at 96 dpi.
const EMU_PER_PIXEL: u64 = 9525;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Number(if value { 1.0 } else { 0.0 })
    }
}

enum Sheet {
    Data {
        name: String,
        header: Vec<String>,
        rows: Vec<Vec<Cell>>,
    },
    Image {
        name: String,
        png: Vec<u8>,
        width: u32,
        height: u32,
    },
}

impl Sheet {
    fn name(&self) -> &str {
        match self {
            Sheet::Data { name, .. } | Sheet::Image { name, .. } => name,
        }
    }
}

#[derive(Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a table sheet. The header row is written even when `rows`
    /// is empty.
    pub fn add_data_sheet(
        &mut self,
        name: &str,
        header: &[&str],
        rows: Vec<Vec<Cell>>,
    ) -> &mut Self {
        self.sheets.push(Sheet::Data {
            name: name.to_string(),
            header: header.iter().map(|h| h.to_string()).collect(),
            rows,
        });
        self
    }

    /// Appends a sheet showing a PNG of the given pixel size at cell A1.
    pub fn add_image_sheet(&mut self, name: &str, png: Vec<u8>, width: u32, height: u32) -> &mut Self {
        self.sheets.push(Sheet::Image {
            name: name.to_string(),
            png,
            width,
            height,
        });
        self
    }

    /// Serializes the workbook into an `.xlsx` package.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ReportError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut put = |name: &str, content: &[u8]| -> Result<(), ReportError> {
            zip.start_file(name, options)?;
            zip.write_all(content)?;
            Ok(())
        };

        put("[Content_Types].xml", self.content_types().as_bytes())?;
        put(
            "_rels/.rels",
            relationships(&[(
                "rId1",
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
                "xl/workbook.xml",
            )])
            .as_bytes(),
        )?;
        put("xl/workbook.xml", self.workbook_xml().as_bytes())?;
        put("xl/_rels/workbook.xml.rels", self.workbook_rels().as_bytes())?;
        put("xl/styles.xml", STYLES_XML.as_bytes())?;

        let mut drawing_index = 0;
        for (i, sheet) in self.sheets.iter().enumerate() {
            let sheet_number = i + 1;
            match sheet {
                Sheet::Data { header, rows, .. } => {
                    put(
                        &format!("xl/worksheets/sheet{}.xml", sheet_number),
                        data_sheet_xml(header, rows).as_bytes(),
                    )?;
                }
                Sheet::Image {
                    png, width, height, ..
                } => {
                    drawing_index += 1;
                    put(
                        &format!("xl/worksheets/sheet{}.xml", sheet_number),
                        image_sheet_xml().as_bytes(),
                    )?;
                    put(
                        &format!("xl/worksheets/_rels/sheet{}.xml.rels", sheet_number),
                        relationships(&[(
                            "rId1",
                            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing",
                            format!("../drawings/drawing{}.xml", drawing_index).as_str(),
                        )])
                        .as_bytes(),
                    )?;
                    put(
                        &format!("xl/drawings/drawing{}.xml", drawing_index),
                        drawing_xml(drawing_index, *width, *height).as_bytes(),
                    )?;
                    put(
                        &format!("xl/drawings/_rels/drawing{}.xml.rels", drawing_index),
                        relationships(&[(
                            "rId1",
                            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image",
                            format!("../media/image{}.png", drawing_index).as_str(),
                        )])
                        .as_bytes(),
                    )?;
                    put(&format!("xl/media/image{}.png", drawing_index), png)?;
                }
            }
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    fn content_types(&self) -> String {
        let mut xml = String::from(XML_DECL);
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
        xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
        xml.push_str(r#"<Default Extension="png" ContentType="image/png"/>"#);
        xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
        xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);

        let mut drawing_index = 0;
        for (i, sheet) in self.sheets.iter().enumerate() {
            let _ = write!(
                xml,
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            );
            if matches!(sheet, Sheet::Image { .. }) {
                drawing_index += 1;
                let _ = write!(
                    xml,
                    r#"<Override PartName="/xl/drawings/drawing{}.xml" ContentType="application/vnd.openxmlformats-officedocument.drawing+xml"/>"#,
                    drawing_index
                );
            }
        }
        xml.push_str("</Types>");
        xml
    }

    fn workbook_xml(&self) -> String {
        let mut xml = String::from(XML_DECL);
        let _ = write!(
            xml,
            r#"<workbook xmlns="{}" xmlns:r="{}"><sheets>"#,
            NS_MAIN, NS_REL
        );
        for (i, sheet) in self.sheets.iter().enumerate() {
            let _ = write!(
                xml,
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape(sheet.name()),
                i + 1,
                i + 1
            );
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn workbook_rels(&self) -> String {
        let targets: Vec<String> = (1..=self.sheets.len())
            .map(|n| format!("worksheets/sheet{}.xml", n))
            .collect();
        let ids: Vec<String> = (1..=self.sheets.len() + 1)
            .map(|n| format!("rId{}", n))
            .collect();

        let mut entries: Vec<(&str, &str, &str)> = targets
            .iter()
            .zip(&ids)
            .map(|(target, id)| {
                (
                    id.as_str(),
                    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet",
                    target.as_str(),
                )
            })
            .collect();
        entries.push((
            ids[self.sheets.len()].as_str(),
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles",
            "styles.xml",
        ));
        relationships(&entries)
    }
}

fn relationships(entries: &[(&str, &str, &str)]) -> String {
    let mut xml = String::from(XML_DECL);
    let _ = write!(xml, r#"<Relationships xmlns="{}">"#, NS_PKG_REL);
    for (id, kind, target) in entries {
        let _ = write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            id, kind, target
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn data_sheet_xml(header: &[String], rows: &[Vec<Cell>]) -> String {
    let mut xml = String::from(XML_DECL);
    let _ = write!(xml, r#"<worksheet xmlns="{}" xmlns:r="{}"><sheetData>"#, NS_MAIN, NS_REL);

    let header_cells: Vec<Cell> = header.iter().map(|h| Cell::Text(h.clone())).collect();
    write_row(&mut xml, 1, &header_cells, Some(1));
    for (i, row) in rows.iter().enumerate() {
        write_row(&mut xml, i + 2, row, None);
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn write_row(xml: &mut String, row_number: usize, cells: &[Cell], style: Option<u32>) {
    let _ = write!(xml, r#"<row r="{}">"#, row_number);
    let style_attr = style.map(|s| format!(r#" s="{}""#, s)).unwrap_or_default();
    for (col, cell) in cells.iter().enumerate() {
        let reference = format!("{}{}", column_name(col), row_number);
        match cell {
            Cell::Text(text) => {
                let _ = write!(
                    xml,
                    r#"<c r="{}" t="inlineStr"{}><is><t xml:space="preserve">{}</t></is></c>"#,
                    reference,
                    style_attr,
                    escape(strip_invalid_xml_chars(text).as_str())
                );
            }
            Cell::Number(value) => {
                let _ = write!(xml, r#"<c r="{}"{}><v>{}</v></c>"#, reference, style_attr, value);
            }
        }
    }
    xml.push_str("</row>");
}

fn image_sheet_xml() -> String {
    format!(
        r#"{}<worksheet xmlns="{}" xmlns:r="{}"><sheetData/><drawing r:id="rId1"/></worksheet>"#,
        XML_DECL, NS_MAIN, NS_REL
    )
}

fn drawing_xml(index: usize, width: u32, height: u32) -> String {
    let cx = u64::from(width) * EMU_PER_PIXEL;
    let cy = u64::from(height) * EMU_PER_PIXEL;
    format!(
        concat!(
            "{decl}",
            r#"<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" "#,
            r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="{rel}">"#,
            r#"<xdr:oneCellAnchor>"#,
            r#"<xdr:from><xdr:col>0</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>0</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>"#,
            r#"<xdr:ext cx="{cx}" cy="{cy}"/>"#,
            r#"<xdr:pic><xdr:nvPicPr><xdr:cNvPr id="{id}" name="Chart {index}"/>"#,
            r#"<xdr:cNvPicPr><a:picLocks noChangeAspect="1"/></xdr:cNvPicPr></xdr:nvPicPr>"#,
            r#"<xdr:blipFill><a:blip r:embed="rId1"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill>"#,
            r#"<xdr:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></xdr:spPr></xdr:pic>"#,
            r#"<xdr:clientData/></xdr:oneCellAnchor></xdr:wsDr>"#
        ),
        decl = XML_DECL,
        rel = NS_REL,
        cx = cx,
        cy = cy,
        id = index + 1,
        index = index,
    )
}

/// Zero-based column index to spreadsheet letters: 0 → A, 25 → Z, 26 → AA.
fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// XML 1.0 cannot carry most C0 control characters, even escaped.
fn strip_invalid_xml_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="2"><font><sz val="11"/><name val="Calibri"/></font>"#,
    r#"<font><b/><sz val="11"/><name val="Calibri"/></font></fonts>"#,
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill>"#,
    r#"<fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
    r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs>"#,
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    r#"</styleSheet>"#
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_data_sheet_cells() {
        let mut workbook = Workbook::new();
        workbook.add_data_sheet(
            "Данные",
            &["date", "violations_count"],
            vec![vec!["01.03.2024".into(), 3i64.into()]],
        );
        let bytes = workbook.to_bytes().unwrap();

        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<c r="A1" t="inlineStr" s="1">"#));
        assert!(sheet.contains("violations_count"));
        assert!(sheet.contains(r#"<t xml:space="preserve">01.03.2024</t>"#));
        assert!(sheet.contains(r#"<c r="B2"><v>3</v></c>"#));

        let workbook_xml = read_part(&bytes, "xl/workbook.xml");
        assert!(workbook_xml.contains(r#"<sheet name="Данные" sheetId="1" r:id="rId1"/>"#));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut workbook = Workbook::new();
        workbook.add_data_sheet("S", &["a"], vec![vec!["<b> & \"q\"\u{1}".into()]]);
        let bytes = workbook.to_bytes().unwrap();

        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains("&lt;b&gt; &amp; &quot;q&quot;</t>"));
    }

    #[test]
    fn test_image_sheet_parts() {
        let mut workbook = Workbook::new();
        workbook
            .add_data_sheet("Данные", &["date"], vec![])
            .add_image_sheet("График", vec![0x89, b'P', b'N', b'G'], 100, 50);
        let bytes = workbook.to_bytes().unwrap();

        let sheet2 = read_part(&bytes, "xl/worksheets/sheet2.xml");
        assert!(sheet2.contains(r#"<drawing r:id="rId1"/>"#));
        let drawing = read_part(&bytes, "xl/drawings/drawing1.xml");
        assert!(drawing.contains("<xdr:col>0</xdr:col>"));
        assert!(drawing.contains("<xdr:row>0</xdr:row>"));
        assert!(drawing.contains(r#"cx="952500" cy="476250""#));
        let rels = read_part(&bytes, "xl/drawings/_rels/drawing1.xml.rels");
        assert!(rels.contains("../media/image1.png"));

        let types = read_part(&bytes, "[Content_Types].xml");
        assert!(types.contains("/xl/drawings/drawing1.xml"));
        assert!(types.contains("/xl/worksheets/sheet2.xml"));

        let workbook_rels = read_part(&bytes, "xl/_rels/workbook.xml.rels");
        assert!(workbook_rels.contains(r#"Id="rId3""#));
        assert!(workbook_rels.contains("styles.xml"));
    }
}
