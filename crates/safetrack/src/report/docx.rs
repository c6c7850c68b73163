//! Inspection act generation from a `.docx` template.
//!
//! The template carries `{field}` placeholders. Word frequently splits such
//! a placeholder over several runs, so matching happens on the text of a
//! whole paragraph; a paragraph that changes has its text collapsed into
//! its first text run (formatting of the other runs is lost).

use std::borrow::Cow;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesText, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use quick_xml::Writer;
use tracing::{error, info, info_span};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::ReportError;
use crate::records::InspectionRecord;
use crate::sanitize::redact_path;

/// Placeholders substituted into the act, in form order.
pub const ACT_FIELDS: [&str; 12] = [
    "inspection_date",
    "object",
    "section",
    "organization",
    "violator_name",
    "violation_description",
    "violation_type",
    "violation_category",
    "risk_level",
    "inspector_name",
    "elimination_date",
    "elimination_status",
];

const DOCUMENT_PART: &str = "word/document.xml";

pub struct ActGenerator {
    template_path: PathBuf,
}

impl ActGenerator {
    pub fn new(template_path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
        }
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    /// Fills the template with `record`'s values and returns the new
    /// document. Fields without a value become empty strings.
    pub fn generate(&self, record: &InspectionRecord) -> Result<Vec<u8>, ReportError> {
        let _span = info_span!(
            "report.act",
            id = record.id,
            template = %redact_path(&self.template_path)
        )
        .entered();

        if !self.template_path.is_file() {
            return Err(ReportError::TemplateMissing(self.template_path.clone()));
        }
        let template = std::fs::read(&self.template_path).map_err(|e| ReportError::TemplateRead {
            path: self.template_path.clone(),
            source: e,
        })?;

        let substitutions: Vec<(String, String)> = ACT_FIELDS
            .iter()
            .map(|field| {
                (
                    format!("{{{}}}", field),
                    record.field_value(field).unwrap_or_default(),
                )
            })
            .collect();

        let document = fill_template(&template, &substitutions)?;
        info!(bytes = document.len(), "Act generated");
        Ok(document)
    }

    /// Like [`generate`](Self::generate), but logs the failure and returns
    /// `None`.
    pub fn try_generate(&self, record: &InspectionRecord) -> Option<Vec<u8>> {
        match self.generate(record) {
            Ok(document) => Some(document),
            Err(e) => {
                error!(id = record.id, error = %e, "Failed to generate act");
                None
            }
        }
    }
}

/// Copies every part of the package, substituting placeholders in the main
/// document part.
pub fn fill_template(
    template: &[u8],
    substitutions: &[(String, String)],
) -> Result<Vec<u8>, ReportError> {
    let mut archive = ZipArchive::new(Cursor::new(template))?;
    let mut output = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        if entry.is_dir() {
            output.add_directory(name, options)?;
            continue;
        }

        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        if name == DOCUMENT_PART {
            let xml = std::str::from_utf8(&content).map_err(|e| ReportError::xml(&name, e))?;
            content = substitute_paragraphs(&name, xml, substitutions)?;
        }

        output.start_file(name, options)?;
        output.write_all(&content)?;
    }

    Ok(output.finish()?.into_inner())
}

/// WordprocessingML namespace; DrawingML `a:p`/`a:t` share local names with
/// body paragraphs and runs and must not be touched.
const WML_NAMESPACE: &[u8] = b"http://schemas.openxmlformats.org/wordprocessingml/2006/main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    ParagraphStart,
    ParagraphEnd,
    TextStart,
    TextEnd,
    Other,
}

type Marked = (Mark, Event<'static>);

fn mark(ns: &ResolveResult<'_>, event: &Event<'_>) -> Mark {
    let in_wml = matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == WML_NAMESPACE);
    if !in_wml {
        return Mark::Other;
    }
    match event {
        Event::Start(e) if e.local_name().as_ref() == b"p" => Mark::ParagraphStart,
        Event::End(e) if e.local_name().as_ref() == b"p" => Mark::ParagraphEnd,
        Event::Start(e) if e.local_name().as_ref() == b"t" => Mark::TextStart,
        Event::End(e) if e.local_name().as_ref() == b"t" => Mark::TextEnd,
        _ => Mark::Other,
    }
}

/// Paragraphs nested in text boxes are rewritten on their own and handed to
/// the enclosing paragraph as opaque events.
fn substitute_paragraphs(
    part: &str,
    xml: &str,
    substitutions: &[(String, String)],
) -> Result<Vec<u8>, ReportError> {
    let mut reader = NsReader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut open: Vec<Vec<Marked>> = Vec::new();

    loop {
        let (ns, event) = reader
            .read_resolved_event()
            .map_err(|e| ReportError::xml(part, e))?;
        let kind = mark(&ns, &event);
        if let Event::Eof = event {
            break;
        }

        match kind {
            Mark::ParagraphStart => open.push(vec![(kind, event.into_owned())]),
            Mark::ParagraphEnd => {
                let Some(mut paragraph) = open.pop() else {
                    writer
                        .write_event(event)
                        .map_err(|e| ReportError::xml(part, e))?;
                    continue;
                };
                paragraph.push((kind, event.into_owned()));
                let rewritten = rewrite_paragraph(part, paragraph, substitutions)?;
                match open.last_mut() {
                    Some(parent) => {
                        parent.extend(rewritten.into_iter().map(|ev| (Mark::Other, ev)))
                    }
                    None => {
                        for ev in rewritten {
                            writer.write_event(ev).map_err(|e| ReportError::xml(part, e))?;
                        }
                    }
                }
            }
            _ => match open.last_mut() {
                Some(paragraph) => paragraph.push((kind, event.into_owned())),
                None => writer
                    .write_event(event)
                    .map_err(|e| ReportError::xml(part, e))?,
            },
        }
    }

    Ok(writer.into_inner())
}

/// Text of the paragraph's own `w:t` elements, concatenated in document order.
fn paragraph_text(part: &str, events: &[Marked]) -> Result<String, ReportError> {
    let mut text = String::new();
    let mut in_text = false;
    for (kind, event) in events {
        match (kind, event) {
            (Mark::TextStart, _) => in_text = true,
            (Mark::TextEnd, _) => in_text = false,
            (_, Event::Text(t)) if in_text => {
                let raw = std::str::from_utf8(t).map_err(|e| ReportError::xml(part, e))?;
                let decoded =
                    quick_xml::escape::unescape(raw).map_err(|e| ReportError::xml(part, e))?;
                text.push_str(&decoded);
            }
            (_, Event::CData(c)) if in_text => text.push_str(&String::from_utf8_lossy(c)),
            (_, Event::GeneralRef(r)) if in_text => {
                let name = std::str::from_utf8(r).map_err(|e| ReportError::xml(part, e))?;
                text.push_str(&resolve_reference(name).ok_or_else(|| {
                    ReportError::xml(part, format!("unknown entity '&{};'", name))
                })?);
            }
            _ => {}
        }
    }
    Ok(text)
}

fn resolve_reference(name: &str) -> Option<Cow<'static, str>> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse().ok()?,
        };
        return char::from_u32(value).map(|c| Cow::Owned(c.to_string()));
    }
    quick_xml::escape::resolve_predefined_entity(name).map(Cow::Borrowed)
}

fn rewrite_paragraph(
    part: &str,
    events: Vec<Marked>,
    substitutions: &[(String, String)],
) -> Result<Vec<Event<'static>>, ReportError> {
    let original = paragraph_text(part, &events)?;
    if !substitutions.iter().any(|(key, _)| original.contains(key.as_str())) {
        return Ok(events.into_iter().map(|(_, ev)| ev).collect());
    }

    let mut replaced = original;
    for (key, value) in substitutions {
        if replaced.contains(key.as_str()) {
            replaced = replaced.replace(key.as_str(), value);
        }
    }

    let mut out = Vec::with_capacity(events.len());
    let mut in_text = false;
    let mut first_seen = false;
    let mut in_first = false;

    for (kind, event) in events {
        match (kind, event) {
            (Mark::TextStart, Event::Start(e)) => {
                in_text = true;
                if first_seen {
                    out.push(Event::Start(e));
                } else {
                    first_seen = true;
                    in_first = true;
                    let preserved = e
                        .attributes()
                        .filter_map(Result::ok)
                        .any(|a| a.key.as_ref() == b"xml:space");
                    let mut start = e;
                    if !preserved {
                        start.push_attribute(("xml:space", "preserve"));
                    }
                    out.push(Event::Start(start));
                }
            }
            (Mark::TextEnd, end) => {
                if in_first {
                    out.push(Event::Text(BytesText::new(&replaced).into_owned()));
                    in_first = false;
                }
                in_text = false;
                out.push(end);
            }
            (_, Event::Text(_) | Event::CData(_) | Event::GeneralRef(_)) if in_text => {}
            (_, other) => out.push(other),
        }
    }

    Ok(out)
}

/// A minimal act template holding every placeholder, one labelled row per
/// field.
pub fn default_act_template() -> Result<Vec<u8>, ReportError> {
    const LABELS: [&str; 12] = [
        "Дата проверки",
        "Объект",
        "Участок",
        "Организация",
        "Нарушитель",
        "Описание нарушения",
        "Вид нарушения",
        "Категория нарушения",
        "Уровень риска",
        "Проверяющий",
        "Срок устранения",
        "Статус устранения",
    ];

    let mut body = String::new();
    body.push_str(r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>АКТ ПРОВЕРКИ</w:t></w:r></w:p>"#);
    body.push_str(r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/></w:tblPr>"#);
    for (label, field) in LABELS.iter().zip(ACT_FIELDS.iter()) {
        body.push_str(&format!(
            "<w:tr><w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc>\
             <w:tc><w:p><w:r><w:t>{{{}}}</w:t></w:r></w:p></w:tc></w:tr>",
            label, field
        ));
    }
    body.push_str("</w:tbl><w:p/>");

    let document = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:body>{}<w:sectPr/></w:body></w:document>"#
        ),
        body
    );

    let parts: [(&str, &str); 3] = [
        (
            "[Content_Types].xml",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
                r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
                r#"<Default Extension="xml" ContentType="application/xml"/>"#,
                r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
                r#"</Types>"#
            ),
        ),
        (
            "_rels/.rels",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
                r#"</Relationships>"#
            ),
        ),
        (DOCUMENT_PART, document.as_str()),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }
    Ok(zip.finish()?.into_inner())
}

/// Writes [`default_act_template`] to `path` unless a file is already there.
/// Returns whether a template was written.
pub fn write_default_template(path: &Path) -> Result<bool, ReportError> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, default_act_template()?)?;
    info!(template = %redact_path(path), "Default act template written");
    Ok(true)
}
