use std::collections::HashMap;
use std::ffi::OsStr;
use std::io::Write;
use std::process::Command;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::{BBox, DocumentPreprocessor, ExtractedDocument, TextFragment};
use crate::errors::ReviewError;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const DEFAULT_DPI: u32 = 150;
const TOOLS: [&str; 3] = ["pdftoppm", "pdfinfo", "pdftohtml"];

/// Preprocessing backend built on poppler-utils.
///
/// - `pdftoppm` rasterizes the first page to PNG
/// - `pdfinfo` reports the page count
/// - `pdftohtml -xml` yields positioned text runs with font specs
///
/// Plain text lines come from `pdf-extract`, falling back to the pdftohtml
/// runs when it cannot decode the document.
pub struct PopplerPreprocessor {
    dpi: u32,
}

impl PopplerPreprocessor {
    pub fn new() -> Self {
        Self { dpi: DEFAULT_DPI }
    }

    /// Check if every poppler tool this backend needs is on the PATH.
    pub fn is_available() -> bool {
        TOOLS.iter().all(|tool| {
            Command::new(tool)
                .arg("-v")
                .output()
                .map(|o| o.status.success() || !o.stderr.is_empty())
                .unwrap_or(false)
        })
    }
}

impl Default for PopplerPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentPreprocessor for PopplerPreprocessor {
    fn convert_to_image(&self, document: &[u8]) -> Result<String, ReviewError> {
        let pdf = write_temp_pdf(document).map_err(ReviewError::Conversion)?;
        let out_dir = tempfile::tempdir().map_err(|e| ReviewError::Conversion(e.to_string()))?;
        let prefix = out_dir.path().join("page");
        let dpi = self.dpi.to_string();

        run_tool(
            "pdftoppm",
            &[
                OsStr::new("-png"),
                OsStr::new("-r"),
                OsStr::new(&dpi),
                OsStr::new("-f"),
                OsStr::new("1"),
                OsStr::new("-l"),
                OsStr::new("1"),
                OsStr::new("-singlefile"),
                pdf.path().as_os_str(),
                prefix.as_os_str(),
            ],
        )
        .map_err(ReviewError::Conversion)?;

        let png = std::fs::read(prefix.with_extension("png")).map_err(|e| {
            ReviewError::Conversion(format!("pdftoppm produced no image: {e}"))
        })?;
        if !png.starts_with(PNG_SIGNATURE) {
            return Err(ReviewError::Conversion(
                "pdftoppm output is not a PNG image".to_string(),
            ));
        }

        info!("Converted PDF to Base64 image successfully ({} bytes)", png.len());
        Ok(STANDARD.encode(png))
    }

    fn extract_text_and_formatting(
        &self,
        document: &[u8],
    ) -> Result<ExtractedDocument, ReviewError> {
        let pdf = write_temp_pdf(document).map_err(ReviewError::Extraction)?;

        let stdout = run_tool(
            "pdftohtml",
            &[
                OsStr::new("-xml"),
                OsStr::new("-stdout"),
                OsStr::new("-i"),
                OsStr::new("-q"),
                OsStr::new("-zoom"),
                OsStr::new("1"),
                pdf.path().as_os_str(),
            ],
        )
        .map_err(ReviewError::Extraction)?;

        let xml = String::from_utf8_lossy(&stdout);
        let formatting = parse_pdftohtml_xml(&xml).map_err(ReviewError::Extraction)?;

        let text = match plain_text_lines(document) {
            Ok(lines) => lines,
            Err(e) => {
                warn!("pdf-extract could not read the document ({e}); using pdftohtml runs");
                formatting
                    .iter()
                    .map(|f| TextFragment::plain(f.text.clone()))
                    .collect()
            }
        };

        debug!(
            "Extracted {} text lines and {} formatting runs",
            text.len(),
            formatting.len()
        );
        Ok(ExtractedDocument { text, formatting })
    }

    fn page_count(&self, document: &[u8]) -> Result<u32, ReviewError> {
        let pdf = write_temp_pdf(document).map_err(ReviewError::Extraction)?;
        let stdout =
            run_tool("pdfinfo", &[pdf.path().as_os_str()]).map_err(ReviewError::Extraction)?;

        parse_page_count(&String::from_utf8_lossy(&stdout)).ok_or_else(|| {
            ReviewError::Extraction("pdfinfo did not report a page count".to_string())
        })
    }

    fn backend_name(&self) -> &str {
        "poppler"
    }
}

fn write_temp_pdf(document: &[u8]) -> Result<NamedTempFile, String> {
    if document.is_empty() {
        return Err("document is empty".to_string());
    }
    let mut file = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| e.to_string())?;
    file.write_all(document).map_err(|e| e.to_string())?;
    file.flush().map_err(|e| e.to_string())?;
    Ok(file)
}

/// Runs a poppler tool and returns its stdout, describing any failure.
fn run_tool(tool: &str, args: &[&OsStr]) -> Result<Vec<u8>, String> {
    let output = Command::new(tool).args(args).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            format!(
                "{tool} not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)"
            )
        } else {
            format!("{tool} failed: {e}")
        }
    })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{tool} failed with exit code {code}: {}",
            stderr.trim()
        ));
    }

    Ok(output.stdout)
}

fn plain_text_lines(document: &[u8]) -> Result<Vec<TextFragment>, String> {
    // pdf-extract panics on some malformed inputs
    let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(document))
        .map_err(|_| "pdf-extract panicked".to_string())?
        .map_err(|e| format!("{e:?}"))?;

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(TextFragment::plain)
        .collect())
}

/// Reads `Pages:` from `pdfinfo` output.
fn parse_page_count(info: &str) -> Option<u32> {
    info.lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|count| count.trim().parse().ok())
}

#[derive(Debug, Clone)]
struct FontSpec {
    family: Option<String>,
    size: Option<f32>,
}

#[derive(Debug)]
struct PendingText {
    text: String,
    font_id: Option<String>,
    bbox: Option<BBox>,
    page: Option<u32>,
}

impl PendingText {
    fn finish(self, fonts: &HashMap<String, FontSpec>) -> Result<Option<TextFragment>, String> {
        let text = self.text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let spec = match &self.font_id {
            Some(id) => Some(
                fonts
                    .get(id)
                    .ok_or_else(|| format!("text run references undefined font id {id}"))?,
            ),
            None => None,
        };

        Ok(Some(TextFragment {
            text: text.to_string(),
            font: spec.and_then(|s| s.family.clone()),
            size: spec.and_then(|s| s.size),
            bbox: self.bbox,
            page: self.page,
        }))
    }
}

/// Parses `pdftohtml -xml` output into positioned, styled text runs.
///
/// ```xml
/// <page number="1" ...>
///   <fontspec id="0" size="14" family="Times" color="#000000"/>
///   <text top="75" left="108" width="97" height="17" font="0"><b>Jane Doe</b></text>
/// </page>
/// ```
fn parse_pdftohtml_xml(xml: &str) -> Result<Vec<TextFragment>, String> {
    let mut reader = Reader::from_str(xml);
    let mut fonts: HashMap<String, FontSpec> = HashMap::new();
    let mut fragments = Vec::new();
    let mut page: Option<u32> = None;
    let mut pending: Option<PendingText> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"page" => page = attr(&e, b"number")?.and_then(|n| n.parse().ok()),
                b"fontspec" => insert_fontspec(&e, &mut fonts)?,
                b"text" => pending = Some(pending_text(&e, page)?),
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"fontspec" {
                    insert_fontspec(&e, &mut fonts)?;
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(p) = pending.as_mut() {
                    match t.unescape() {
                        Ok(s) => p.text.push_str(&s),
                        Err(_) => p.text.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"text" {
                    if let Some(p) = pending.take() {
                        if let Some(fragment) = p.finish(&fonts)? {
                            fragments.push(fragment);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "malformed pdftohtml XML at byte {}: {e}",
                    reader.buffer_position()
                ))
            }
            _ => {}
        }
    }

    Ok(fragments)
}

fn insert_fontspec(e: &BytesStart<'_>, fonts: &mut HashMap<String, FontSpec>) -> Result<(), String> {
    let id = attr(e, b"id")?.ok_or("fontspec without an id")?;
    let spec = FontSpec {
        family: attr(e, b"family")?,
        size: attr(e, b"size")?.and_then(|s| s.parse().ok()),
    };
    fonts.insert(id, spec);
    Ok(())
}

fn pending_text(e: &BytesStart<'_>, page: Option<u32>) -> Result<PendingText, String> {
    let bbox = match (
        number_attr(e, b"left")?,
        number_attr(e, b"top")?,
        number_attr(e, b"width")?,
        number_attr(e, b"height")?,
    ) {
        (Some(left), Some(top), Some(width), Some(height)) => Some(BBox {
            x0: left,
            y0: top,
            x1: left + width,
            y1: top + height,
        }),
        _ => None,
    };

    Ok(PendingText {
        text: String::new(),
        font_id: attr(e, b"font")?,
        bbox,
        page,
    })
}

fn number_attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<f32>, String> {
    Ok(attr(e, name)?.and_then(|v| v.parse().ok()))
}

fn attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, String> {
    for attribute in e.attributes() {
        let attribute = attribute.map_err(|err| format!("bad attribute: {err}"))?;
        if attribute.key.as_ref() == name {
            let value = attribute
                .unescape_value()
                .map_err(|err| format!("bad attribute value: {err}"))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::testdata::one_page_pdf;

    const SAMPLE_XML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE pdf2xml SYSTEM "pdf2xml.dtd">
<pdf2xml producer="poppler" version="23.08.0">
<page number="1" position="absolute" top="0" left="0" height="792" width="612">
	<fontspec id="0" size="14" family="Times" color="#000000"/>
	<fontspec id="1" size="10" family="Helvetica-Bold" color="#000000"/>
<text top="72" left="72" width="90" height="16" font="0"><b>Jane Doe</b></text>
<text top="100" left="72" width="200" height="11" font="1">Built &amp; shipped <i>3</i> services</text>
<text top="120" left="72" width="10" height="11" font="1">   </text>
</page>
</pdf2xml>
"##;

    #[test]
    fn test_parse_pdftohtml_xml_runs() {
        let fragments = parse_pdftohtml_xml(SAMPLE_XML).unwrap();
        assert_eq!(fragments.len(), 2);

        assert_eq!(fragments[0].text, "Jane Doe");
        assert_eq!(fragments[0].font.as_deref(), Some("Times"));
        assert_eq!(fragments[0].size, Some(14.0));
        assert_eq!(fragments[0].page, Some(1));
        assert_eq!(
            fragments[0].bbox,
            Some(BBox { x0: 72.0, y0: 72.0, x1: 162.0, y1: 88.0 })
        );

        assert_eq!(fragments[1].text, "Built & shipped 3 services");
        assert_eq!(fragments[1].font.as_deref(), Some("Helvetica-Bold"));
    }

    #[test]
    fn test_missing_position_and_font_are_optional() {
        let xml = r#"<pdf2xml><page number="2"><text>Loose text</text></page></pdf2xml>"#;
        let fragments = parse_pdftohtml_xml(xml).unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].font, None);
        assert_eq!(fragments[0].size, None);
        assert_eq!(fragments[0].bbox, None);
        assert_eq!(fragments[0].page, Some(2));
    }

    #[test]
    fn test_undefined_font_id_is_an_error() {
        let xml = r#"<pdf2xml><page number="1"><text font="7">Orphan</text></page></pdf2xml>"#;
        let err = parse_pdftohtml_xml(xml).unwrap_err();
        assert!(err.contains("undefined font id 7"));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let xml = r#"<pdf2xml><page number="1"><text font="0">Open</page></pdf2xml>"#;
        assert!(parse_pdftohtml_xml(xml).is_err());
    }

    #[test]
    fn test_parse_page_count() {
        let info = "Title:          Resume\nProducer:       LaTeX\nPages:          2\nEncrypted:      no\n";
        assert_eq!(parse_page_count(info), Some(2));
        assert_eq!(parse_page_count("Title: x\n"), None);
    }

    #[test]
    fn test_empty_document_fails_conversion() {
        let err = PopplerPreprocessor::new().convert_to_image(&[]).unwrap_err();
        assert!(matches!(err, ReviewError::Conversion(_)));
    }

    #[test]
    fn test_garbage_bytes_fail_conversion() {
        if !PopplerPreprocessor::is_available() {
            eprintln!("skipping: poppler-utils not installed");
            return;
        }
        let err = PopplerPreprocessor::new()
            .convert_to_image(b"definitely not a pdf")
            .unwrap_err();
        assert!(matches!(err, ReviewError::Conversion(_)));
    }

    #[test]
    fn test_one_page_pdf_end_to_end() {
        if !PopplerPreprocessor::is_available() {
            eprintln!("skipping: poppler-utils not installed");
            return;
        }
        let pdf = one_page_pdf("Jane Doe");
        let poppler = PopplerPreprocessor::new();

        assert!(poppler.check_single_page(&pdf).unwrap());

        let image = STANDARD.decode(poppler.convert_to_image(&pdf).unwrap()).unwrap();
        assert!(image.starts_with(PNG_SIGNATURE));

        let extracted = poppler.extract_text_and_formatting(&pdf).unwrap();
        assert!(extracted.formatting.iter().any(|f| f.text.contains("Jane Doe")));
        assert!(extracted.formatting.iter().all(|f| f.font.is_some()));
    }
}
