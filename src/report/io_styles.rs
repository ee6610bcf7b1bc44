// Reading the format of one cell of an upload.
//
// calamine only returns values, so the parts of the package that carry the
// formats are read directly: the workbook and its relationships to find the
// first worksheet, the worksheet for the style index of the cell, and the
// stylesheet for the font, the fill and the alignment of that index.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::report::config_reader::HeaderAlign;
use crate::report::io_common::cell_name;
use crate::report::sheet::{ColNum, RowNum};
use crate::report::*;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const STYLES_PART: &str = "xl/styles.xml";

/// The format of a cell, as far as the header is concerned.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct CellFormat {
    pub font_name: Option<String>,
    pub font_size: Option<f64>,
    pub bold: bool,
    pub font_rgb: Option<u32>,
    /// Only solid fills.
    pub fill_rgb: Option<u32>,
    pub align: Option<HeaderAlign>,
    pub wrap: bool,
}

#[derive(Debug, Default, Clone)]
struct Font {
    name: Option<String>,
    size: Option<f64>,
    bold: bool,
    rgb: Option<u32>,
}

#[derive(Debug, Default, Clone)]
struct Fill {
    solid: bool,
    rgb: Option<u32>,
}

#[derive(Debug, Default, Clone)]
struct Xf {
    font_id: usize,
    fill_id: usize,
    align: Option<HeaderAlign>,
    wrap: bool,
}

#[derive(Debug, Default)]
struct Styles {
    fonts: Vec<Font>,
    fills: Vec<Fill>,
    cell_xfs: Vec<Xf>,
}

/// The format of the cell at (`row`, `col`) of the first worksheet.
///
/// Returns `None` when the cell has the default format, or when the parts
/// needed to find its format are missing.
pub fn read_cell_format(
    name: &str,
    bytes: &[u8],
    row: RowNum,
    col: ColNum,
) -> ReportResult<Option<CellFormat>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).context(ReadingStylesSnafu { name })?;

    let workbook = match read_part(&mut archive, WORKBOOK_PART).context(ReadingStylesSnafu { name })? {
        Some(x) => x,
        None => return Ok(None),
    };
    let rel_id = match first_sheet_rel_id(&workbook).context(ParsingStylesSnafu { name })? {
        Some(x) => x,
        None => return Ok(None),
    };
    let rels = read_part(&mut archive, WORKBOOK_RELS_PART)
        .context(ReadingStylesSnafu { name })?
        .unwrap_or_default();
    let sheet_part = match rel_target(&rels, &rel_id).context(ParsingStylesSnafu { name })? {
        Some(x) => x,
        None => return Ok(None),
    };
    let sheet = match read_part(&mut archive, &sheet_part).context(ReadingStylesSnafu { name })? {
        Some(x) => x,
        None => return Ok(None),
    };

    let cell = cell_name(row, col);
    let xf_id = match cell_style_index(&sheet, &cell).context(ParsingStylesSnafu { name })? {
        Some(0) | None => {
            debug!("read_cell_format: {}: {} has the default format", name, cell);
            return Ok(None);
        }
        Some(x) => x,
    };

    let styles = match read_part(&mut archive, STYLES_PART).context(ReadingStylesSnafu { name })? {
        Some(x) => parse_styles(&x).context(ParsingStylesSnafu { name })?,
        None => return Ok(None),
    };
    let format = styles.cell_format(xf_id);
    debug!(
        "read_cell_format: {}: {} ({}) uses style {}: {:?}",
        name, cell, sheet_part, xf_id, format
    );
    Ok(format)
}

fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    path: &str,
) -> Result<Option<String>, ZipError> {
    let mut file = match archive.by_name(path) {
        Ok(f) => f,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut content = String::new();
    file.read_to_string(&mut content).map_err(ZipError::from)?;
    Ok(Some(content))
}

fn local_name(name: &[u8]) -> &[u8] {
    name.rsplit(|b| *b == b':').next().unwrap_or(name)
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, quick_xml::Error> {
    for a in e.attributes().with_checks(false) {
        let a = a?;
        if local_name(a.key.as_ref()) == key {
            return Ok(Some(a.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// The relationship id of the first `<sheet>` of the workbook.
fn first_sheet_rel_id(xml: &str) -> Result<Option<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if local_name(e.name().as_ref()) == b"sheet" => {
                return attr(&e, b"id");
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// The package path of the part a relationship points to.
fn rel_target(xml: &str, rel_id: &str) -> Result<Option<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e)
                if local_name(e.name().as_ref()) == b"Relationship"
                    && attr(&e, b"Id")?.as_deref() == Some(rel_id) =>
            {
                return Ok(attr(&e, b"Target")?.map(|t| match t.strip_prefix('/') {
                    Some(absolute) => absolute.to_string(),
                    None => format!("xl/{}", t),
                }));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// The `s` attribute of the cell named `cell`, if the cell is written.
fn cell_style_index(xml: &str, cell: &str) -> Result<Option<usize>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e)
                if local_name(e.name().as_ref()) == b"c"
                    && attr(&e, b"r")?.as_deref() == Some(cell) =>
            {
                return Ok(attr(&e, b"s")?.and_then(|s| s.trim().parse::<usize>().ok()));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// `FF4472C4` or `4472C4` -> 0x4472C4. Theme and indexed colours are not resolved.
fn argb(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.len() < 6 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(&s[s.len() - 6..], 16).ok()
}

fn flag(value: Option<String>) -> bool {
    !matches!(value.as_deref(), Some("0") | Some("false"))
}

fn horizontal(value: &str) -> Option<HeaderAlign> {
    match value {
        "left" => Some(HeaderAlign::Left),
        "center" | "centerContinuous" => Some(HeaderAlign::Center),
        "right" => Some(HeaderAlign::Right),
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Other,
    Fonts,
    Fills,
    CellXfs,
}

fn parse_styles(xml: &str) -> Result<Styles, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut styles = Styles::default();
    let mut section = Section::Other;

    loop {
        buf.clear();
        let (e, is_start) = match reader.read_event_into(&mut buf)? {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::End(e) => {
                if matches!(local_name(e.name().as_ref()), b"fonts" | b"fills" | b"cellXfs") {
                    section = Section::Other;
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };
        match (section, local_name(e.name().as_ref())) {
            (_, b"fonts") if is_start => section = Section::Fonts,
            (_, b"fills") if is_start => section = Section::Fills,
            (_, b"cellXfs") if is_start => section = Section::CellXfs,
            (Section::Fonts, b"font") => styles.fonts.push(Font::default()),
            (Section::Fonts, tag) => {
                if let Some(font) = styles.fonts.last_mut() {
                    match tag {
                        b"b" => font.bold = flag(attr(&e, b"val")?),
                        b"sz" => font.size = attr(&e, b"val")?.and_then(|v| v.parse().ok()),
                        b"name" => font.name = attr(&e, b"val")?,
                        b"color" => font.rgb = attr(&e, b"rgb")?.as_deref().and_then(argb),
                        _ => {}
                    }
                }
            }
            (Section::Fills, b"fill") => styles.fills.push(Fill::default()),
            (Section::Fills, tag) => {
                if let Some(fill) = styles.fills.last_mut() {
                    match tag {
                        b"patternFill" => {
                            fill.solid = attr(&e, b"patternType")?.as_deref() == Some("solid")
                        }
                        b"fgColor" => fill.rgb = attr(&e, b"rgb")?.as_deref().and_then(argb),
                        _ => {}
                    }
                }
            }
            (Section::CellXfs, b"xf") => styles.cell_xfs.push(Xf {
                font_id: attr(&e, b"fontId")?.and_then(|v| v.parse().ok()).unwrap_or(0),
                fill_id: attr(&e, b"fillId")?.and_then(|v| v.parse().ok()).unwrap_or(0),
                ..Default::default()
            }),
            (Section::CellXfs, b"alignment") => {
                if let Some(xf) = styles.cell_xfs.last_mut() {
                    xf.align = attr(&e, b"horizontal")?.as_deref().and_then(horizontal);
                    xf.wrap = attr(&e, b"wrapText")?.map(|v| flag(Some(v))).unwrap_or(false);
                }
            }
            _ => {}
        }
    }
    Ok(styles)
}

impl Styles {
    fn cell_format(&self, xf_id: usize) -> Option<CellFormat> {
        let xf = self.cell_xfs.get(xf_id)?;
        let font = self.fonts.get(xf.font_id).cloned().unwrap_or_default();
        let fill_rgb = self
            .fills
            .get(xf.fill_id)
            .filter(|f| f.solid)
            .and_then(|f| f.rgb);
        Some(CellFormat {
            font_name: font.name,
            font_size: font.size,
            bold: font.bold,
            font_rgb: font.rgb,
            fill_rgb,
            align: xf.align,
            wrap: xf.wrap,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::io_xlsx::tests::styled_workbook_bytes;
    use crate::report::sheet::CellValue;
    use rust_xlsxwriter::{Color, Format, FormatAlign};

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="2">
    <font><sz val="11"/><color theme="1"/><name val="Calibri"/></font>
    <font><b/><sz val="12"/><color rgb="FFFFFFFF"/><name val="Arial"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FF1F4E78"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="1" fillId="2" borderId="0" xfId="0" applyFont="1" applyFill="1" applyAlignment="1"><alignment horizontal="center" vertical="center" wrapText="1"/></xf>
    <xf numFmtId="0" fontId="0" fillId="1" borderId="0" xfId="0"/>
  </cellXfs>
  <dxfs count="1"><dxf><font><b val="0"/></font></dxf></dxfs>
</styleSheet>"#;

    #[test]
    fn stylesheet() {
        let styles = parse_styles(STYLES).unwrap();
        assert_eq!(styles.fonts.len(), 2);
        assert_eq!(styles.fills.len(), 3);
        assert_eq!(styles.cell_xfs.len(), 3);
        assert_eq!(
            styles.cell_format(1),
            Some(CellFormat {
                font_name: Some("Arial".to_string()),
                font_size: Some(12.0),
                bold: true,
                font_rgb: Some(0xFFFFFF),
                fill_rgb: Some(0x1F4E78),
                align: Some(HeaderAlign::Center),
                wrap: true,
            })
        );
        // Theme colour, pattern fill.
        let plain = styles.cell_format(2).unwrap();
        assert_eq!(plain.font_rgb, None);
        assert_eq!(plain.fill_rgb, None);
        assert!(!plain.bold);
        assert_eq!(plain.align, None);
        assert_eq!(styles.cell_format(3), None);
    }

    #[test]
    fn colours() {
        assert_eq!(argb("FF1F4E78"), Some(0x1F4E78));
        assert_eq!(argb("d9e1f2"), Some(0xD9E1F2));
        assert_eq!(argb("+FFFFFF"), None);
        assert_eq!(argb("FFF"), None);
    }

    #[test]
    fn relationships() {
        let workbook = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Results" sheetId="1" r:id="rId3"/><sheet name="Other" sheetId="2" r:id="rId1"/></sheets></workbook>"#;
        assert_eq!(first_sheet_rel_id(workbook).unwrap().as_deref(), Some("rId3"));
        let rels = r#"<Relationships><Relationship Id="rId1" Target="worksheets/sheet2.xml"/><Relationship Id="rId3" Target="/xl/worksheets/sheet1.xml"/></Relationships>"#;
        assert_eq!(
            rel_target(rels, "rId3").unwrap().as_deref(),
            Some("xl/worksheets/sheet1.xml")
        );
        assert_eq!(
            rel_target(rels, "rId1").unwrap().as_deref(),
            Some("xl/worksheets/sheet2.xml")
        );
        assert_eq!(rel_target(rels, "rId9").unwrap(), None);
    }

    #[test]
    fn format_of_a_written_cell() {
        let header = Format::new()
            .set_bold()
            .set_font_name("Arial")
            .set_font_size(12)
            .set_font_color(Color::RGB(0x203764))
            .set_background_color(Color::RGB(0xFFC000))
            .set_align(FormatAlign::Right);
        let bytes = styled_workbook_bytes(
            &[
                (22, 0, CellValue::Text("Question".to_string())),
                (22, 1, CellValue::Text("Difficulty".to_string())),
            ],
            &[],
            &[((22, 0), header)],
        )
        .unwrap();

        let format = read_cell_format("upload.xlsx", &bytes, 22, 0).unwrap().unwrap();
        assert!(format.bold);
        assert_eq!(format.font_name.as_deref(), Some("Arial"));
        assert_eq!(format.font_size, Some(12.0));
        assert_eq!(format.font_rgb, Some(0x203764));
        assert_eq!(format.fill_rgb, Some(0xFFC000));
        assert_eq!(format.align, Some(HeaderAlign::Right));
        assert!(!format.wrap);

        // Written without a format, and not written at all.
        assert_eq!(read_cell_format("upload.xlsx", &bytes, 22, 1).unwrap(), None);
        assert_eq!(read_cell_format("upload.xlsx", &bytes, 40, 0).unwrap(), None);
    }

    #[test]
    fn not_a_package() {
        assert!(matches!(
            read_cell_format("broken.xlsx", b"not a zip", 22, 0),
            Err(ReportError::ReadingStyles { .. })
        ));
    }
}
