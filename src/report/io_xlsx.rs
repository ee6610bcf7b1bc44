// Reading the uploads and writing the results, in the xlsx format.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};

use crate::report::config_reader::{HeaderAlign, ReportStyle};
use crate::report::io_styles::CellFormat;
use crate::report::sheet::*;
use crate::report::*;

/// Reads the first worksheet of an uploaded workbook, with its merged regions.
pub fn read_sheet(name: &str, bytes: &[u8]) -> ReportResult<SheetGrid> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).context(OpeningExcelSnafu { name })?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names.first().cloned().context(EmptyExcelSnafu { name })?;
    if sheet_names.len() > 1 {
        warn!(
            "read_sheet: {}: {} worksheets found, only {:?} is used",
            name,
            sheet_names.len(),
            sheet_name
        );
    }
    let wrange = workbook
        .worksheet_range(&sheet_name)
        .context(OpeningExcelSnafu { name })?;

    let mut grid = SheetGrid::new(&sheet_name);
    let (start_row, start_col) = wrange.start().unwrap_or((0, 0));
    for (r, c, v) in wrange.used_cells() {
        if let Some(value) = read_cell(v) {
            grid.set(start_row + r as u32, (start_col + c as u32) as ColNum, value);
        }
    }

    workbook
        .load_merged_regions()
        .context(OpeningExcelSnafu { name })?;
    grid.merged = workbook
        .merged_regions_by_sheet(&sheet_name)
        .iter()
        .map(|(_, _, dims)| CellRange {
            first: (dims.start.0, dims.start.1 as ColNum),
            last: (dims.end.0, dims.end.1 as ColNum),
        })
        .collect();

    debug!(
        "read_sheet: {}: sheet {:?}, {} cells, {} merged regions",
        name,
        grid.name,
        grid.cells.len(),
        grid.merged.len()
    );
    Ok(grid)
}

fn read_cell(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => Some(CellValue::Text(s.clone())),
        Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(_) => Some(CellValue::Text(cell.to_string())),
    }
}

/// All the formats of a workbook, built once from the style.
struct Formats {
    body: Format,
    header: Format,
    block_header: Format,
    average: Format,
    delta: Format,
}

fn format_align(align: HeaderAlign) -> FormatAlign {
    match align {
        HeaderAlign::Left => FormatAlign::Left,
        HeaderAlign::Center => FormatAlign::Center,
        HeaderAlign::Right => FormatAlign::Right,
    }
}

impl Formats {
    /// The header copies `reference` when the upload has a formatted header
    /// cell, and is built from the style otherwise.
    fn new(style: &ReportStyle, reference: Option<&CellFormat>) -> ReportResult<Formats> {
        let fill_rgb = style.header_fill_rgb()?;
        let font_rgb = style.header_font_rgb()?;
        let base = Format::new()
            .set_font_name(style.font_name.as_str())
            .set_font_size(style.font_size);
        let align = format_align(style.header_align);

        let header = match reference {
            Some(r) => {
                let mut header = Format::new()
                    .set_font_name(r.font_name.as_deref().unwrap_or(style.font_name.as_str()))
                    .set_font_size(r.font_size.unwrap_or(style.font_size))
                    .set_align(FormatAlign::VerticalCenter);
                if r.bold {
                    header = header.set_bold();
                }
                if let Some(rgb) = r.font_rgb {
                    header = header.set_font_color(Color::RGB(rgb));
                }
                if let Some(rgb) = r.fill_rgb {
                    header = header.set_background_color(Color::RGB(rgb));
                }
                if let Some(a) = r.align {
                    header = header.set_align(format_align(a));
                }
                if r.wrap {
                    header = header.set_text_wrap();
                }
                header
            }
            None => {
                let mut header = base
                    .clone()
                    .set_bold()
                    .set_background_color(Color::RGB(fill_rgb))
                    .set_font_color(Color::RGB(font_rgb))
                    .set_align(align)
                    .set_align(FormatAlign::VerticalCenter);
                if style.header_wrap {
                    header = header.set_text_wrap();
                }
                header
            }
        };

        Ok(Formats {
            body: base.clone(),
            header,
            block_header: base.clone().set_bold().set_align(align),
            average: base.clone().set_num_format(style.average_format.as_str()),
            delta: base.set_num_format("+0;-0;0"),
        })
    }

    fn get(&self, style: CellStyle) -> &Format {
        match style {
            CellStyle::Body => &self.body,
            CellStyle::Header => &self.header,
            CellStyle::BlockHeader => &self.block_header,
            CellStyle::Average => &self.average,
            CellStyle::Delta => &self.delta,
        }
    }
}

/// Writes the given sheets into a new workbook and returns its bytes.
///
/// `reference` is the format of the header cell of the upload, if any.
pub fn write_workbook(
    name: &str,
    sheets: &[&RenderedSheet],
    style: &ReportStyle,
    reference: Option<&CellFormat>,
) -> ReportResult<Vec<u8>> {
    let formats = Formats::new(style, reference)?;
    let mut workbook = Workbook::new();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet.name.as_str())
            .context(WritingExcelSnafu { name })?;

        for ((row, col), cell) in sheet.cells.iter() {
            let format = formats.get(cell.style);
            let written = match &cell.value {
                CellValue::Text(s) => {
                    worksheet.write_string_with_format(*row, *col, s.as_str(), format)
                }
                CellValue::Number(f) => worksheet.write_number_with_format(*row, *col, *f, format),
                CellValue::Bool(b) => worksheet.write_boolean_with_format(*row, *col, *b, format),
            };
            written.context(WritingExcelSnafu { name })?;
        }

        for (col, width) in sheet.column_widths.iter() {
            worksheet
                .set_column_width(*col, *width)
                .context(WritingExcelSnafu { name })?;
        }
        for (row, height) in sheet.row_heights.iter() {
            worksheet
                .set_row_height(*row, *height)
                .context(WritingExcelSnafu { name })?;
        }
        debug!(
            "write_workbook: {}: sheet {:?} with {} cells",
            name,
            sheet.name,
            sheet.cells.len()
        );
    }

    workbook
        .save_to_buffer()
        .context(WritingExcelSnafu { name })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_xlsxwriter::XlsxError;

    /// Builds an xlsx file in memory from a list of (row, col, value).
    pub(crate) fn workbook_bytes(
        cells: &[(RowNum, ColNum, CellValue)],
        merges: &[CellRange],
    ) -> Result<Vec<u8>, XlsxError> {
        styled_workbook_bytes(cells, merges, &[])
    }

    /// Same, with a format for some of the cells.
    pub(crate) fn styled_workbook_bytes(
        cells: &[(RowNum, ColNum, CellValue)],
        merges: &[CellRange],
        formats: &[((RowNum, ColNum), Format)],
    ) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Results")?;
        let plain = Format::new();
        for m in merges {
            let top_left = cells
                .iter()
                .find(|(r, c, _)| (*r, *c) == m.first)
                .map(|(_, _, v)| v.as_text())
                .unwrap_or_default();
            worksheet.merge_range(m.first.0, m.first.1, m.last.0, m.last.1, &top_left, &plain)?;
        }
        for (row, col, value) in cells {
            if merges.iter().any(|m| m.first == (*row, *col)) {
                continue;
            }
            let format = formats
                .iter()
                .find(|(at, _)| *at == (*row, *col))
                .map(|(_, f)| f)
                .unwrap_or(&plain);
            match value {
                CellValue::Text(s) => {
                    worksheet.write_string_with_format(*row, *col, s.as_str(), format)?
                }
                CellValue::Number(f) => worksheet.write_number_with_format(*row, *col, *f, format)?,
                CellValue::Bool(b) => worksheet.write_boolean_with_format(*row, *col, *b, format)?,
            };
        }
        workbook.save_to_buffer()
    }

    #[test]
    fn read_values_and_merges() {
        let bytes = workbook_bytes(
            &[
                (0, 0, CellValue::Text("Survey results".to_string())),
                (22, 0, CellValue::Text("Question".to_string())),
                (23, 2, CellValue::Number(0.75)),
                (24, 1, CellValue::Bool(true)),
            ],
            &[CellRange {
                first: (0, 0),
                last: (0, 4),
            }],
        )
        .unwrap();
        let grid = read_sheet("upload.xlsx", &bytes).unwrap();
        assert_eq!(grid.name, "Results");
        assert_eq!(
            grid.get(0, 0),
            Some(&CellValue::Text("Survey results".to_string()))
        );
        assert_eq!(grid.get(23, 2), Some(&CellValue::Number(0.75)));
        assert_eq!(grid.get(24, 1), Some(&CellValue::Bool(true)));
        assert_eq!(
            grid.merged,
            vec![CellRange {
                first: (0, 0),
                last: (0, 4)
            }]
        );
    }

    #[test]
    fn not_a_workbook() {
        let res = read_sheet("broken.xlsx", b"this is not a zip file");
        assert!(matches!(res, Err(ReportError::OpeningExcel { .. })));
    }

    #[test]
    fn write_then_read() {
        let mut sheet = RenderedSheet::new("Report");
        sheet.put_text(0, 0, "Header", CellStyle::Header);
        sheet.put(1, 1, CellValue::Number(71.25), CellStyle::Average);
        sheet.put(2, 1, CellValue::Number(-4.0), CellStyle::Delta);
        sheet.column_widths.push((0, 40.0));
        sheet.row_heights.push((0, 30.0));
        let bytes = write_workbook("out.xlsx", &[&sheet], &ReportStyle::default(), None).unwrap();

        let grid = read_sheet("out.xlsx", &bytes).unwrap();
        assert_eq!(grid.name, "Report");
        assert_eq!(grid.get(0, 0), Some(&CellValue::Text("Header".to_string())));
        assert_eq!(grid.get(1, 1), Some(&CellValue::Number(71.25)));
        assert_eq!(grid.get(2, 1), Some(&CellValue::Number(-4.0)));
    }

    #[test]
    fn write_rejects_bad_style() {
        let style = ReportStyle {
            header_fill: "nope".to_string(),
            ..Default::default()
        };
        let sheet = RenderedSheet::new("Report");
        assert!(write_workbook("out.xlsx", &[&sheet], &style, None).is_err());
        let reference = CellFormat::default();
        assert!(write_workbook("out.xlsx", &[&sheet], &style, Some(&reference)).is_err());
    }

    #[test]
    fn header_follows_the_reference() {
        let mut sheet = RenderedSheet::new("Report");
        sheet.put_text(0, 0, "Question", CellStyle::Header);
        sheet.put_text(0, 3, "Question Order", CellStyle::Header);
        sheet.put_text(1, 0, "Q1 question", CellStyle::Body);
        let reference = CellFormat {
            font_name: Some("Arial".to_string()),
            font_size: Some(10.0),
            bold: true,
            font_rgb: Some(0x000000),
            fill_rgb: Some(0x92D050),
            align: Some(HeaderAlign::Left),
            wrap: false,
        };
        let bytes = write_workbook(
            "out.xlsx",
            &[&sheet],
            &ReportStyle::default(),
            Some(&reference),
        )
        .unwrap();
        let header = io_styles::read_cell_format("out.xlsx", &bytes, 0, 3)
            .unwrap()
            .unwrap();
        assert_eq!(header, reference);
        let body = io_styles::read_cell_format("out.xlsx", &bytes, 1, 0)
            .unwrap()
            .unwrap_or_default();
        assert_eq!(body.fill_rgb, None);
        assert!(!body.bold);

        // Without a reference, the header comes from the style.
        let bytes = write_workbook("out.xlsx", &[&sheet], &ReportStyle::default(), None).unwrap();
        let header = io_styles::read_cell_format("out.xlsx", &bytes, 0, 3)
            .unwrap()
            .unwrap();
        assert_eq!(header.fill_rgb, Some(0xD9E1F2));
        assert!(header.bold);
    }
}
