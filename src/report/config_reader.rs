use crate::report::*;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum HeaderAlign {
    #[serde(rename = "left")]
    Left,
    #[serde(rename = "center")]
    Center,
    #[serde(rename = "right")]
    Right,
}

/// The look of the written spreadsheets.
///
/// The header style stands for the reference header cell of the exports:
/// the new header cells are given the same font, fill and alignment.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportStyle {
    #[serde(rename = "fontName")]
    pub font_name: String,
    #[serde(rename = "fontSize")]
    pub font_size: f64,
    /// `#RRGGBB`
    #[serde(rename = "headerFill")]
    pub header_fill: String,
    #[serde(rename = "headerFontColor")]
    pub header_font_color: String,
    #[serde(rename = "headerAlign")]
    pub header_align: HeaderAlign,
    #[serde(rename = "headerWrap")]
    pub header_wrap: bool,
    #[serde(rename = "averageFormat")]
    pub average_format: String,
    #[serde(rename = "headerRowHeight")]
    pub header_row_height: f64,
    #[serde(rename = "rowHeight")]
    pub row_height: f64,
}

impl Default for ReportStyle {
    fn default() -> Self {
        ReportStyle {
            font_name: "Calibri".to_string(),
            font_size: 11.0,
            header_fill: "#D9E1F2".to_string(),
            header_font_color: "#000000".to_string(),
            header_align: HeaderAlign::Center,
            header_wrap: true,
            average_format: "0.0".to_string(),
            header_row_height: 30.0,
            row_height: 15.0,
        }
    }
}

impl ReportStyle {
    pub fn header_fill_rgb(&self) -> ReportResult<u32> {
        parse_rgb("headerFill", &self.header_fill)
    }

    pub fn header_font_rgb(&self) -> ReportResult<u32> {
        parse_rgb("headerFontColor", &self.header_font_color)
    }

    /// Checks the values that can only be checked once the configuration is loaded.
    pub fn validate(&self) -> ReportResult<()> {
        self.header_fill_rgb()?;
        self.header_font_rgb()?;
        if self.font_size <= 0.0 {
            whatever!("fontSize must be positive, got {}", self.font_size)
        }
        if self.header_row_height <= 0.0 || self.row_height <= 0.0 {
            whatever!(
                "row heights must be positive, got {} and {}",
                self.header_row_height,
                self.row_height
            )
        }
        Ok(())
    }
}

fn parse_rgb(field: &str, s: &str) -> ReportResult<u32> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        whatever!("{}: expected a colour as #RRGGBB, got {:?}", field, s)
    }
    match u32::from_str_radix(hex, 16) {
        Ok(x) => Ok(x),
        Err(e) => whatever!("{}: invalid colour {:?}: {}", field, s, e),
    }
}

/// Options for one batch of uploads.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub style: ReportStyle,
    /// Added to the name of each processed file, before the extension.
    pub suffix: String,
    #[serde(rename = "comparisonName")]
    pub comparison_name: String,
    #[serde(rename = "archiveName")]
    pub archive_name: String,
    /// Report the files that fail and go on with the others, instead of failing the batch.
    #[serde(rename = "isolateFailures")]
    pub isolate_failures: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            style: ReportStyle::default(),
            suffix: "_clean".to_string(),
            comparison_name: "Leader-Team_Comparison".to_string(),
            archive_name: "survey_reports.zip".to_string(),
            isolate_failures: false,
        }
    }
}

pub fn read_config(path: &str) -> ReportResult<ReportConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ReportConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    config.style.validate()?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config() {
        let js = r##"{"suffix": "_done", "style": {"fontName": "Arial", "headerFill": "#FFEEDD"}}"##;
        let config: ReportConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.suffix, "_done");
        assert_eq!(config.style.font_name, "Arial");
        assert_eq!(config.style.font_size, 11.0);
        assert_eq!(config.style.header_fill_rgb().unwrap(), 0xFFEEDD);
        assert_eq!(config.comparison_name, "Leader-Team_Comparison");
        assert!(!config.isolate_failures);
    }

    #[test]
    fn bad_colour() {
        let style = ReportStyle {
            header_fill: "blue".to_string(),
            ..Default::default()
        };
        assert!(style.validate().is_err());
        let style = ReportStyle {
            header_font_color: "#12345".to_string(),
            ..Default::default()
        };
        assert!(style.validate().is_err());
        for bad in ["+FFFFF", "#-12345", "#12 345", "#ÉÉÉ"] {
            let style = ReportStyle {
                header_fill: bad.to_string(),
                ..Default::default()
            };
            assert!(style.validate().is_err(), "{:?}", bad);
        }
        assert_eq!(parse_rgb("headerFill", " #d9e1f2 ").unwrap(), 0xD9E1F2);
        assert!(ReportStyle::default().validate().is_ok());
    }

    #[test]
    fn header_align_names() {
        let style: ReportStyle = serde_json::from_str(r#"{"headerAlign": "left"}"#).unwrap();
        assert_eq!(style.header_align, HeaderAlign::Left);
    }
}
