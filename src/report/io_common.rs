use std::collections::HashSet;
use std::path::Path;

use crate::report::sheet::{ColNum, RowNum};

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

pub fn has_xlsx_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|e| e.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false)
}

/// `results.xlsx` -> `results_clean.xlsx`
pub fn clean_file_name(name: &str, suffix: &str) -> String {
    let simple = simplify_file_name(name);
    let p = Path::new(simple.as_str());
    let stem = p
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    match p.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    }
}

/// Returns `name`, or `stem (2).ext`, `stem (3).ext`... when it is already taken.
pub fn unique_file_name(name: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(name) {
        return name.to_string();
    }
    let p = Path::new(name);
    let stem = p
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = p.extension().map(|e| e.to_string_lossy().to_string());
    (2..)
        .map(|n| match &ext {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        })
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Excel-style column letters: 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_name(col: ColNum) -> String {
    let mut n = col as u32 + 1;
    let mut res: Vec<char> = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        res.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    res.iter().rev().collect()
}

/// The A1 name of a 0-based cell position.
pub fn cell_name(row: RowNum, col: ColNum) -> String {
    format!("{}{}", column_name(col), row + 1)
}
