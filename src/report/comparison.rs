// The Leader / Team comparison workbook.

use survey_scoring::ComparisonRow;

use crate::report::sheet::*;

pub const COMPARISON_SHEET: &str = "Comparison";

pub const COL_ORDER: ColNum = 0;
pub const COL_LEADER_QUESTION: ColNum = 1;
pub const COL_LEADER_SCORE: ColNum = 2;
pub const COL_TEAM_QUESTION: ColNum = 3;
pub const COL_TEAM_SCORE: ColNum = 4;
pub const COL_DELTA: ColNum = 5;

const HEADERS: [(ColNum, &str); 6] = [
    (COL_ORDER, "Question Order"),
    (COL_LEADER_QUESTION, "Leader Question"),
    (COL_LEADER_SCORE, "Leader Score (%)"),
    (COL_TEAM_QUESTION, "Team Question"),
    (COL_TEAM_SCORE, "Team Score (%)"),
    (COL_DELTA, "Score Delta"),
];

const WIDTHS: [f64; 6] = [16.0, 70.0, 16.0, 70.0, 16.0, 12.0];

/// One header row, then one line per joined question, in the order given.
pub fn render_comparison(rows: &[ComparisonRow]) -> RenderedSheet {
    let mut out = RenderedSheet::new(COMPARISON_SHEET);
    for (col, header) in HEADERS {
        out.put_text(0, col, header, CellStyle::Header);
    }
    for (idx, r) in rows.iter().enumerate() {
        let row = 1 + idx as RowNum;
        out.put(
            row,
            COL_ORDER,
            CellValue::Number(r.question_order as f64),
            CellStyle::Body,
        );
        out.put_text(row, COL_LEADER_QUESTION, &r.leader_question, CellStyle::Body);
        out.put(
            row,
            COL_LEADER_SCORE,
            CellValue::Number(r.leader_score as f64),
            CellStyle::Body,
        );
        out.put_text(row, COL_TEAM_QUESTION, &r.team_question, CellStyle::Body);
        out.put(
            row,
            COL_TEAM_SCORE,
            CellValue::Number(r.team_score as f64),
            CellStyle::Body,
        );
        out.put(
            row,
            COL_DELTA,
            CellValue::Number(r.delta as f64),
            CellStyle::Delta,
        );
    }
    out.column_widths = WIDTHS
        .iter()
        .enumerate()
        .map(|(col, w)| (col as ColNum, *w))
        .collect();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(order: u32, leader: u8, team: u8) -> ComparisonRow {
        ComparisonRow {
            question_order: order,
            leader_question: format!("Q{} leader", order + 6),
            leader_score: leader,
            team_question: format!("Q{} team", order),
            team_score: team,
            delta: leader as i32 - team as i32,
        }
    }

    #[test]
    fn one_line_per_row() {
        let sheet = render_comparison(&[row(3, 90, 60), row(1, 50, 55)]);
        assert_eq!(sheet.name, "Comparison");
        assert_eq!(
            sheet.get(0, COL_DELTA).map(|c| c.style),
            Some(CellStyle::Header)
        );
        assert_eq!(
            sheet.get(1, COL_ORDER).map(|c| c.value.clone()),
            Some(CellValue::Number(3.0))
        );
        assert_eq!(
            sheet.get(1, COL_LEADER_QUESTION).map(|c| c.value.as_text()),
            Some("Q9 leader".to_string())
        );
        let delta = sheet.get(2, COL_DELTA).unwrap();
        assert_eq!(delta.value, CellValue::Number(-5.0));
        assert_eq!(delta.style, CellStyle::Delta);
        assert!(sheet.get(3, COL_ORDER).is_none());
        assert_eq!(sheet.column_widths.len(), 6);
    }

    #[test]
    fn empty_comparison() {
        let sheet = render_comparison(&[]);
        assert_eq!(sheet.cells.len(), HEADERS.len());
    }
}
