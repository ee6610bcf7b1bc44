pub use crate::config::*;

/// A builder for question tables.
///
/// It takes the cells as they come out of the export and checks that the
/// question numbers and the scores can be understood.
///
/// ```
/// use survey_scoring::builder::Builder;
/// use survey_scoring::{RawScore, ScoringError};
///
/// let mut builder = Builder::new();
/// builder.add_row("Q2 I trust my team", "Easy", &RawScore::Text("75%".to_string()))?;
/// builder.add_row("Q1 I feel valued", "Hard", &RawScore::Number(0.5))?;
/// let table = builder.build()?;
///
/// assert_eq!(table.rows[1].score, 50);
/// # Ok::<(), ScoringError>(())
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    _rows: Vec<SurveyRow>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder { _rows: Vec::new() }
    }

    /// Adds one question. The rows are kept in the order they are added.
    pub fn add_row(
        &mut self,
        label: &str,
        difficulty: &str,
        score: &RawScore,
    ) -> Result<(), ScoringError> {
        let label = label.trim().to_string();
        let number = parse_question_number(&label)?;
        let score = parse_score(&label, score)?;
        self._rows.push(SurveyRow {
            label,
            difficulty: difficulty.trim().to_string(),
            score,
            number,
        });
        Ok(())
    }

    pub fn build(self) -> Result<QuestionTable, ScoringError> {
        if self._rows.is_empty() {
            return Err(ScoringError::EmptyTable);
        }
        Ok(QuestionTable { rows: self._rows })
    }
}

/// The number of a question is the first group of digits in its label:
/// `Q12 Some question` -> 12.
pub fn parse_question_number(label: &str) -> Result<u32, ScoringError> {
    let digits: String = label
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse::<u32>()
        .map_err(|_| ScoringError::MalformedQuestionLabel {
            label: label.to_string(),
        })
}

pub fn parse_score(label: &str, score: &RawScore) -> Result<u8, ScoringError> {
    let malformed = |value: String| ScoringError::MalformedScoreValue {
        label: label.to_string(),
        value,
    };
    match score {
        RawScore::Text(s) => {
            let trimmed = s.trim();
            let digits = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
            match digits.parse::<u8>() {
                Ok(x) if x <= 100 => Ok(x),
                _ => Err(malformed(s.clone())),
            }
        }
        // Excel stores a cell displayed as 50% as 0.5.
        RawScore::Number(f) if (0.0..=1.0).contains(f) => to_percent(f * 100.0)
            .ok_or_else(|| malformed(f.to_string())),
        RawScore::Number(f) if *f > 1.0 && *f <= 100.0 => {
            to_percent(*f).ok_or_else(|| malformed(f.to_string()))
        }
        RawScore::Number(f) => Err(malformed(f.to_string())),
        RawScore::Missing => Err(malformed("".to_string())),
    }
}

fn to_percent(x: f64) -> Option<u8> {
    let rounded = x.round();
    // Only tolerate the noise of the fraction representation.
    if (x - rounded).abs() < 1e-6 {
        Some(rounded as u8)
    } else {
        None
    }
}
