// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

pub use crate::taxonomy::{Category1, Category2, Category3};

/// The score cell of a question, as found in the export.
///
/// The exports are not consistent: most of them carry the score as a
/// percentage string, some were re-saved and carry a plain number.
#[derive(PartialEq, Debug, Clone)]
pub enum RawScore {
    Text(String),
    Number(f64),
    Missing,
}

/// One question of the survey, as read from the export.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveyRow {
    /// The full question label, for example `Q7 My manager listens to me`.
    pub label: String,
    pub difficulty: String,
    /// Average score, in percent (0 - 100).
    pub score: u8,
    /// The number embedded in the label. Used to restore the question order.
    pub number: u32,
}

/// All the questions of one export, in the order in which they were read.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct QuestionTable {
    pub rows: Vec<SurveyRow>,
}

impl QuestionTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rows sorted by the number in their label, paired with their
    /// question order (1..N).
    ///
    /// The sort is stable: two labels with the same number keep their
    /// upload order.
    pub fn in_question_order(&self) -> Vec<(u32, &SurveyRow)> {
        let mut sorted: Vec<&SurveyRow> = self.rows.iter().collect();
        sorted.sort_by_key(|r| r.number);
        sorted
            .into_iter()
            .enumerate()
            .map(|(idx, r)| ((idx + 1) as u32, r))
            .collect()
    }
}

/// The four known survey layouts.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum TemplateKind {
    Review,
    NoLeader,
    Leader,
    Team,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 4] = [
        TemplateKind::Review,
        TemplateKind::NoLeader,
        TemplateKind::Leader,
        TemplateKind::Team,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TemplateKind::Review => "Review",
            TemplateKind::NoLeader => "NoLeader",
            TemplateKind::Leader => "Leader",
            TemplateKind::Team => "Team",
        }
    }

    /// True for the templates that split questions between the leader and the team.
    pub fn has_third_level(&self) -> bool {
        matches!(self, TemplateKind::Leader | TemplateKind::Team)
    }
}

// ******** Output data structures *********

/// A question with its position in the questionnaire and its categories.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CategorizedRow {
    pub row: SurveyRow,
    pub question_order: u32,
    pub category1: Category1,
    pub category2: Category2,
    /// Only for the Leader and Team templates.
    pub category3: Option<Category3>,
}

/// Average scores of one level of the hierarchy, in taxonomy order.
///
/// A `None` average means that the template does not report an average for
/// this category, although its questions still count in the overall average.
#[derive(PartialEq, Debug, Clone)]
pub struct CategorySummary<K> {
    pub entries: Vec<(K, Option<f64>)>,
}

impl<K: PartialEq> CategorySummary<K> {
    pub fn get(&self, key: &K) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Summaries {
    pub level1: CategorySummary<Category1>,
    pub level2: CategorySummary<Category2>,
    /// Leader / Team breakdown of each 2nd order category. Health is never part of it.
    pub level3: Option<CategorySummary<(Category2, Category3)>>,
    pub overall: f64,
}

/// One line of the Leader / Team comparison.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ComparisonRow {
    pub question_order: u32,
    pub leader_question: String,
    pub leader_score: u8,
    pub team_question: String,
    pub team_score: u8,
    /// Leader score minus team score.
    pub delta: i32,
}

/// Errors that prevent a question table from being scored.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ScoringError {
    EmptyTable,
    /// None of the template checks matched.
    AmbiguousTemplate { rows: usize },
    /// The repetition counts of a level do not cover the questions exactly.
    CategoryLengthMismatch {
        template: TemplateKind,
        level: u8,
        expected: usize,
        actual: usize,
    },
    MalformedScoreValue { label: String, value: String },
    MalformedQuestionLabel { label: String },
}

impl Error for ScoringError {}

impl Display for ScoringError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringError::EmptyTable => write!(f, "the survey table does not contain any question"),
            ScoringError::AmbiguousTemplate { rows } => {
                write!(f, "could not recognize the survey template ({} questions)", rows)
            }
            ScoringError::CategoryLengthMismatch {
                template,
                level,
                expected,
                actual,
            } => write!(
                f,
                "the {} template expects {} questions at category level {}, found {}",
                template.name(),
                expected,
                level,
                actual
            ),
            ScoringError::MalformedScoreValue { label, value } => {
                write!(f, "invalid score {:?} for question {:?}", value, label)
            }
            ScoringError::MalformedQuestionLabel { label } => {
                write!(f, "no question number found in label {:?}", label)
            }
        }
    }
}
