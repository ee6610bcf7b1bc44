// The fixed category hierarchy of the questionnaires.
//
// The enums are declared in taxonomy order: this order is used everywhere a
// list of categories is displayed.

use crate::config::TemplateKind;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Category1 {
    Thrive,
    JustLeader,
}

impl Category1 {
    pub const ALL: [Category1; 2] = [Category1::Thrive, Category1::JustLeader];

    pub fn label(&self) -> &'static str {
        match self {
            Category1::Thrive => "THRIVE",
            Category1::JustLeader => "Just Leader",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Category2 {
    Trust,
    Health,
    Relationships,
    Impact,
    Value,
    Engagement,
    Purpose,
    Growth,
    Recognition,
    JustLeader,
}

impl Category2 {
    pub const ALL: [Category2; 10] = [
        Category2::Trust,
        Category2::Health,
        Category2::Relationships,
        Category2::Impact,
        Category2::Value,
        Category2::Engagement,
        Category2::Purpose,
        Category2::Growth,
        Category2::Recognition,
        Category2::JustLeader,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category2::Trust => "Trust",
            Category2::Health => "Health",
            Category2::Relationships => "Relationships",
            Category2::Impact => "Impact",
            Category2::Value => "Value",
            Category2::Engagement => "Engagement",
            Category2::Purpose => "Purpose",
            Category2::Growth => "Growth",
            Category2::Recognition => "Recognition",
            Category2::JustLeader => "Just Leader",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Category3 {
    Leader,
    Team,
    /// Questions that have no leader / team split (the Health questions).
    NotApplicable,
}

impl Category3 {
    pub const ALL: [Category3; 3] = [
        Category3::Leader,
        Category3::Team,
        Category3::NotApplicable,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category3::Leader => "Leader",
            Category3::Team => "Team",
            Category3::NotApplicable => "n/a",
        }
    }
}

/// How a template is recognized from its question table.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RowSignature {
    RowCount(usize),
    FirstLabelPrefix(&'static str),
    Fallback,
}

/// Everything that distinguishes one template from another, apart from the
/// positions in the spreadsheet.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TemplateDescriptor {
    pub kind: TemplateKind,
    pub signature: RowSignature,
    pub level1: &'static [(Category1, usize)],
    pub level2: &'static [(Category2, usize)],
    pub level3: Option<&'static [(Category3, usize)]>,
    /// 1st order categories that get no average of their own.
    pub suppressed_level1: &'static [Category1],
    /// 2nd order categories that get no average of their own.
    pub suppressed_level2: &'static [Category2],
}

impl TemplateDescriptor {
    /// The number of questions the repetition counts cover.
    pub fn question_count(&self) -> usize {
        self.level2.iter().map(|(_, n)| n).sum()
    }
}

/// Expands a list of repetition counts into one label per question.
pub fn expand<T: Copy>(repetitions: &[(T, usize)]) -> Vec<T> {
    repetitions
        .iter()
        .flat_map(|(c, n)| std::iter::repeat(*c).take(*n))
        .collect()
}

use Category1 as C1;
use Category2 as C2;
use Category3 as C3;

const REVIEW_LEVEL1: [(Category1, usize); 2] = [(C1::Thrive, 30), (C1::JustLeader, 8)];

const REVIEW_LEVEL2: [(Category2, usize); 7] = [
    (C2::Trust, 5),
    (C2::Health, 5),
    (C2::Relationships, 5),
    (C2::Impact, 5),
    (C2::Value, 5),
    (C2::Engagement, 5),
    (C2::JustLeader, 8),
];

const NO_LEADER_LEVEL1: [(Category1, usize); 1] = [(C1::Thrive, 47)];

const NO_LEADER_LEVEL2: [(Category2, usize); 9] = [
    (C2::Trust, 5),
    (C2::Health, 5),
    (C2::Relationships, 5),
    (C2::Impact, 5),
    (C2::Value, 5),
    (C2::Engagement, 5),
    (C2::Purpose, 6),
    (C2::Growth, 6),
    (C2::Recognition, 5),
];

const LEADER_TEAM_LEVEL1: [(Category1, usize); 2] = [(C1::Thrive, 70), (C1::JustLeader, 10)];

const LEADER_TEAM_LEVEL2: [(Category2, usize); 10] = [
    (C2::Trust, 8),
    (C2::Health, 6),
    (C2::Relationships, 8),
    (C2::Impact, 8),
    (C2::Value, 8),
    (C2::Engagement, 8),
    (C2::Purpose, 8),
    (C2::Growth, 8),
    (C2::Recognition, 8),
    (C2::JustLeader, 10),
];

// Each 2nd order block is asked first about the leader, then about the team.
// The Health block follows the same pattern in the questionnaire, its labels
// are overridden afterwards.
const LEADER_TEAM_LEVEL3: [(Category3, usize); 20] = [
    (C3::Leader, 4),
    (C3::Team, 4),
    (C3::Leader, 3),
    (C3::Team, 3),
    (C3::Leader, 4),
    (C3::Team, 4),
    (C3::Leader, 4),
    (C3::Team, 4),
    (C3::Leader, 4),
    (C3::Team, 4),
    (C3::Leader, 4),
    (C3::Team, 4),
    (C3::Leader, 4),
    (C3::Team, 4),
    (C3::Leader, 4),
    (C3::Team, 4),
    (C3::Leader, 4),
    (C3::Team, 4),
    (C3::Leader, 5),
    (C3::Team, 5),
];

pub const REVIEW: TemplateDescriptor = TemplateDescriptor {
    kind: TemplateKind::Review,
    signature: RowSignature::RowCount(38),
    level1: &REVIEW_LEVEL1,
    level2: &REVIEW_LEVEL2,
    level3: None,
    suppressed_level1: &[C1::JustLeader],
    suppressed_level2: &[C2::JustLeader],
};

pub const NO_LEADER: TemplateDescriptor = TemplateDescriptor {
    kind: TemplateKind::NoLeader,
    signature: RowSignature::RowCount(47),
    level1: &NO_LEADER_LEVEL1,
    level2: &NO_LEADER_LEVEL2,
    level3: None,
    suppressed_level1: &[],
    suppressed_level2: &[],
};

pub const LEADER: TemplateDescriptor = TemplateDescriptor {
    kind: TemplateKind::Leader,
    signature: RowSignature::FirstLabelPrefix("Q7"),
    level1: &LEADER_TEAM_LEVEL1,
    level2: &LEADER_TEAM_LEVEL2,
    level3: Some(&LEADER_TEAM_LEVEL3),
    suppressed_level1: &[],
    suppressed_level2: &[],
};

pub const TEAM: TemplateDescriptor = TemplateDescriptor {
    kind: TemplateKind::Team,
    signature: RowSignature::Fallback,
    level1: &LEADER_TEAM_LEVEL1,
    level2: &LEADER_TEAM_LEVEL2,
    level3: Some(&LEADER_TEAM_LEVEL3),
    suppressed_level1: &[],
    suppressed_level2: &[],
};

/// The templates, in the order in which their signatures are checked.
/// The order matters: the prefix check must only run once the row counts
/// did not match, and the fallback must come last.
pub const CLASSIFICATION_ORDER: [&TemplateDescriptor; 4] = [&REVIEW, &NO_LEADER, &LEADER, &TEAM];

pub fn descriptor(kind: TemplateKind) -> &'static TemplateDescriptor {
    match kind {
        TemplateKind::Review => &REVIEW,
        TemplateKind::NoLeader => &NO_LEADER,
        TemplateKind::Leader => &LEADER,
        TemplateKind::Team => &TEAM,
    }
}
