mod config;
mod taxonomy;
use log::{debug, info, warn};

use std::collections::HashMap;

pub mod builder;
pub mod manual;

pub use crate::config::*;
pub use crate::taxonomy::{
    descriptor, expand, RowSignature, TemplateDescriptor, CLASSIFICATION_ORDER,
};

/// Finds which template a question table was exported from.
///
/// The exports do not say which questionnaire they come from. The checks are
/// run in a fixed order and the first one that matches wins:
/// * 38 questions: Review
/// * 47 questions: NoLeader
/// * lowest-numbered question labelled `Q7...`: Leader (the upload order
///   is not reliable, so it is not used)
/// * anything else: Team
pub fn classify(table: &QuestionTable) -> Result<TemplateKind, ScoringError> {
    for d in CLASSIFICATION_ORDER.iter() {
        let matched = match d.signature {
            RowSignature::RowCount(n) => table.len() == n,
            RowSignature::FirstLabelPrefix(prefix) => table
                .in_question_order()
                .first()
                .map(|(_, r)| r.label.starts_with(prefix))
                .unwrap_or(false),
            RowSignature::Fallback => !table.is_empty(),
        };
        if matched {
            debug!(
                "classify: {} rows matched {:?} with {:?}",
                table.len(),
                d.kind,
                d.signature
            );
            return Ok(d.kind);
        }
    }
    Err(ScoringError::AmbiguousTemplate { rows: table.len() })
}

/// Gives every question its question order and its categories.
///
/// The categories are attributed by position, once the questions have been
/// put back in the order of their numbers. The output is in question order.
pub fn assign(
    table: &QuestionTable,
    kind: TemplateKind,
) -> Result<Vec<CategorizedRow>, ScoringError> {
    let d = descriptor(kind);
    let ordered = table.in_question_order();

    let level1 = expand_checked(d.level1, kind, 1, ordered.len())?;
    let level2 = expand_checked(d.level2, kind, 2, ordered.len())?;
    let level3 = match d.level3 {
        Some(reps) => Some(expand_checked(reps, kind, 3, ordered.len())?),
        None => None,
    };

    let res: Vec<CategorizedRow> = ordered
        .into_iter()
        .enumerate()
        .map(|(idx, (question_order, row))| {
            let category2 = level2[idx];
            let category3 = level3.as_ref().map(|l3| {
                // Health is not split between leader and team in the questionnaire.
                if category2 == Category2::Health {
                    Category3::NotApplicable
                } else {
                    l3[idx]
                }
            });
            CategorizedRow {
                row: row.clone(),
                question_order,
                category1: level1[idx],
                category2,
                category3,
            }
        })
        .collect();
    info!(
        "assign: {} questions categorized with the {} template",
        res.len(),
        kind.name()
    );
    Ok(res)
}

fn expand_checked<T: Copy>(
    repetitions: &[(T, usize)],
    template: TemplateKind,
    level: u8,
    actual: usize,
) -> Result<Vec<T>, ScoringError> {
    let labels = expand(repetitions);
    if labels.len() != actual {
        return Err(ScoringError::CategoryLengthMismatch {
            template,
            level,
            expected: labels.len(),
            actual,
        });
    }
    Ok(labels)
}

/// Computes the average scores of each level of the hierarchy, and the overall average.
///
/// Averages are plain arithmetic means over the questions of a category, at
/// full precision. Rounding is left to the presentation.
pub fn aggregate(rows: &[CategorizedRow], kind: TemplateKind) -> Result<Summaries, ScoringError> {
    if rows.is_empty() {
        return Err(ScoringError::EmptyTable);
    }
    let d = descriptor(kind);

    let level1 = summarize(rows, &Category1::ALL, |r| Some(r.category1), |c| {
        !d.suppressed_level1.contains(c)
    });
    let level2 = summarize(rows, &Category2::ALL, |r| Some(r.category2), |c| {
        !d.suppressed_level2.contains(c)
    });

    let level3 = if kind.has_third_level() {
        let keys: Vec<(Category2, Category3)> = Category2::ALL
            .iter()
            .filter(|c2| **c2 != Category2::Health)
            .flat_map(|c2| [(*c2, Category3::Leader), (*c2, Category3::Team)])
            .collect();
        Some(summarize(
            rows,
            &keys,
            |r| match r.category3 {
                Some(Category3::NotApplicable) | None => None,
                Some(c3) if r.category2 != Category2::Health => Some((r.category2, c3)),
                Some(_) => None,
            },
            |_| true,
        ))
    } else {
        None
    };

    let overall = mean(rows.iter().map(|r| r.row.score));
    debug!(
        "aggregate: {:?} level1: {:?} level2: {:?} overall: {}",
        kind, level1, level2, overall
    );
    Ok(Summaries {
        level1,
        level2,
        level3,
        overall,
    })
}

// Groups the scores by key and averages them. Keys without any question are
// left out, the others keep the order of `order`.
fn summarize<K, F, G>(
    rows: &[CategorizedRow],
    order: &[K],
    key: F,
    reported: G,
) -> CategorySummary<K>
where
    K: Copy + Eq + std::hash::Hash,
    F: Fn(&CategorizedRow) -> Option<K>,
    G: Fn(&K) -> bool,
{
    let mut groups: HashMap<K, Vec<u8>> = HashMap::new();
    for r in rows {
        if let Some(k) = key(r) {
            groups.entry(k).or_default().push(r.row.score);
        }
    }
    let entries = order
        .iter()
        .filter_map(|k| {
            groups.get(k).map(|scores| {
                let avg = if reported(k) {
                    Some(mean(scores.iter().cloned()))
                } else {
                    None
                };
                (*k, avg)
            })
        })
        .collect();
    CategorySummary { entries }
}

fn mean<I: Iterator<Item = u8>>(scores: I) -> f64 {
    let (total, count) = scores.fold((0u64, 0u64), |(t, c), s| (t + s as u64, c + 1));
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Joins the Leader and the Team answers on the question order.
///
/// Questions that appear on one side only are dropped. The result is sorted
/// by decreasing delta (largest leader advantage first), then by question order.
pub fn compare(leader: &[CategorizedRow], team: &[CategorizedRow]) -> Vec<ComparisonRow> {
    let team_by_order: HashMap<u32, &CategorizedRow> =
        team.iter().map(|r| (r.question_order, r)).collect();

    let mut res: Vec<ComparisonRow> = leader
        .iter()
        .filter_map(|l| {
            team_by_order.get(&l.question_order).map(|t| ComparisonRow {
                question_order: l.question_order,
                leader_question: l.row.label.clone(),
                leader_score: l.row.score,
                team_question: t.row.label.clone(),
                team_score: t.row.score,
                delta: l.row.score as i32 - t.row.score as i32,
            })
        })
        .collect();

    let dropped = leader.len() + team.len() - 2 * res.len();
    if dropped > 0 {
        warn!(
            "compare: {} leader and {} team questions, {} question(s) without a counterpart were dropped",
            leader.len(),
            team.len(),
            dropped
        );
    }

    res.sort_by(|a, b| {
        b.delta
            .cmp(&a.delta)
            .then(a.question_order.cmp(&b.question_order))
    });
    res
}

/// Runs the classification, the category assignment and the aggregation on one table.
pub fn score_table(
    table: &QuestionTable,
) -> Result<(TemplateKind, Vec<CategorizedRow>, Summaries), ScoringError> {
    let kind = classify(table)?;
    info!("score_table: {} questions, template {}", table.len(), kind.name());
    let rows = assign(table, kind)?;
    let summaries = aggregate(&rows, kind)?;
    Ok((kind, rows, summaries))
}

#[cfg(test)]
mod tests {
    use super::builder::Builder;
    use super::*;

    // Questions numbered `first..first + n`, with scores cycling over 50..=98.
    fn table_from(first: u32, n: u32, reversed: bool) -> QuestionTable {
        let mut numbers: Vec<u32> = (first..first + n).collect();
        if reversed {
            numbers.reverse();
        }
        let mut b = Builder::new();
        for q in numbers {
            let score = 50 + (q % 49);
            b.add_row(
                &format!("Q{} question number {}", q, q),
                "Medium",
                &RawScore::Text(format!("{}%", score)),
            )
            .unwrap();
        }
        b.build().unwrap()
    }

    fn table_with_scores(first: u32, scores: &[u8]) -> QuestionTable {
        let mut b = Builder::new();
        for (i, s) in scores.iter().enumerate() {
            b.add_row(
                &format!("Q{} text", first + i as u32),
                "",
                &RawScore::Text(format!("{}%", s)),
            )
            .unwrap();
        }
        b.build().unwrap()
    }

    #[test]
    fn classify_by_row_count_first() {
        assert_eq!(classify(&table_from(1, 38, false)), Ok(TemplateKind::Review));
        assert_eq!(classify(&table_from(1, 47, false)), Ok(TemplateKind::NoLeader));
        // The row count wins over the prefix.
        assert_eq!(classify(&table_from(7, 38, false)), Ok(TemplateKind::Review));
        assert_eq!(classify(&table_from(7, 80, false)), Ok(TemplateKind::Leader));
        assert_eq!(classify(&table_from(1, 80, false)), Ok(TemplateKind::Team));
        assert_eq!(classify(&table_from(1, 12, false)), Ok(TemplateKind::Team));
    }

    #[test]
    fn classify_prefix_ignores_upload_order() {
        // Q7..Q86 reversed: the first row is Q86, the lowest question is Q7.
        assert_eq!(classify(&table_from(7, 80, true)), Ok(TemplateKind::Leader));
        // Q1..Q80 reversed: the first row is Q80.
        assert_eq!(classify(&table_from(1, 80, true)), Ok(TemplateKind::Team));
        // Q70 starts with the literal prefix.
        assert_eq!(classify(&table_from(70, 60, false)), Ok(TemplateKind::Leader));

        // Shuffled: Q7 somewhere in the middle of the upload.
        let mut b = Builder::new();
        for q in (47..87).chain(7..47) {
            b.add_row(&format!("Q{} text", q), "", &RawScore::Text("50%".to_string()))
                .unwrap();
        }
        let shuffled = b.build().unwrap();
        assert!(shuffled.rows[0].label.starts_with("Q47"));
        assert_eq!(classify(&shuffled), Ok(TemplateKind::Leader));
    }

    #[test]
    fn classify_is_deterministic() {
        let t = table_from(7, 80, false);
        let first = classify(&t);
        for _ in 0..10 {
            assert_eq!(classify(&t), first);
        }
    }

    #[test]
    fn classify_empty_table() {
        let t = QuestionTable::default();
        assert_eq!(classify(&t), Err(ScoringError::AmbiguousTemplate { rows: 0 }));
    }

    #[test]
    fn assign_covers_every_row() {
        for (first, n) in [(1, 38), (1, 47), (7, 80), (1, 80)] {
            let t = table_from(first, n, false);
            let kind = classify(&t).unwrap();
            let rows = assign(&t, kind).unwrap();
            assert_eq!(rows.len(), t.len());
            let d = descriptor(kind);
            for (c2, count) in d.level2 {
                let found = rows.iter().filter(|r| r.category2 == *c2).count();
                assert_eq!(found, *count, "{:?} {:?}", kind, c2);
            }
            for (c1, count) in d.level1 {
                let found = rows.iter().filter(|r| r.category1 == *c1).count();
                assert_eq!(found, *count, "{:?} {:?}", kind, c1);
            }
            assert_eq!(rows.iter().all(|r| r.category3.is_some()), kind.has_third_level());
        }
    }

    #[test]
    fn assign_length_mismatch() {
        let t = table_from(1, 79, false);
        assert_eq!(
            assign(&t, TemplateKind::Team),
            Err(ScoringError::CategoryLengthMismatch {
                template: TemplateKind::Team,
                level: 1,
                expected: 80,
                actual: 79
            })
        );
        assert!(assign(&table_from(1, 38, false), TemplateKind::NoLeader).is_err());
    }

    #[test]
    fn assign_health_has_no_split() {
        let t = table_from(7, 80, false);
        let rows = assign(&t, TemplateKind::Leader).unwrap();
        for r in rows.iter() {
            if r.category2 == Category2::Health {
                assert_eq!(r.category3, Some(Category3::NotApplicable));
            } else {
                assert_ne!(r.category3, Some(Category3::NotApplicable));
            }
        }
        assert_eq!(rows[0].category3, Some(Category3::Leader));
        assert_eq!(rows[4].category3, Some(Category3::Team));
    }

    #[test]
    fn reversed_review_scenario() {
        let t = table_from(1, 38, true);
        assert_eq!(t.rows[0].number, 38);
        let (kind, rows, summaries) = score_table(&t).unwrap();
        assert_eq!(kind, TemplateKind::Review);

        let orders: Vec<u32> = rows.iter().map(|r| r.question_order).collect();
        assert_eq!(orders, (1..=38).collect::<Vec<u32>>());
        let numbers: Vec<u32> = rows.iter().map(|r| r.row.number).collect();
        assert_eq!(numbers, (1..=38).collect::<Vec<u32>>());

        let c2: Vec<Category2> = rows.iter().map(|r| r.category2).collect();
        assert_eq!(c2, expand(descriptor(TemplateKind::Review).level2));
        assert!(rows[30..].iter().all(|r| r.category1 == Category1::JustLeader));

        // No average for Just Leader at either level, but it counts in the
        // overall average.
        assert_eq!(summaries.level1.len(), 2);
        assert_eq!(summaries.level1.get(&Category1::JustLeader), None);
        assert_eq!(summaries.level2.len(), 7);
        assert_eq!(summaries.level2.get(&Category2::JustLeader), None);
        assert!(summaries.level2.get(&Category2::Engagement).is_some());
        let all: f64 = rows.iter().map(|r| r.row.score as f64).sum::<f64>() / 38.0;
        assert!((summaries.overall - all).abs() < 1e-9);
        assert!(summaries.level3.is_none());
    }

    #[test]
    fn level1_matches_direct_recomputation() {
        let t = table_from(7, 80, false);
        let rows = assign(&t, TemplateKind::Leader).unwrap();
        let s = aggregate(&rows, TemplateKind::Leader).unwrap();
        for c1 in Category1::ALL {
            let scores: Vec<f64> = rows
                .iter()
                .filter(|r| r.category1 == c1)
                .map(|r| r.row.score as f64)
                .collect();
            let expected = scores.iter().sum::<f64>() / scores.len() as f64;
            let got = s.level1.get(&c1).unwrap();
            assert!((got - expected).abs() < 1e-9, "{:?}", c1);
        }
    }

    #[test]
    fn just_leader_reported_outside_review() {
        let t = table_with_scores(7, &[60u8; 80]);
        let rows = assign(&t, TemplateKind::Leader).unwrap();
        let s = aggregate(&rows, TemplateKind::Leader).unwrap();
        assert_eq!(s.level1.get(&Category1::JustLeader), Some(60.0));
        assert_eq!(s.level2.get(&Category2::JustLeader), Some(60.0));
    }

    #[test]
    fn summaries_follow_taxonomy_order() {
        let t = table_from(1, 47, false);
        let rows = assign(&t, TemplateKind::NoLeader).unwrap();
        let s = aggregate(&rows, TemplateKind::NoLeader).unwrap();
        let keys: Vec<Category2> = s.level2.entries.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                Category2::Trust,
                Category2::Health,
                Category2::Relationships,
                Category2::Impact,
                Category2::Value,
                Category2::Engagement,
                Category2::Purpose,
                Category2::Growth,
                Category2::Recognition,
            ]
        );
        assert_eq!(s.level1.entries.len(), 1);
    }

    #[test]
    fn level3_excludes_health() {
        let mut scores = vec![60u8; 80];
        // Trust: leader questions at 80, team questions at 40.
        for s in scores.iter_mut().take(4) {
            *s = 80;
        }
        for s in scores.iter_mut().skip(4).take(4) {
            *s = 40;
        }
        let t = table_with_scores(1, &scores);
        let rows = assign(&t, TemplateKind::Team).unwrap();
        let s = aggregate(&rows, TemplateKind::Team).unwrap();
        let l3 = s.level3.unwrap();
        assert_eq!(l3.len(), 18);
        assert!(l3.entries.iter().all(|((c2, _), _)| *c2 != Category2::Health));
        assert_eq!(l3.get(&(Category2::Trust, Category3::Leader)), Some(80.0));
        assert_eq!(l3.get(&(Category2::Trust, Category3::Team)), Some(40.0));
        assert_eq!(s.level2.get(&Category2::Trust), Some(60.0));
        assert_eq!(s.level2.get(&Category2::Health), Some(60.0));
    }

    #[test]
    fn compare_sorts_by_delta() {
        let leader = assign(&table_from(7, 80, false), TemplateKind::Leader).unwrap();
        let mut team_scores = vec![70u8; 80];
        team_scores[10] = 20;
        let team = assign(&table_with_scores(1, &team_scores), TemplateKind::Team).unwrap();

        let res = compare(&leader, &team);
        assert_eq!(res.len(), 80);
        let max_delta = res.iter().map(|r| r.delta).max().unwrap();
        assert_eq!(res[0].delta, max_delta);
        assert_eq!(res[0].question_order, 11);
        assert!(res.windows(2).all(|w| w[0].delta >= w[1].delta));
        for r in res.iter() {
            assert_eq!(r.delta, r.leader_score as i32 - r.team_score as i32);
        }
    }

    #[test]
    fn compare_drops_unmatched() {
        let leader = assign(&table_from(7, 80, false), TemplateKind::Leader).unwrap();
        let team: Vec<CategorizedRow> = assign(&table_from(1, 80, false), TemplateKind::Team)
            .unwrap()
            .into_iter()
            .take(50)
            .collect();
        let res = compare(&leader, &team);
        assert_eq!(res.len(), 50);
        assert!(res.iter().all(|r| r.question_order <= 50));
    }

    #[test]
    fn compare_ties_keep_question_order() {
        let leader = assign(&table_with_scores(7, &[50u8; 80]), TemplateKind::Leader).unwrap();
        let team = assign(&table_with_scores(1, &[50u8; 80]), TemplateKind::Team).unwrap();
        let orders: Vec<u32> = compare(&leader, &team)
            .iter()
            .map(|r| r.question_order)
            .collect();
        assert_eq!(orders, (1..=80).collect::<Vec<u32>>());
    }
}
