//! Quiz performance summary at the learner's current level.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{QuizOutcome, QuizResult};
use crate::entitlement::ProficiencyLevel;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChapterScore {
  pub chapter: u32,
  pub correct: u32,
  pub wrong: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PerformanceSummary {
  pub level: ProficiencyLevel,
  pub total: u32,
  pub correct: u32,
  pub wrong: u32,
  /// Rounded share of correct answers, 0 when there is no data.
  pub percent: u32,
  /// Sorted by chapter number.
  pub by_chapter: Vec<ChapterScore>,
}

impl PerformanceSummary {
  /// Results recorded at other levels are ignored.
  pub fn for_level(results: &[QuizResult], level: ProficiencyLevel) -> Self {
    let mut per_chapter: BTreeMap<u32, ChapterScore> = BTreeMap::new();
    let (mut correct, mut wrong) = (0u32, 0u32);

    for r in results.iter().filter(|r| r.is_at(level)) {
      let entry = per_chapter.entry(r.chapter.get()).or_insert_with(|| ChapterScore {
        chapter: r.chapter.get(),
        ..Default::default()
      });
      match r.result {
        QuizOutcome::Correct => { entry.correct += 1; correct += 1; }
        QuizOutcome::Wrong => { entry.wrong += 1; wrong += 1; }
      }
    }

    let total = correct + wrong;
    let percent = if total == 0 { 0 } else { ((correct as f64 / total as f64) * 100.0).round() as u32 };

    Self { level, total, correct, wrong, percent, by_chapter: per_chapter.into_values().collect() }
  }

}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::entitlement::ChapterIndex;

  fn row(chapter: u32, level: &str, result: QuizOutcome) -> QuizResult {
    QuizResult {
      chapter: ChapterIndex::new(chapter).unwrap(),
      level: level.into(),
      result,
      word: None,
      bangla: None,
      english: None,
      sentence: None,
    }
  }

  #[test]
  fn empty_summary() {
    let s = PerformanceSummary::for_level(&[], ProficiencyLevel::A1);
    assert_eq!(s.total, 0);
    assert_eq!(s.percent, 0);
    assert!(s.by_chapter.is_empty());
  }

  #[test]
  fn filters_by_level_and_groups_by_chapter() {
    use QuizOutcome::*;
    let rows = vec![
      row(3, "A2", Correct),
      row(1, "A2", Wrong),
      row(3, "A2", Correct),
      row(1, "A1", Correct),
      row(1, "A2", Correct),
    ];
    let s = PerformanceSummary::for_level(&rows, ProficiencyLevel::A2);
    assert_eq!((s.total, s.correct, s.wrong), (4, 3, 1));
    assert_eq!(s.percent, 75);
    assert_eq!(
      s.by_chapter,
      vec![
        ChapterScore { chapter: 1, correct: 1, wrong: 1 },
        ChapterScore { chapter: 3, correct: 2, wrong: 0 },
      ]
    );
  }

  #[test]
  fn percent_rounds_to_nearest() {
    use QuizOutcome::*;
    let rows = vec![row(1, "B1", Correct), row(1, "B1", Correct), row(2, "B1", Wrong)];
    assert_eq!(PerformanceSummary::for_level(&rows, ProficiencyLevel::B1).percent, 67);
  }
}
