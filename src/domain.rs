//! Domain records shared by the gateway and the backend client:
//! vocabulary items, quiz results, subscription plans, and lounge entries.

use serde::{Deserialize, Serialize};

use crate::entitlement::{ChapterIndex, ProficiencyLevel};

/// Which chapter list is asking. Both surfaces are gated identically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
  #[default]
  Learn,
  Quiz,
}

/// UI language used to pick a vocabulary gloss.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
  Bangla,
  #[default]
  English,
  Hindi,
  Urdu,
  Tamil,
  Malayalam,
  Nepali,
  Arabic,
}

/// One word of a chapter, as served by `GET /chapter/{n}?level=..`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VocabItem {
  pub word: String,
  #[serde(default)] pub english: String,
  #[serde(default)] pub sentence: String,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub bangla: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub hindi: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub urdu: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub tamil: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub malayalam: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub nepali: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub arabic: Option<String>,
}

const MISSING_GLOSS: &str = "—";

impl VocabItem {
  /// Translation shown for the selected UI language.
  pub fn gloss(&self, language: Language) -> &str {
    let column = match language {
      Language::English => return if self.english.is_empty() { MISSING_GLOSS } else { &self.english },
      Language::Bangla => &self.bangla,
      Language::Hindi => &self.hindi,
      Language::Urdu => &self.urdu,
      Language::Tamil => &self.tamil,
      Language::Malayalam => &self.malayalam,
      Language::Nepali => &self.nepali,
      Language::Arabic => &self.arabic,
    };
    column.as_deref().filter(|s| !s.is_empty()).unwrap_or(MISSING_GLOSS)
  }
}

/// Self-graded flash card outcome. Unknown wire values count as wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizOutcome {
  Correct,
  #[serde(other)]
  Wrong,
}

/// Row of `/quiz-results`, both as PUT payload and GET response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuizResult {
  pub chapter: ChapterIndex,
  pub level: String,
  pub result: QuizOutcome,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub word: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub bangla: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub english: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub sentence: Option<String>,
}

impl QuizResult {
  pub fn is_at(&self, level: ProficiencyLevel) -> bool {
    self.level == level.as_str()
  }
}

/// One-time purchase plan offered on the subscription page.
#[derive(Clone, Debug, Serialize)]
pub struct Plan {
  pub level: ProficiencyLevel,
  pub title: &'static str,
  pub price_eur: u32,
  pub badge: &'static str,
  pub highlight: bool,
  pub features: Vec<&'static str>,
}

pub fn subscription_plans() -> Vec<Plan> {
  vec![
    Plan {
      level: ProficiencyLevel::A1,
      title: "A1 Beginner Course",
      price_eur: 10,
      badge: "Start from zero",
      highlight: false,
      features: vec![
        "Full access to all A1 vocabulary chapters",
        "A1 quizzes & performance tracking",
        "Search access for A1 words",
      ],
    },
    Plan {
      level: ProficiencyLevel::A2,
      title: "A2 Intermediate Course",
      price_eur: 15,
      badge: "Most popular",
      highlight: true,
      features: vec![
        "Full access to all A2 vocabulary chapters",
        "A2 quizzes & performance tracking",
        "Search access for A2 words",
      ],
    },
    Plan {
      level: ProficiencyLevel::B1,
      title: "B1 Advanced Course",
      price_eur: 20,
      badge: "For serious learners",
      highlight: false,
      features: vec![
        "Full access to all B1 vocabulary chapters",
        "B1 quizzes & performance tracking",
        "Search access for B1 words",
      ],
    },
  ]
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityMessage {
  pub text: String,
  #[serde(default)] pub user_email: String,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub display_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUser {
  pub email: String,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub display_name: Option<String>,
}

/// Short name for the lounge: the email's local part, cut at the first dot.
pub fn display_name(email_or_name: Option<&str>) -> String {
  let s = email_or_name.map(str::trim).unwrap_or_default();
  if s.is_empty() {
    return "User".into();
  }
  let local = s.split('@').next().unwrap_or(s);
  let short = local.split('.').next().unwrap_or(local);
  short.to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn gloss_falls_back_to_dash() {
    let item = VocabItem {
      word: "Haus".into(),
      english: "house".into(),
      hindi: Some("घर".into()),
      tamil: Some(String::new()),
      ..Default::default()
    };
    assert_eq!(item.gloss(Language::English), "house");
    assert_eq!(item.gloss(Language::Hindi), "घर");
    assert_eq!(item.gloss(Language::Tamil), "—");
    assert_eq!(item.gloss(Language::Arabic), "—");
  }

  #[test]
  fn unknown_quiz_outcome_counts_as_wrong() {
    let r: QuizResult = serde_json::from_str(r#"{"chapter":2,"level":"A1","result":"skipped"}"#).unwrap();
    assert_eq!(r.result, QuizOutcome::Wrong);
    assert!(r.is_at(ProficiencyLevel::A1));
    assert!(!r.is_at(ProficiencyLevel::A2));
  }

  #[test]
  fn plans_cover_every_level_once() {
    let plans = subscription_plans();
    let levels: Vec<_> = plans.iter().map(|p| p.level).collect();
    assert_eq!(levels, ProficiencyLevel::ALL.to_vec());
    assert_eq!(plans.iter().filter(|p| p.highlight).count(), 1);
  }

  #[test]
  fn display_names() {
    assert_eq!(display_name(Some("jane.doe@example.com")), "jane");
    assert_eq!(display_name(Some("sam@example.com")), "sam");
    assert_eq!(display_name(Some("Rahim")), "Rahim");
    assert_eq!(display_name(Some("  ")), "User");
    assert_eq!(display_name(None), "User");
  }
}
