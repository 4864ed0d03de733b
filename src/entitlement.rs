//! Entitlement policy: role → proficiency level, and chapter access gating.
//!
//! Everything in here is pure. The role is fetched elsewhere (see `session` and
//! `backend`) and handed in as a plain value; a failed fetch arrives as `None`.
//! Learn, Quiz and chapter detail all go through `can_access_chapter`, so a
//! chapter is either locked everywhere or nowhere.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Purchase/entitlement status issued by the backend user directory.
///
/// Unknown strings are kept verbatim in `Other` and carry no entitlement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
  Admin,
  Customer,
  Customer2,
  Customer3,
  BasicUser,
  Other(String),
}

impl Role {
  pub fn as_str(&self) -> &str {
    match self {
      Role::Admin => "admin",
      Role::Customer => "customer",
      Role::Customer2 => "customer2",
      Role::Customer3 => "customer3",
      Role::BasicUser => "basic user",
      Role::Other(s) => s,
    }
  }

  /// Normalize the `role` field of `GET /users/role/me`.
  /// `null` and the empty string both mean "no role".
  pub fn from_wire(raw: Option<&str>) -> Option<Role> {
    match raw {
      Some(s) if !s.is_empty() => Some(Role::from(s)),
      _ => None,
    }
  }
}

impl From<&str> for Role {
  fn from(s: &str) -> Self {
    match s {
      "admin" => Role::Admin,
      "customer" => Role::Customer,
      "customer2" => Role::Customer2,
      "customer3" => Role::Customer3,
      "basic user" => Role::BasicUser,
      other => Role::Other(other.to_string()),
    }
  }
}

impl From<String> for Role {
  fn from(s: String) -> Self {
    match Role::from(s.as_str()) {
      Role::Other(_) => Role::Other(s),
      known => known,
    }
  }
}

impl From<Role> for String {
  fn from(r: Role) -> Self {
    match r {
      Role::Other(s) => s,
      known => known.as_str().to_string(),
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Study tier, ordered by difficulty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProficiencyLevel {
  A1,
  A2,
  B1,
}

impl ProficiencyLevel {
  pub const ALL: [ProficiencyLevel; 3] = [ProficiencyLevel::A1, ProficiencyLevel::A2, ProficiencyLevel::B1];

  pub fn as_str(self) -> &'static str {
    match self {
      ProficiencyLevel::A1 => "A1",
      ProficiencyLevel::A2 => "A2",
      ProficiencyLevel::B1 => "B1",
    }
  }
}

impl fmt::Display for ProficiencyLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// 1-based chapter number. Zero is not a chapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ChapterIndex(u32);

impl ChapterIndex {
  /// Always open, even without a session.
  pub const FREE_SAMPLE: ChapterIndex = ChapterIndex(1);

  pub fn new(n: u32) -> Option<Self> {
    if n == 0 { None } else { Some(Self(n)) }
  }

  pub fn get(self) -> u32 { self.0 }
}

impl TryFrom<u32> for ChapterIndex {
  type Error = String;
  fn try_from(n: u32) -> Result<Self, Self::Error> {
    ChapterIndex::new(n).ok_or_else(|| "chapter index must be positive".to_string())
  }
}

impl From<ChapterIndex> for u32 {
  fn from(c: ChapterIndex) -> Self { c.0 }
}

impl fmt::Display for ChapterIndex {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Resolve the level a role studies and quizzes at by default.
///
/// First match wins: `customer3` → B1, `customer2` → A2, everything else
/// (including no role at all) → A1.
pub fn resolve_level(role: Option<&Role>) -> ProficiencyLevel {
  match role {
    Some(Role::Customer3) => ProficiencyLevel::B1,
    Some(Role::Customer2) => ProficiencyLevel::A2,
    _ => ProficiencyLevel::A1,
  }
}

/// Role that purchases a level.
pub fn tier_role(level: ProficiencyLevel) -> Role {
  match level {
    ProficiencyLevel::A1 => Role::Customer,
    ProficiencyLevel::A2 => Role::Customer2,
    ProficiencyLevel::B1 => Role::Customer3,
  }
}

/// Chapter gate with exact-tier matching. Rules are evaluated in order:
///
/// 1. chapter 1 is open to everyone
/// 2. no role → locked
/// 3. `admin` → open
/// 4. A1 + `customer`, A2 + `customer2`, B1 + `customer3` → open
/// 5. anything else → locked
pub fn can_access_chapter(chapter: ChapterIndex, role: Option<&Role>, level: ProficiencyLevel) -> bool {
  if chapter == ChapterIndex::FREE_SAMPLE {
    return true;
  }
  let Some(role) = role else {
    return false;
  };
  matches!(
    (role, level),
    (Role::Admin, _)
      | (Role::Customer, ProficiencyLevel::A1)
      | (Role::Customer2, ProficiencyLevel::A2)
      | (Role::Customer3, ProficiencyLevel::B1)
  )
}

/// Dictionary search needs a role, and `basic user` does not qualify.
pub fn can_search(role: Option<&Role>) -> bool {
  !matches!(role, None | Some(Role::BasicUser))
}

/// How a paid tier relates to the tiers below it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierMode {
  /// A tier unlocks only its own level.
  #[default]
  Exact,
  /// A tier also unlocks every lower level.
  Cumulative,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
  Allowed,
  Locked,
}

impl AccessDecision {
  pub fn is_allowed(self) -> bool { matches!(self, AccessDecision::Allowed) }
}

impl From<bool> for AccessDecision {
  fn from(allowed: bool) -> Self {
    if allowed { AccessDecision::Allowed } else { AccessDecision::Locked }
  }
}

/// The single gate every surface asks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccessPolicy {
  pub mode: TierMode,
}

impl AccessPolicy {
  pub fn new(mode: TierMode) -> Self { Self { mode } }

  /// Decide for a chapter at the role's own resolved level.
  pub fn decide(&self, chapter: ChapterIndex, role: Option<&Role>) -> AccessDecision {
    self.decide_at(chapter, role, resolve_level(role))
  }

  /// Decide for a chapter at an explicitly requested level.
  pub fn decide_at(&self, chapter: ChapterIndex, role: Option<&Role>, level: ProficiencyLevel) -> AccessDecision {
    let allowed = match self.mode {
      TierMode::Exact => can_access_chapter(chapter, role, level),
      TierMode::Cumulative => {
        can_access_chapter(chapter, role, level)
          || role.is_some_and(|r| {
            let owned = resolve_level(Some(r));
            *r == tier_role(owned) && level <= owned
          })
      }
    };
    AccessDecision::from(allowed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ProficiencyLevel::*;

  fn ch(n: u32) -> ChapterIndex { ChapterIndex::new(n).expect("positive") }

  #[test]
  fn level_resolution_follows_priority() {
    assert_eq!(resolve_level(Some(&Role::Customer3)), B1);
    assert_eq!(resolve_level(Some(&Role::Customer2)), A2);
    assert_eq!(resolve_level(Some(&Role::Customer)), A1);
    assert_eq!(resolve_level(Some(&Role::Admin)), A1);
    assert_eq!(resolve_level(Some(&Role::BasicUser)), A1);
    assert_eq!(resolve_level(None), A1);
    assert_eq!(resolve_level(Some(&Role::from("unknown-future-role"))), A1);
  }

  #[test]
  fn wire_roles_parse_and_normalize() {
    assert_eq!(Role::from("basic user"), Role::BasicUser);
    assert_eq!(Role::from("Customer"), Role::Other("Customer".into()));
    assert_eq!(Role::from_wire(Some("")), None);
    assert_eq!(Role::from_wire(None), None);
    assert_eq!(Role::from_wire(Some("customer2")), Some(Role::Customer2));

    let json = serde_json::to_string(&Role::BasicUser).unwrap();
    assert_eq!(json, "\"basic user\"");
    let back: Role = serde_json::from_str("\"vip\"").unwrap();
    assert_eq!(back, Role::Other("vip".into()));
  }

  #[test]
  fn chapter_one_is_free_for_everyone() {
    let roles = [
      None,
      Some(Role::Admin),
      Some(Role::Customer),
      Some(Role::Customer2),
      Some(Role::Customer3),
      Some(Role::BasicUser),
      Some(Role::from("anything")),
    ];
    for role in &roles {
      for level in ProficiencyLevel::ALL {
        assert!(can_access_chapter(ChapterIndex::FREE_SAMPLE, role.as_ref(), level), "{role:?} {level}");
      }
    }
  }

  #[test]
  fn search_needs_a_non_basic_role() {
    assert!(!can_search(None));
    assert!(!can_search(Some(&Role::BasicUser)));
    assert!(can_search(Some(&Role::Customer)));
    assert!(can_search(Some(&Role::Admin)));
    assert!(can_search(Some(&Role::from("moderator"))));
  }

  #[test]
  fn gate_matches_tier_exactly() {
    assert!(!can_access_chapter(ch(2), None, A1));
    assert!(can_access_chapter(ch(5), Some(&Role::Admin), A1));
    assert!(can_access_chapter(ch(12), Some(&Role::Admin), B1));
    assert!(can_access_chapter(ch(5), Some(&Role::Customer), A1));
    assert!(!can_access_chapter(ch(5), Some(&Role::Customer), A2));
    assert!(can_access_chapter(ch(5), Some(&Role::Customer2), A2));
    assert!(!can_access_chapter(ch(5), Some(&Role::Customer2), A1));
    assert!(can_access_chapter(ch(5), Some(&Role::Customer3), B1));
    assert!(!can_access_chapter(ch(5), Some(&Role::Customer3), A2));
    assert!(!can_access_chapter(ch(5), Some(&Role::BasicUser), A1));
    assert!(!can_access_chapter(ch(5), Some(&Role::from("")), A1));
  }

  #[test]
  fn gate_is_idempotent() {
    let role = Some(Role::Customer2);
    let first = can_access_chapter(ch(7), role.as_ref(), A2);
    let second = can_access_chapter(ch(7), role.as_ref(), A2);
    assert_eq!(first, second);
  }

  #[test]
  fn chapter_index_rejects_zero() {
    assert!(ChapterIndex::new(0).is_none());
    assert!(serde_json::from_str::<ChapterIndex>("0").is_err());
    assert_eq!(serde_json::from_str::<ChapterIndex>("3").unwrap().get(), 3);
  }

  #[test]
  fn exact_policy_uses_resolved_level() {
    let policy = AccessPolicy::default();
    for role in [Role::Customer, Role::Customer2, Role::Customer3, Role::Admin] {
      assert!(policy.decide(ch(4), Some(&role)).is_allowed(), "{role}");
    }
    assert_eq!(policy.decide(ch(4), Some(&Role::BasicUser)), AccessDecision::Locked);
    assert_eq!(policy.decide(ch(4), None), AccessDecision::Locked);
    assert_eq!(policy.decide_at(ch(4), Some(&Role::Customer3), A1), AccessDecision::Locked);
  }

  #[test]
  fn cumulative_policy_unlocks_lower_tiers_only() {
    let policy = AccessPolicy::new(TierMode::Cumulative);
    assert!(policy.decide_at(ch(4), Some(&Role::Customer3), A1).is_allowed());
    assert!(policy.decide_at(ch(4), Some(&Role::Customer3), A2).is_allowed());
    assert!(policy.decide_at(ch(4), Some(&Role::Customer2), A1).is_allowed());
    assert!(!policy.decide_at(ch(4), Some(&Role::Customer2), B1).is_allowed());
    assert!(!policy.decide_at(ch(4), Some(&Role::Customer), A2).is_allowed());
    assert!(!policy.decide_at(ch(4), Some(&Role::BasicUser), A1).is_allowed());
    assert!(!policy.decide_at(ch(4), None, A1).is_allowed());
  }

  #[test]
  fn tier_roles_round_trip_through_resolution() {
    for level in ProficiencyLevel::ALL {
      assert_eq!(resolve_level(Some(&tier_role(level))), level);
    }
  }
}
