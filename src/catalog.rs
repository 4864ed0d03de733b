//! Chapter range, pagination, and the per-chapter lock flags shown in the
//! Learn and Quiz lists.

use serde::Serialize;

use crate::domain::Surface;
use crate::entitlement::{resolve_level, AccessPolicy, ChapterIndex, ProficiencyLevel, Role};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChapterCatalog {
  chapter_count: u32,
  page_size: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ChapterTile {
  pub number: ChapterIndex,
  pub locked: bool,
}

/// One rendered page of a chapter list.
#[derive(Clone, Debug, Serialize)]
pub struct ChapterListing {
  pub surface: Surface,
  pub role: Option<Role>,
  pub level: ProficiencyLevel,
  pub page: u32,
  pub total_pages: u32,
  pub first: u32,
  pub last: u32,
  pub total: u32,
  pub chapters: Vec<ChapterTile>,
}

impl Default for ChapterCatalog {
  fn default() -> Self { Self::new(12, 6) }
}

impl ChapterCatalog {
  /// Both values are clamped to at least 1.
  pub fn new(chapter_count: u32, page_size: u32) -> Self {
    Self { chapter_count: chapter_count.max(1), page_size: page_size.max(1) }
  }

  pub fn total_pages(&self) -> u32 {
    self.chapter_count.div_ceil(self.page_size)
  }

  pub fn contains(&self, chapter: ChapterIndex) -> bool {
    chapter.get() <= self.chapter_count
  }

  /// Chapters on a 1-based page; `None` outside `1..=total_pages`.
  pub fn page(&self, page: u32) -> Option<Vec<ChapterIndex>> {
    if page == 0 || page > self.total_pages() {
      return None;
    }
    let first = (page - 1) * self.page_size + 1;
    let last = first.saturating_add(self.page_size - 1).min(self.chapter_count);
    Some((first..=last).filter_map(ChapterIndex::new).collect())
  }

  /// Build a page of the chapter list for the given role. Lock flags are
  /// computed on every call.
  pub fn listing(&self, surface: Surface, role: Option<&Role>, policy: &AccessPolicy, page: u32) -> Option<ChapterListing> {
    let numbers = self.page(page)?;
    let chapters: Vec<ChapterTile> = numbers
      .into_iter()
      .map(|number| ChapterTile { number, locked: !policy.decide(number, role).is_allowed() })
      .collect();
    Some(ChapterListing {
      surface,
      role: role.cloned(),
      level: resolve_level(role),
      page,
      total_pages: self.total_pages(),
      first: chapters.first().map(|c| c.number.get()).unwrap_or_default(),
      last: chapters.last().map(|c| c.number.get()).unwrap_or_default(),
      total: self.chapter_count,
      chapters,
    })
  }
}
