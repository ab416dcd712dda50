//! Aggregate reports over the full record set.
//!
//! Both reports are defined here as pure functions over records so that any
//! backend can fall back to a full scan. Backends with a query language may
//! compute the same results natively; they must agree with these functions.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{
  Deserialize, Serialize,
  ser::{SerializeMap, Serializer},
};

use crate::record::{RegistrationNumber, Scores, StudentRecord, Subject};

/// Number of entries in the Group A ranking.
pub const GROUP_A_LIMIT: usize = 10;

// ─── Score bands ─────────────────────────────────────────────────────────────

/// Lower bound of [`ScoreBand::Excellent`].
pub const EXCELLENT_MIN: Decimal = Decimal::from_parts(8, 0, 0, false, 0);
/// Lower bound of [`ScoreBand::Good`].
pub const GOOD_MIN: Decimal = Decimal::from_parts(6, 0, 0, false, 0);
/// Lower bound of [`ScoreBand::Average`].
pub const AVERAGE_MIN: Decimal = Decimal::from_parts(4, 0, 0, false, 0);

/// The four fixed distribution buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
  /// `[8, ∞)`
  Excellent,
  /// `[6, 8)`
  Good,
  /// `[4, 6)`
  Average,
  /// `(-∞, 4)`
  Weak,
}

impl ScoreBand {
  pub fn of(score: Decimal) -> Self {
    if score >= EXCELLENT_MIN {
      Self::Excellent
    } else if score >= GOOD_MIN {
      Self::Good
    } else if score >= AVERAGE_MIN {
      Self::Average
    } else {
      Self::Weak
    }
  }
}

/// Bucket counts for one subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandCounts {
  #[serde(rename = ">=8")]
  pub excellent: u64,
  #[serde(rename = "6-8")]
  pub good:      u64,
  #[serde(rename = "4-6")]
  pub average:   u64,
  #[serde(rename = "<4")]
  pub weak:      u64,
}

impl BandCounts {
  pub fn record(&mut self, score: Decimal) {
    match ScoreBand::of(score) {
      ScoreBand::Excellent => self.excellent += 1,
      ScoreBand::Good => self.good += 1,
      ScoreBand::Average => self.average += 1,
      ScoreBand::Weak => self.weak += 1,
    }
  }

  /// Number of records with a score in this subject.
  pub fn total(&self) -> u64 { self.excellent + self.good + self.average + self.weak }
}

// ─── Subject distribution ────────────────────────────────────────────────────

/// Per-subject band counts for all nine subjects.
///
/// Serializes as a JSON object keyed by subject code, in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectDistribution {
  counts: [BandCounts; 9],
}

impl SubjectDistribution {
  pub fn get(&self, subject: Subject) -> &BandCounts { &self.counts[subject.index()] }

  pub fn get_mut(&mut self, subject: Subject) -> &mut BandCounts {
    &mut self.counts[subject.index()]
  }

  /// Count every present score in `scores`.
  pub fn record(&mut self, scores: &Scores) {
    for (subject, score) in scores.iter() {
      if let Some(score) = score {
        self.get_mut(subject).record(score);
      }
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = (Subject, &BandCounts)> {
    Subject::ALL.into_iter().zip(self.counts.iter())
  }
}

impl Serialize for SubjectDistribution {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(Subject::ALL.len()))?;
    for (subject, counts) in self.iter() {
      map.serialize_entry(subject.code(), counts)?;
    }
    map.end()
  }
}

/// Bucket every present score of every record. Absent scores are skipped,
/// so each subject's total is the number of records that sat it.
pub fn subject_distribution<'a>(
  records: impl IntoIterator<Item = &'a StudentRecord>,
) -> SubjectDistribution {
  let mut dist = SubjectDistribution::default();
  for record in records {
    dist.record(&record.scores);
  }
  dist
}

// ─── Group A ranking ─────────────────────────────────────────────────────────

/// One row of the Group A ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAEntry {
  #[serde(rename = "sbd")]
  pub registration_number: RegistrationNumber,
  #[serde(rename = "toan")]
  pub mathematics:         Decimal,
  #[serde(rename = "vat_li")]
  pub physics:             Decimal,
  #[serde(rename = "hoa_hoc")]
  pub chemistry:           Decimal,
  pub total_score:         Decimal,
}

impl GroupAEntry {
  /// Build an entry if all three Group A scores are present.
  pub fn from_record(record: &StudentRecord) -> Option<Self> {
    let s = &record.scores;
    Some(Self {
      registration_number: record.registration_number.clone(),
      mathematics:         s.mathematics?,
      physics:             s.physics?,
      chemistry:           s.chemistry?,
      total_score:         s.group_a_total()?,
    })
  }

  /// Ranking order: higher total first, then registration number ascending.
  pub fn rank_cmp(&self, other: &Self) -> Ordering {
    other
      .total_score
      .cmp(&self.total_score)
      .then_with(|| self.registration_number.cmp(&other.registration_number))
  }
}

/// The `limit` best Group A candidates. Records missing any of the three
/// scores are not eligible.
pub fn top_group_a<'a>(
  records: impl IntoIterator<Item = &'a StudentRecord>,
  limit: usize,
) -> Vec<GroupAEntry> {
  let mut entries: Vec<GroupAEntry> =
    records.into_iter().filter_map(GroupAEntry::from_record).collect();
  entries.sort_by(GroupAEntry::rank_cmp);
  entries.truncate(limit);
  entries
}
