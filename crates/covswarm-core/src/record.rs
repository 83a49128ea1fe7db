//! Record model: identifiers, category groups, and derived display fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stable record identifier: numeric when the source row carries one,
/// otherwise a generated token that never collides within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Num(i64),
    Gen(String),
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeId::Num(n) => write!(f, "{n}"),
            NodeId::Gen(s) => f.write_str(s),
        }
    }
}

/// Coarse category bucket; determines the horizontal lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    Media,
    Entertainment,
    Education,
    Government,
    Other,
}

impl Group {
    /// Lane order of the category axis. `Other` records are kept in the
    /// dataset but get no lane of their own; they share the last lane.
    pub const LANE_ORDER: [Group; 4] = [
        Group::Media,
        Group::Entertainment,
        Group::Education,
        Group::Government,
    ];

    pub fn lane(&self) -> usize {
        match self {
            Group::Media => 0,
            Group::Entertainment => 1,
            Group::Education => 2,
            Group::Government | Group::Other => 3,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Group::Media => "#62BBB2",
            Group::Entertainment => "#5997F5",
            Group::Education => "#0055BC",
            Group::Government => "#345F4D",
            Group::Other => "#9E9E9E",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Group::Media => "Media",
            Group::Entertainment => "Entertainment",
            Group::Education => "Education",
            Group::Government => "Government",
            Group::Other => "Other",
        }
    }
}

/// Fine-type to coarse-group lookup. Unmapped types degrade to `Other`
/// rather than failing the row.
pub fn group_for_type(fine_type: &str) -> Group {
    match fine_type {
        "Arts" | "Theatre" | "Comedy" | "Film and Cinema" | "Festival" | "Music" | "Culture" => {
            Group::Entertainment
        }
        "Government" | "Local Authority" | "Parliament" | "Executive NDPB" | "Agency"
        | "Public Corporations" | "Politics" | "Law" | "Support" | "Utilities" | "Transport"
        | "Community" => Group::Government,
        "Health" | "Health and Social Care" | "Education" | "School" | "School, Primary"
        | "School, Secondary" | "School, ASL" | "School, Independent"
        | "Libraries and Archives" | "Research" | "Science" | "Think Tank" | "History"
        | "Heritage" => Group::Education,
        "Sports" | "News" | "Media" | "Blog" | "Heritage and Tourism" => Group::Media,
        _ => Group::Other,
    }
}

/// One visualized data point. Created once at ingestion; `display_x` /
/// `display_y` are written only by the relaxation pass.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub id: NodeId,
    pub title: String,
    pub url: String,
    /// Fine-grained source category (`type1` column).
    pub fine_type: String,
    pub group: Group,
    /// Lowercased, trimmed, deduplicated keyword list in source order.
    pub keywords: Vec<String>,
    pub raw_date_text: String,
    pub parsed_date: NaiveDate,
    /// True when no valid collection date existed and one was synthesized.
    pub is_generated_date: bool,
    /// Validity interval for timeline filtering; `None` when the bound was
    /// missing or unparseable (such records are never timeline-visible).
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub radius: f64,
    pub display_x: f64,
    pub display_y: f64,
}

impl Record {
    pub fn visible_at(&self, current: NaiveDate) -> bool {
        match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => first <= current && current <= last,
            _ => false,
        }
    }
}

/// Square-root size scale over the dataset's keyword-count extent; more
/// keywords means a slightly larger marker.
pub fn radius_for(count: usize, extent: (usize, usize), range: (f64, f64)) -> f64 {
    let (lo, hi) = extent;
    let (r0, r1) = range;
    let s0 = (lo as f64).sqrt();
    let s1 = (hi as f64).sqrt();
    if (s1 - s0).abs() < f64::EPSILON {
        return (r0 + r1) / 2.0;
    }
    let t = ((count as f64).sqrt() - s0) / (s1 - s0);
    r0 + t.clamp(0.0, 1.0) * (r1 - r0)
}
