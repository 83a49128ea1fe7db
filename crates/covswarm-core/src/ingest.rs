//! CSV ingestion, record derivation, and index construction.
//!
//! Every parse problem is recovered locally: bad dates are synthesized
//! within configured bounds, missing ids are generated, unmapped categories
//! fall back to [`Group::Other`]. A row is never dropped for data quality
//! (only the optional keyword filter removes rows). Indices are rebuilt
//! wholesale; there is no incremental update path.

use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate, Utc};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::config::VizConfig;
use crate::dates::{ParsedDate, parse_archive_date};
use crate::error::Result;
use crate::record::{NodeId, Record, group_for_type, radius_for};
use bumble::XorShift64Star;

/// One raw CSV row, extracted by header name per the configured column map.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub id: String,
    pub title: String,
    pub url: String,
    pub fine_type: String,
    pub date: String,
    pub first_date: String,
    pub last_date: String,
    pub keywords: String,
}

/// The ingested record arena plus its two lookup indices.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    id_index: FxHashMap<NodeId, usize>,
    keyword_index: IndexMap<String, Vec<usize>>,
    /// Timeline bounds: min first-date and max last-date over all records
    /// with parseable validity intervals.
    pub date_span: Option<(NaiveDate, NaiveDate)>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.id_index.get(id).copied()
    }

    pub fn by_id(&self, id: &NodeId) -> Option<&Record> {
        self.index_of(id).map(|i| &self.records[i])
    }

    /// Record indices carrying `keyword`, in dataset order. Unknown keywords
    /// yield an empty slice.
    pub fn with_keyword(&self, keyword: &str) -> &[usize] {
        self.keyword_index
            .get(keyword)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keyword_index.keys().map(String::as_str)
    }
}

fn clean_keywords(raw: &str) -> Vec<String> {
    let mut seen = FxHashSet::default();
    raw.split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

/// The source data spells the devolved parliament two ways; fold both onto
/// the short form so category lookups stay consistent.
fn normalize_fine_type(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "Scottish Government and Parliament" {
        "Parliament".to_string()
    } else {
        trimmed.to_string()
    }
}

fn resolve_id(raw: &str, index: usize) -> NodeId {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed != "missing" {
        if let Ok(n) = trimmed.parse::<i64>() {
            return NodeId::Num(n);
        }
    }
    let frag = uuid::Uuid::new_v4().simple().to_string();
    NodeId::Gen(format!(
        "gen_{index}_{}_{}",
        Utc::now().timestamp_millis(),
        &frag[..5]
    ))
}

fn random_date_within(
    min: NaiveDate,
    max: NaiveDate,
    rng: &mut XorShift64Star,
) -> NaiveDate {
    let span = (max - min).num_days().max(0);
    let offset = rng.next_usize(span as usize + 1) as i64;
    min + chrono::Duration::days(offset)
}

/// Turns raw rows into the indexed dataset. Infallible by design: every
/// recoverable data problem substitutes a value instead of failing the row.
pub fn ingest_rows(rows: &[RawRow], cfg: &VizConfig, rng: &mut XorShift64Star) -> Dataset {
    let kept: Vec<(&RawRow, Vec<String>)> = rows
        .iter()
        .map(|row| (row, clean_keywords(&row.keywords)))
        .filter(|(_, kws)| !cfg.ingest.require_keywords || !kws.is_empty())
        .collect();

    let extent = kept
        .iter()
        .map(|(_, kws)| kws.len())
        .fold(None, |acc: Option<(usize, usize)>, n| match acc {
            None => Some((n, n)),
            Some((lo, hi)) => Some((lo.min(n), hi.max(n))),
        })
        .unwrap_or((0, 0));

    let mut dataset = Dataset::default();
    let mut generated_dates = 0usize;

    for (index, (row, keywords)) in kept.into_iter().enumerate() {
        let fine_type = normalize_fine_type(&row.fine_type);
        let group = group_for_type(&fine_type);

        let date_text = if row.date.trim().is_empty() {
            &row.first_date
        } else {
            &row.date
        };
        let (parsed_date, is_generated_date) = match parse_archive_date(date_text) {
            ParsedDate::Date(d) => (d, false),
            // Unknown and unparseable dates both take the bounded-random
            // substitute, so every record stays inside the visible range.
            _ => {
                generated_dates += 1;
                (
                    random_date_within(cfg.ingest.min_date, cfg.ingest.max_date, rng),
                    true,
                )
            }
        };

        let record = Record {
            id: resolve_id(&row.id, index),
            title: row.title.trim().to_string(),
            url: row.url.trim().to_string(),
            fine_type,
            group,
            radius: radius_for(keywords.len(), extent, cfg.ingest.radius_range),
            keywords,
            raw_date_text: date_text.trim().to_string(),
            parsed_date,
            is_generated_date,
            first_date: parse_archive_date(&row.first_date).as_date(),
            last_date: parse_archive_date(&row.last_date).as_date(),
            display_x: 0.0,
            display_y: 0.0,
        };

        let idx = dataset.records.len();
        dataset.id_index.insert(record.id.clone(), idx);
        for kw in &record.keywords {
            dataset.keyword_index.entry(kw.clone()).or_default().push(idx);
        }
        dataset.records.push(record);
    }

    dataset.date_span = {
        let first = dataset.records.iter().filter_map(|r| r.first_date).min();
        let last = dataset.records.iter().filter_map(|r| r.last_date).max();
        match (first, last) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    };

    debug!(
        records = dataset.records.len(),
        keywords = dataset.keyword_index.len(),
        generated_dates,
        "dataset ingested"
    );
    dataset
}

fn header_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    let idx = headers.iter().position(|h| h.trim() == name);
    if idx.is_none() && !name.is_empty() {
        warn!(column = name, "column not found in CSV header");
    }
    idx
}

/// Reads raw rows from any CSV source using the configured column map.
/// Unmapped columns read as empty strings and take the usual substitutes.
pub fn read_csv<R: Read>(reader: R, cfg: &VizConfig) -> Result<Vec<RawRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let cols = &cfg.columns;

    let id = header_index(&headers, &cols.id);
    let title = header_index(&headers, &cols.title);
    let url = header_index(&headers, &cols.url);
    let fine_type = header_index(&headers, &cols.fine_type);
    let first_date = header_index(&headers, &cols.first_date);
    let last_date = header_index(&headers, &cols.last_date);
    let keywords = header_index(&headers, &cols.keywords);
    let date = cols
        .date
        .as_deref()
        .and_then(|name| header_index(&headers, name));

    let field = |rec: &csv::StringRecord, idx: Option<usize>| -> String {
        idx.and_then(|i| rec.get(i)).unwrap_or("").to_string()
    };

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let rec = result?;
        rows.push(RawRow {
            id: field(&rec, id),
            title: field(&rec, title),
            url: field(&rec, url),
            fine_type: field(&rec, fine_type),
            date: field(&rec, date),
            first_date: field(&rec, first_date),
            last_date: field(&rec, last_date),
            keywords: field(&rec, keywords),
        });
    }
    Ok(rows)
}

const SAMPLE_FINE_TYPES: &[&str] = &[
    "News",
    "Government",
    "Health",
    "Education",
    "Arts",
    "Music",
    "Local Authority",
    "Research",
    "Sports",
    "Theatre",
];

const SAMPLE_KEYWORDS: &[&str] = &[
    "pandemic",
    "vaccine",
    "lockdown",
    "symptoms",
    "treatment",
    "prevention",
    "outbreak",
    "immunity",
];

/// Generates a demonstrable stand-in dataset when the source file cannot be
/// read. Deterministic for a fixed RNG seed.
pub fn generate_sample_rows(cfg: &VizConfig, rng: &mut XorShift64Star) -> Vec<RawRow> {
    let mut rows = Vec::with_capacity(cfg.ingest.sample_size);
    for i in 0..cfg.ingest.sample_size {
        let date = random_date_within(cfg.ingest.min_date, cfg.ingest.max_date, rng);
        let lifetime = 30 + rng.next_usize(150) as i64;
        let last = (date + chrono::Duration::days(lifetime)).min(cfg.ingest.max_date);
        let kw_count = 1 + rng.next_usize(4);
        let keywords: Vec<&str> = (0..kw_count)
            .map(|_| SAMPLE_KEYWORDS[rng.next_usize(SAMPLE_KEYWORDS.len())])
            .collect();
        let fine_type = SAMPLE_FINE_TYPES[rng.next_usize(SAMPLE_FINE_TYPES.len())];
        let iso = |d: NaiveDate| format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day());
        rows.push(RawRow {
            id: (i + 1).to_string(),
            title: format!("Sample article {}", i + 1),
            url: format!("https://example.org/archive/{}", i + 1),
            fine_type: fine_type.to_string(),
            date: iso(date),
            first_date: iso(date),
            last_date: iso(last),
            keywords: keywords.join(", "),
        });
    }
    rows
}

/// Loads the dataset from `path`, falling back to generated sample data on
/// any read failure so the visualization stays demonstrable.
pub fn load_or_sample(path: &Path, cfg: &VizConfig, rng: &mut XorShift64Star) -> Dataset {
    let rows = match std::fs::File::open(path).map_err(crate::error::Error::from) {
        Ok(file) => match read_csv(file, cfg) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(path = %path.display(), %err, "CSV read failed; using sample data");
                generate_sample_rows(cfg, rng)
            }
        },
        Err(err) => {
            warn!(path = %path.display(), %err, "CSV open failed; using sample data");
            generate_sample_rows(cfg, rng)
        }
    };
    ingest_rows(&rows, cfg, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Group;

    fn cfg() -> VizConfig {
        VizConfig::default()
    }

    fn row(id: &str, fine_type: &str, date: &str, keywords: &str) -> RawRow {
        RawRow {
            id: id.to_string(),
            title: format!("row {id}"),
            url: String::new(),
            fine_type: fine_type.to_string(),
            date: String::new(),
            first_date: date.to_string(),
            last_date: date.to_string(),
            keywords: keywords.to_string(),
        }
    }

    #[test]
    fn keywords_are_lowercased_trimmed_and_deduplicated() {
        assert_eq!(
            clean_keywords(" Vaccine , lockdown,,VACCINE , "),
            vec!["vaccine".to_string(), "lockdown".to_string()]
        );
    }

    #[test]
    fn keyword_index_lists_each_record_once() {
        let rows = vec![row("1", "News", "2020-03-01", "x, X ,x")];
        let dataset = ingest_rows(&rows, &cfg(), &mut XorShift64Star::new(1));
        assert_eq!(dataset.with_keyword("x"), &[0]);
    }

    #[test]
    fn id_index_round_trips_every_record() {
        let rows = vec![
            row("10", "News", "2020-03-01", "a"),
            row("missing", "Arts", "2020-04-01", "b"),
        ];
        let dataset = ingest_rows(&rows, &cfg(), &mut XorShift64Star::new(1));
        for (i, rec) in dataset.records().iter().enumerate() {
            assert_eq!(dataset.index_of(&rec.id), Some(i));
        }
        assert_eq!(dataset.index_of(&NodeId::Num(10)), Some(0));
        assert!(matches!(dataset.records()[1].id, NodeId::Gen(_)));
    }

    #[test]
    fn unparseable_date_takes_a_bounded_substitute() {
        let rows = vec![row("1", "News", "31/04/2020", "a")];
        let c = cfg();
        let dataset = ingest_rows(&rows, &c, &mut XorShift64Star::new(7));
        let rec = &dataset.records()[0];
        assert!(rec.is_generated_date);
        assert!(rec.parsed_date >= c.ingest.min_date);
        assert!(rec.parsed_date <= c.ingest.max_date);
        // The invalid bound also fails the validity interval.
        assert!(rec.first_date.is_none());
    }

    #[test]
    fn devolved_parliament_spelling_is_normalized() {
        let rows = vec![row(
            "1",
            "Scottish Government and Parliament",
            "2020-03-01",
            "a",
        )];
        let dataset = ingest_rows(&rows, &cfg(), &mut XorShift64Star::new(1));
        assert_eq!(dataset.records()[0].fine_type, "Parliament");
        assert_eq!(dataset.records()[0].group, Group::Government);
    }

    #[test]
    fn keyword_filter_drops_keywordless_rows_when_enabled() {
        let rows = vec![
            row("1", "News", "2020-03-01", ""),
            row("2", "News", "2020-03-02", "a"),
        ];
        let mut c = cfg();
        c.ingest.require_keywords = true;
        let dataset = ingest_rows(&rows, &c, &mut XorShift64Star::new(1));
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.index_of(&NodeId::Num(2)), Some(0));
    }

    #[test]
    fn csv_rows_are_extracted_by_configured_header_names() {
        let data = "\
id,title,url,type1,first_date_parsed,last_date_parsed,first_keywords_auto
5,Covid briefing,https://e.org/5,Government,2020-03-23,2021-01-04,\"lockdown, briefing\"
";
        let rows = read_csv(data.as_bytes(), &cfg()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fine_type, "Government");
        assert_eq!(rows[0].keywords, "lockdown, briefing");
    }

    #[test]
    fn sample_rows_are_deterministic_and_sized() {
        let c = cfg();
        let a = generate_sample_rows(&c, &mut XorShift64Star::new(3));
        let b = generate_sample_rows(&c, &mut XorShift64Star::new(3));
        assert_eq!(a.len(), 300);
        assert_eq!(a[17].first_date, b[17].first_date);
        assert_eq!(a[17].keywords, b[17].keywords);
    }

    #[test]
    fn date_span_covers_min_first_to_max_last() {
        let rows = vec![
            row("1", "News", "2020-03-01", "a"),
            row("2", "News", "2020-06-15", "a"),
        ];
        let dataset = ingest_rows(&rows, &cfg(), &mut XorShift64Star::new(1));
        let (start, end) = dataset.date_span.unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2020, 6, 15).unwrap());
    }
}
