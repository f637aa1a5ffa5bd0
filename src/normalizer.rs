//! Turns raw notices into a [`NormalizedCollection`].
//!
//! Records are processed in input order. The first notice seen for an
//! `entity_id` wins; later ones are skipped before their links are touched.
//! Keys follow the configured [`KeyPolicy`].

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::{KeyPolicy, NormalizerConfig};
use crate::error::NormalizeError;
use crate::model::{NormalizedCollection, NormalizedRecord, RawNotice};

/// Normalizes typed notices. Fails on the first record whose image cannot
/// be extracted; no partial collection is returned.
pub fn normalize(
    notices: &[RawNotice],
    config: &NormalizerConfig,
) -> Result<NormalizedCollection, NormalizeError> {
    let mut batch = Batch::new(config.key_policy);
    for (index, notice) in notices.iter().enumerate() {
        batch.push(index, notice)?;
    }
    Ok(batch.finish())
}

/// Same as [`normalize`] but over untyped JSON records, so absent or
/// mistyped fields are reported as errors too. Records are read and
/// normalized one at a time, so the error returned is the one for the
/// lowest failing index.
pub fn normalize_values(
    records: &[Value],
    config: &NormalizerConfig,
) -> Result<NormalizedCollection, NormalizeError> {
    let mut batch = Batch::new(config.key_policy);
    for (index, value) in records.iter().enumerate() {
        let notice = RawNotice::from_value(index, value)?;
        batch.push(index, &notice)?;
    }
    Ok(batch.finish())
}

#[derive(Debug, Default)]
pub struct NormalizeReport {
    pub records: NormalizedCollection,
    pub rejected: Vec<NormalizeError>,
    pub duplicates: usize,
}

/// Normalizes what it can. Invalid records are collected in
/// [`NormalizeReport::rejected`] instead of aborting the batch, and do not
/// mark their entity as seen.
pub fn normalize_lenient(records: &[Value], config: &NormalizerConfig) -> NormalizeReport {
    let mut batch = Batch::new(config.key_policy);
    let mut rejected = Vec::new();

    for (index, value) in records.iter().enumerate() {
        let pushed = RawNotice::from_value(index, value)
            .and_then(|notice| batch.push(index, &notice));
        if let Err(err) = pushed {
            debug!(index, error = %err, "rejected notice");
            rejected.push(err);
        }
    }

    let duplicates = batch.duplicates;
    NormalizeReport {
        records: batch.finish(),
        rejected,
        duplicates,
    }
}

/// In-flight state of one normalization call.
struct Batch {
    policy: KeyPolicy,
    seen: HashSet<String>,
    records: NormalizedCollection,
    next_key: usize,
    duplicates: usize,
}

impl Batch {
    fn new(policy: KeyPolicy) -> Self {
        Batch {
            policy,
            seen: HashSet::new(),
            records: NormalizedCollection::new(),
            next_key: 0,
            duplicates: 0,
        }
    }

    /// Returns whether the notice was inserted.
    fn push(&mut self, index: usize, notice: &RawNotice) -> Result<bool, NormalizeError> {
        if self.seen.contains(&notice.entity_id) {
            debug!(index, entity_id = %notice.entity_id, "skipping duplicate notice");
            self.duplicates += 1;
            return Ok(false);
        }

        let image = notice
            .links
            .resolve()
            .and_then(|links| links.image().map(str::to_owned))
            .map_err(|source| NormalizeError::MalformedLinks {
                index,
                entity_id: notice.entity_id.clone(),
                source,
            })?;

        let key = match self.policy {
            KeyPolicy::Contiguous => self.next_key,
            KeyPolicy::SourcePosition => index,
        };
        self.records
            .insert(key, NormalizedRecord::from_notice(notice, image));
        self.seen.insert(notice.entity_id.clone());
        self.next_key += 1;
        Ok(true)
    }

    fn finish(self) -> NormalizedCollection {
        info!(
            records = self.records.len(),
            duplicates = self.duplicates,
            "normalized notice batch"
        );
        self.records
    }
}
