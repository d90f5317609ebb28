//! Latest-result store.
//!
//! One slot per report key plus the latest X-ray prediction map and the
//! latest lab analysis. Writes are last-write-wins; every write gets a
//! process-wide revision so the winner is observable. With a TTL set,
//! entries older than the TTL read as absent.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::ReportSlot;
use crate::pipeline::report::{Prediction, ReportRecord};
use crate::pipeline::sugar::SugarAnalysis;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Result store lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

/// Stored value with its write metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stamped<T> {
    pub value: T,
    pub revision: u64,
    pub stored_at: DateTime<Utc>,
}

/// Label → probability, as last produced by the X-ray classifier.
pub type XrayPredictions = BTreeMap<String, f64>;

pub struct ResultStore {
    reports: RwLock<HashMap<ReportSlot, Stamped<ReportRecord>>>,
    xray: RwLock<Option<Stamped<XrayPredictions>>>,
    sugar: RwLock<Option<Stamped<SugarAnalysis>>>,
    revision: AtomicU64,
    ttl: Option<Duration>,
}

impl ResultStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            reports: RwLock::new(HashMap::new()),
            xray: RwLock::new(None),
            sugar: RwLock::new(None),
            revision: AtomicU64::new(0),
            ttl,
        }
    }

    fn stamp<T>(&self, value: T) -> Stamped<T> {
        Stamped {
            value,
            revision: self.revision.fetch_add(1, Ordering::SeqCst) + 1,
            stored_at: Utc::now(),
        }
    }

    fn is_live<T>(&self, entry: &Stamped<T>) -> bool {
        match self.ttl.and_then(|ttl| chrono::Duration::from_std(ttl).ok()) {
            Some(ttl) => Utc::now() - entry.stored_at <= ttl,
            None => true,
        }
    }

    /// Highest revision handed out so far (0 before the first write).
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    // ── Reports ─────────────────────────────────────────────

    pub fn put_report(&self, slot: ReportSlot, record: ReportRecord) -> Result<u64, StoreError> {
        let mut reports = self
            .reports
            .write()
            .map_err(|_| StoreError::LockPoisoned("reports"))?;
        // Stamp under the lock so revision order matches write order.
        let stamped = self.stamp(record);
        let revision = stamped.revision;
        reports.insert(slot, stamped);
        tracing::debug!(slot = %slot, revision, "Stored report");
        Ok(revision)
    }

    pub fn latest_report(&self, slot: ReportSlot) -> Result<Option<Stamped<ReportRecord>>, StoreError> {
        let reports = self
            .reports
            .read()
            .map_err(|_| StoreError::LockPoisoned("reports"))?;
        Ok(reports.get(&slot).filter(|e| self.is_live(e)).cloned())
    }

    // ── X-ray predictions ───────────────────────────────────

    /// Store an X-ray report together with the prediction map it came from.
    ///
    /// Both entries are written in one critical section and share a
    /// revision. Lock order is reports, then X-ray.
    pub fn put_xray_result(
        &self,
        record: ReportRecord,
        predictions: &[Prediction],
    ) -> Result<u64, StoreError> {
        let map: XrayPredictions = predictions
            .iter()
            .map(|p| (p.label.clone(), p.probability))
            .collect();
        let mut reports = self
            .reports
            .write()
            .map_err(|_| StoreError::LockPoisoned("reports"))?;
        let mut xray = self
            .xray
            .write()
            .map_err(|_| StoreError::LockPoisoned("xray"))?;

        let stamped = self.stamp(record);
        let revision = stamped.revision;
        *xray = Some(Stamped {
            value: map,
            revision,
            stored_at: stamped.stored_at,
        });
        reports.insert(ReportSlot::Xray, stamped);
        tracing::debug!(revision, "Stored X-ray report and predictions");
        Ok(revision)
    }

    pub fn latest_xray_predictions(&self) -> Result<Option<Stamped<XrayPredictions>>, StoreError> {
        let slot = self
            .xray
            .read()
            .map_err(|_| StoreError::LockPoisoned("xray"))?;
        Ok(slot.as_ref().filter(|e| self.is_live(e)).cloned())
    }

    // ── Lab analysis ────────────────────────────────────────

    pub fn put_sugar_analysis(&self, analysis: SugarAnalysis) -> Result<u64, StoreError> {
        let mut slot = self
            .sugar
            .write()
            .map_err(|_| StoreError::LockPoisoned("sugar"))?;
        let stamped = self.stamp(analysis);
        let revision = stamped.revision;
        *slot = Some(stamped);
        Ok(revision)
    }

    pub fn latest_sugar_analysis(&self) -> Result<Option<Stamped<SugarAnalysis>>, StoreError> {
        let slot = self
            .sugar
            .read()
            .map_err(|_| StoreError::LockPoisoned("sugar"))?;
        Ok(slot.as_ref().filter(|e| self.is_live(e)).cloned())
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SugarStatus;
    use std::sync::Arc;
    use std::thread;

    fn record(disease: &str) -> ReportRecord {
        ReportRecord {
            symptoms: vec!["Mass".into()],
            disease: disease.into(),
            report: format!("Condition Detected: {disease}"),
        }
    }

    #[test]
    fn empty_store_reads_none() {
        let store = ResultStore::default();
        assert!(store.latest_report(ReportSlot::Ct2d).unwrap().is_none());
        assert!(store.latest_xray_predictions().unwrap().is_none());
        assert!(store.latest_sugar_analysis().unwrap().is_none());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn slots_are_independent() {
        let store = ResultStore::default();
        store.put_report(ReportSlot::Ct2d, record("Tumor")).unwrap();
        assert!(store.latest_report(ReportSlot::Ct).unwrap().is_none());
        assert!(store.latest_report(ReportSlot::Ct3d).unwrap().is_none());
        assert_eq!(
            store.latest_report(ReportSlot::Ct2d).unwrap().unwrap().value.disease,
            "Tumor"
        );
    }

    #[test]
    fn later_write_replaces_and_bumps_revision() {
        let store = ResultStore::default();
        let first = store.put_report(ReportSlot::Mri3d, record("Glioma")).unwrap();
        let second = store.put_report(ReportSlot::Mri3d, record("No Tumor")).unwrap();
        assert!(second > first);
        let latest = store.latest_report(ReportSlot::Mri3d).unwrap().unwrap();
        assert_eq!(latest.value.disease, "No Tumor");
        assert_eq!(latest.revision, second);
    }

    #[test]
    fn xray_predictions_stored_as_map() {
        let store = ResultStore::default();
        store
            .put_xray_result(
                record("Mass"),
                &[Prediction::new("Mass", 0.47), Prediction::new("Nodule", 0.31)],
            )
            .unwrap();
        let latest = store.latest_xray_predictions().unwrap().unwrap();
        assert_eq!(latest.value.get("Mass"), Some(&0.47));
        assert_eq!(latest.value.len(), 2);
    }

    #[test]
    fn xray_report_and_predictions_share_a_revision() {
        let store = ResultStore::default();
        store.put_report(ReportSlot::Ct, record("Tumor")).unwrap();
        let revision = store
            .put_xray_result(record("Nodule"), &[Prediction::new("Nodule", 0.6)])
            .unwrap();

        let report = store.latest_report(ReportSlot::Xray).unwrap().unwrap();
        let predictions = store.latest_xray_predictions().unwrap().unwrap();
        assert_eq!(report.revision, revision);
        assert_eq!(predictions.revision, revision);
        assert_eq!(report.stored_at, predictions.stored_at);
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn concurrent_xray_writes_stay_paired() {
        let store = Arc::new(ResultStore::default());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let label = format!("Finding {i}");
                    store
                        .put_xray_result(record(&label), &[Prediction::new(label.clone(), 0.5)])
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let report = store.latest_report(ReportSlot::Xray).unwrap().unwrap();
        let predictions = store.latest_xray_predictions().unwrap().unwrap();
        assert_eq!(report.revision, predictions.revision);
        assert!(predictions.value.contains_key(&report.value.disease));
        assert_eq!(predictions.value.len(), 1);
    }

    #[test]
    fn sugar_analysis_round_trip() {
        let store = ResultStore::default();
        let analysis = SugarAnalysis {
            fasting: Some(90.0),
            post_prandial: None,
            hba1c: None,
            status: SugarStatus::Normal,
            recommendations: "ok".into(),
        };
        store.put_sugar_analysis(analysis.clone()).unwrap();
        assert_eq!(store.latest_sugar_analysis().unwrap().unwrap().value, analysis);
    }

    #[test]
    fn expired_entries_read_as_absent() {
        let store = ResultStore::new(Some(Duration::from_millis(1)));
        store.put_report(ReportSlot::Xray, record("Mass")).unwrap();
        thread::sleep(Duration::from_millis(20));
        assert!(store.latest_report(ReportSlot::Xray).unwrap().is_none());
    }

    #[test]
    fn fresh_entries_survive_ttl() {
        let store = ResultStore::new(Some(Duration::from_secs(60)));
        store.put_report(ReportSlot::Xray, record("Mass")).unwrap();
        assert!(store.latest_report(ReportSlot::Xray).unwrap().is_some());
    }

    #[test]
    fn concurrent_writes_leave_a_valid_value() {
        let store = Arc::new(ResultStore::default());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .put_report(ReportSlot::Ultrasound, record(&format!("Cyst {i}")))
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let latest = store.latest_report(ReportSlot::Ultrasound).unwrap().unwrap();
        assert!(latest.value.disease.starts_with("Cyst "));
        assert_eq!(store.revision(), 16);
        // The surviving entry carries the last revision handed out.
        assert_eq!(latest.revision, 16);
    }
}
