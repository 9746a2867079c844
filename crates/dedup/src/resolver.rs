use ingest::{ExistingReport, UploadedImage};
use oracle::SimilarityOracle;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::DedupConfig;
use crate::metrics::metrics_recorder;
use crate::types::{DuplicateVerdict, Resolution};

/// Decides whether a new photo duplicates one of the candidate reports.
///
/// Resolution never fails: a comparison that errors counts as "not a match"
/// for that candidate and the next one is tried.
#[derive(Clone)]
pub struct DuplicateResolver {
    oracle: Arc<dyn SimilarityOracle>,
    cfg: DedupConfig,
}

impl DuplicateResolver {
    pub fn new(oracle: Arc<dyn SimilarityOracle>, cfg: DedupConfig) -> Self {
        Self { oracle, cfg }
    }

    pub fn config(&self) -> &DedupConfig {
        &self.cfg
    }

    /// Resolve `new_image` against `candidates` (most recent first).
    pub async fn resolve(
        &self,
        new_image: &UploadedImage,
        candidates: &[ExistingReport],
    ) -> DuplicateVerdict {
        self.resolve_with_stats(new_image, candidates).await.verdict
    }

    /// Like [`resolve`](Self::resolve), also reporting the oracle calls made.
    ///
    /// 1. If the fast path is enabled and a candidate carries the same
    ///    fingerprint, that candidate is returned without any oracle call.
    /// 2. Otherwise the first `candidate_window` candidates are compared one
    ///    at a time, and the first verdict with `is_same` and a confidence at
    ///    or above the threshold wins.
    pub async fn resolve_with_stats(
        &self,
        new_image: &UploadedImage,
        candidates: &[ExistingReport],
    ) -> Resolution {
        let start = Instant::now();
        let resolution = self.run(new_image, candidates).await;

        if let Some(recorder) = metrics_recorder() {
            recorder.record_resolution(&resolution, candidates.len(), start.elapsed());
        }
        resolution
    }

    async fn run(&self, new_image: &UploadedImage, candidates: &[ExistingReport]) -> Resolution {
        let mut resolution = Resolution {
            verdict: DuplicateVerdict::unique(),
            oracle_calls: 0,
            comparison_failures: 0,
        };

        if self.cfg.fingerprint_fast_path {
            let fingerprint = new_image.fingerprint();
            if let Some(hit) = candidates
                .iter()
                .find(|c| c.fingerprint.as_ref() == Some(&fingerprint))
            {
                info!(
                    report_id = %hit.summary.id,
                    matched_by = "fingerprint",
                    "duplicate_found"
                );
                resolution.verdict = DuplicateVerdict::fingerprint_match(hit.summary.clone());
                return resolution;
            }
        }

        for candidate in candidates.iter().take(self.cfg.candidate_window) {
            if candidate.image.is_empty() {
                debug!(report_id = %candidate.summary.id, "candidate_without_image");
                continue;
            }

            resolution.oracle_calls += 1;
            match self.oracle.compare_images(new_image, &candidate.image).await {
                Ok(verdict) if verdict.is_confident_match(self.cfg.confidence_threshold) => {
                    info!(
                        report_id = %candidate.summary.id,
                        confidence = verdict.confidence,
                        matched_by = "oracle",
                        oracle_calls = resolution.oracle_calls,
                        "duplicate_found"
                    );
                    resolution.verdict =
                        DuplicateVerdict::oracle_match(candidate.summary.clone(), verdict);
                    return resolution;
                }
                Ok(verdict) => {
                    debug!(
                        report_id = %candidate.summary.id,
                        is_same = verdict.is_same,
                        confidence = verdict.confidence,
                        threshold = self.cfg.confidence_threshold,
                        "candidate_not_duplicate"
                    );
                }
                Err(err) => {
                    resolution.comparison_failures += 1;
                    warn!(
                        report_id = %candidate.summary.id,
                        error = %err,
                        "comparison_failed"
                    );
                }
            }
        }

        debug!(
            candidates = candidates.len(),
            oracle_calls = resolution.oracle_calls,
            comparison_failures = resolution.comparison_failures,
            "no_duplicate"
        );
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchKind;
    use async_trait::async_trait;
    use chrono::Utc;
    use ingest::{Fingerprint, ImageRef, ReportId, ReportStatus, ReportSummary};
    use oracle::{OracleError, SimilarityVerdict};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers per candidate image URL and records the order of calls.
    #[derive(Default)]
    struct FakeSimilarity {
        answers: HashMap<String, Result<SimilarityVerdict, String>>,
        seen: Mutex<Vec<String>>,
    }

    impl FakeSimilarity {
        fn answer(mut self, url: &str, is_same: bool, confidence: u8) -> Self {
            self.answers.insert(
                url.to_string(),
                Ok(SimilarityVerdict {
                    is_same,
                    confidence,
                    reason: format!("verdict for {url}"),
                }),
            );
            self
        }

        fn fail(mut self, url: &str) -> Self {
            self.answers
                .insert(url.to_string(), Err(format!("oracle down for {url}")));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SimilarityOracle for FakeSimilarity {
        async fn compare_images(
            &self,
            _new_image: &UploadedImage,
            candidate: &ImageRef,
        ) -> Result<SimilarityVerdict, OracleError> {
            let key = candidate.to_string();
            self.seen.lock().unwrap().push(key.clone());
            match self.answers.get(&key) {
                Some(Ok(v)) => Ok(v.clone()),
                Some(Err(msg)) => Err(OracleError::Comparison(msg.clone())),
                None => Ok(SimilarityVerdict::different("unknown")),
            }
        }
    }

    fn candidate(n: usize) -> ExistingReport {
        ExistingReport {
            summary: ReportSummary {
                id: ReportId::new(format!("r-{n}")),
                category: "Pothole".into(),
                severity: 6,
                status: ReportStatus::Open,
                created_at: Utc::now(),
            },
            fingerprint: Some(Fingerprint::new(format!("fp-{n}"))),
            image: ImageRef::Url(format!("img-{n}")),
        }
    }

    fn new_image() -> UploadedImage {
        UploadedImage::new(vec![0xffu8; 32], "image/jpeg")
    }

    fn resolver(fake: Arc<FakeSimilarity>) -> DuplicateResolver {
        DuplicateResolver::new(fake, DedupConfig::default())
    }

    #[tokio::test]
    async fn no_candidates_is_unique() {
        let fake = Arc::new(FakeSimilarity::default());
        let verdict = resolver(fake.clone()).resolve(&new_image(), &[]).await;
        assert_eq!(verdict, DuplicateVerdict::unique());
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn first_confident_match_short_circuits() {
        let fake = Arc::new(
            FakeSimilarity::default()
                .answer("img-0", false, 90)
                .answer("img-1", false, 10)
                .answer("img-2", true, 85)
                .answer("img-3", true, 99),
        );
        let candidates: Vec<_> = (0..5).map(candidate).collect();

        let resolution = resolver(fake.clone())
            .resolve_with_stats(&new_image(), &candidates)
            .await;

        assert!(resolution.verdict.is_duplicate);
        assert_eq!(
            resolution.verdict.matched_report.as_ref().map(|r| r.id.as_str()),
            Some("r-2")
        );
        assert_eq!(resolution.verdict.confidence, Some(85));
        assert_eq!(resolution.verdict.matched_by, Some(MatchKind::Oracle));
        assert_eq!(resolution.oracle_calls, 3);
        assert_eq!(fake.calls(), vec!["img-0", "img-1", "img-2"]);
    }

    #[tokio::test]
    async fn confidence_69_is_not_a_duplicate() {
        let fake = Arc::new(FakeSimilarity::default().answer("img-0", true, 69));
        let verdict = resolver(fake).resolve(&new_image(), &[candidate(0)]).await;
        assert!(!verdict.is_duplicate);
        assert!(verdict.matched_report.is_none());
    }

    #[tokio::test]
    async fn confidence_70_is_a_duplicate() {
        let fake = Arc::new(FakeSimilarity::default().answer("img-0", true, 70));
        let verdict = resolver(fake).resolve(&new_image(), &[candidate(0)]).await;
        assert!(verdict.is_duplicate);
        assert_eq!(verdict.confidence, Some(70));
        assert_eq!(verdict.reason.as_deref(), Some("verdict for img-0"));
    }

    #[tokio::test]
    async fn failed_comparisons_are_skipped() {
        let fake = Arc::new(
            FakeSimilarity::default()
                .fail("img-0")
                .answer("img-1", true, 80),
        );
        let candidates = vec![candidate(0), candidate(1)];

        let resolution = resolver(fake.clone())
            .resolve_with_stats(&new_image(), &candidates)
            .await;
        assert!(resolution.verdict.is_duplicate);
        assert_eq!(
            resolution.verdict.matched_report.map(|r| r.id),
            Some(ReportId::new("r-1"))
        );
        assert_eq!(resolution.comparison_failures, 1);
        assert_eq!(resolution.oracle_calls, 2);
    }

    #[tokio::test]
    async fn all_failures_resolve_to_unique() {
        let fake = Arc::new(FakeSimilarity::default().fail("img-0").fail("img-1"));
        let resolution = resolver(fake)
            .resolve_with_stats(&new_image(), &[candidate(0), candidate(1)])
            .await;
        assert!(!resolution.verdict.is_duplicate);
        assert_eq!(resolution.comparison_failures, 2);
    }

    #[tokio::test]
    async fn fingerprint_hit_skips_the_oracle() {
        let image = new_image();
        let mut hit = candidate(3);
        hit.fingerprint = Some(image.fingerprint());
        let candidates = vec![candidate(0), candidate(1), hit];
        let fake = Arc::new(FakeSimilarity::default().answer("img-0", true, 100));

        let verdict = resolver(fake.clone()).resolve(&image, &candidates).await;
        assert!(verdict.is_duplicate);
        assert_eq!(verdict.matched_by, Some(MatchKind::Fingerprint));
        assert_eq!(verdict.confidence, None);
        assert_eq!(verdict.reason.as_deref(), Some("exact fingerprint match"));
        assert_eq!(verdict.matched_report.unwrap().id, ReportId::new("r-3"));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn fast_path_can_be_disabled() {
        let image = new_image();
        let mut hit = candidate(0);
        hit.fingerprint = Some(image.fingerprint());
        let fake = Arc::new(FakeSimilarity::default());
        let cfg = DedupConfig {
            fingerprint_fast_path: false,
            ..Default::default()
        };

        let verdict = DuplicateResolver::new(fake.clone(), cfg)
            .resolve(&image, &[hit])
            .await;
        assert!(!verdict.is_duplicate);
        assert_eq!(fake.calls().len(), 1);
    }

    #[tokio::test]
    async fn window_bounds_oracle_calls() {
        let fake = Arc::new(FakeSimilarity::default().answer("img-4", true, 100));
        let candidates: Vec<_> = (0..10).map(candidate).collect();
        let cfg = DedupConfig::default().with_window(3);

        let resolution = DuplicateResolver::new(fake.clone(), cfg)
            .resolve_with_stats(&new_image(), &candidates)
            .await;
        assert!(!resolution.verdict.is_duplicate);
        assert_eq!(resolution.oracle_calls, 3);
    }

    #[tokio::test]
    async fn candidates_without_image_are_not_compared() {
        let mut blank = candidate(0);
        blank.image = ImageRef::Url(String::new());
        let fake = Arc::new(FakeSimilarity::default());

        let resolution = resolver(fake.clone())
            .resolve_with_stats(&new_image(), &[blank, candidate(1)])
            .await;
        assert_eq!(resolution.oracle_calls, 1);
        assert_eq!(fake.calls(), vec!["img-1"]);
    }
}
