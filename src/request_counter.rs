use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide tally of outbound model calls, shared by every request.
#[derive(Clone)]
pub struct RequestCounter {
    diagnosis_count: Arc<AtomicU64>,
    translation_count: Arc<AtomicU64>,
    started_at: DateTime<Utc>,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self {
            diagnosis_count: Arc::new(AtomicU64::new(0)),
            translation_count: Arc::new(AtomicU64::new(0)),
            started_at: Utc::now(),
        }
    }

    pub fn log_diagnosis_request(&self, context: &str) -> u64 {
        let count = self.diagnosis_count.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::info!(
            "MODEL REQUEST #{} | Type: DIAGNOSIS | Context: {} | Elapsed: {}s | Total Diagnosis: {} | Total Translation: {} | Rate: {:.2} req/min",
            self.total_requests(),
            context,
            self.elapsed_seconds(),
            count,
            self.translation_count(),
            self.request_rate()
        );

        count
    }

    pub fn log_translation_request(&self, context: &str) -> u64 {
        let count = self.translation_count.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::info!(
            "MODEL REQUEST #{} | Type: TRANSLATION | Context: {} | Elapsed: {}s | Total Diagnosis: {} | Total Translation: {} | Rate: {:.2} req/min",
            self.total_requests(),
            context,
            self.elapsed_seconds(),
            self.diagnosis_count(),
            count,
            self.request_rate()
        );

        count
    }

    pub fn diagnosis_count(&self) -> u64 {
        self.diagnosis_count.load(Ordering::SeqCst)
    }

    pub fn translation_count(&self) -> u64 {
        self.translation_count.load(Ordering::SeqCst)
    }

    pub fn total_requests(&self) -> u64 {
        self.diagnosis_count() + self.translation_count()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed_seconds(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    fn request_rate(&self) -> f64 {
        let elapsed = self.elapsed_seconds() as f64;
        if elapsed < 1.0 {
            return 0.0;
        }
        (self.total_requests() as f64 / elapsed) * 60.0 // requests per minute
    }

    pub fn print_summary(&self) {
        tracing::info!(
            "MODEL USAGE SUMMARY | Total: {} requests | Diagnosis: {} | Translation: {} | Elapsed: {}s | Avg Rate: {:.2} req/min",
            self.total_requests(),
            self.diagnosis_count(),
            self.translation_count(),
            self.elapsed_seconds(),
            self.request_rate()
        );
    }
}

impl Default for RequestCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_are_shared_across_clones() {
        let counter = RequestCounter::new();
        let clone = counter.clone();

        assert_eq!(counter.log_diagnosis_request("leaf.png"), 1);
        assert_eq!(clone.log_diagnosis_request("leaf.jpg"), 2);
        assert_eq!(clone.log_translation_request("Punjabi"), 1);

        assert_eq!(counter.diagnosis_count(), 2);
        assert_eq!(counter.translation_count(), 1);
        assert_eq!(counter.total_requests(), 3);
    }
}
