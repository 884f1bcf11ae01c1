//! Progress-callback trait for per-stage conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves a document through its stages.
//!
//! # Example
//!
//! ```rust
//! use html2pdf::{ConversionConfig, ConversionProgressCallback, ConversionStage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ConversionProgressCallback for Printer {
//!     fn on_stage_complete(&self, stage: ConversionStage, elapsed_ms: u64) {
//!         eprintln!("{stage} done in {elapsed_ms}ms");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The pipeline stages a document passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversionStage {
    /// Reading the file, upload or URL and decoding it.
    Read,
    /// Regex cleanup of the raw markup.
    Sanitize,
    /// DOM pass applying the fixed rule set.
    Normalize,
    /// Laying the document out into PDF bytes.
    Render,
    /// Making the PDF bytes reproducible.
    Finalize,
}

impl ConversionStage {
    /// All stages in execution order.
    pub const ALL: [ConversionStage; 5] = [
        ConversionStage::Read,
        ConversionStage::Sanitize,
        ConversionStage::Normalize,
        ConversionStage::Render,
        ConversionStage::Finalize,
    ];

    /// Rough share of the total work done once this stage completes, in percent.
    pub fn percent_complete(self) -> u8 {
        match self {
            ConversionStage::Read => 20,
            ConversionStage::Sanitize => 35,
            ConversionStage::Normalize => 50,
            ConversionStage::Render => 90,
            ConversionStage::Finalize => 100,
        }
    }
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConversionStage::Read => "reading",
            ConversionStage::Sanitize => "sanitizing",
            ConversionStage::Normalize => "normalizing",
            ConversionStage::Render => "rendering",
            ConversionStage::Finalize => "finalizing",
        };
        f.write_str(s)
    }
}

/// Called by the conversion pipeline as it processes a document.
///
/// Implementations must be `Send + Sync`: the render stage runs on a
/// blocking thread and several conversions may share one callback. All
/// methods have default no-op implementations so callers only override what
/// they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the input is read.
    ///
    /// # Arguments
    /// * `input`: the path, URL or upload name being converted
    fn on_conversion_start(&self, input: &str) {
        let _ = input;
    }

    /// Called when a stage begins.
    fn on_stage_start(&self, stage: ConversionStage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    fn on_stage_complete(&self, stage: ConversionStage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called once after the PDF has been produced.
    ///
    /// # Arguments
    /// * `output_bytes`: size of the final PDF
    fn on_conversion_complete(&self, output_bytes: usize) {
        let _ = output_bytes;
    }

    /// Called once when the conversion fails, with the user-visible message.
    fn on_conversion_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        stages: Mutex<Vec<ConversionStage>>,
        completed_bytes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_stage_complete(&self, stage: ConversionStage, _elapsed_ms: u64) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_conversion_complete(&self, output_bytes: usize) {
            self.completed_bytes.store(output_bytes, Ordering::SeqCst);
        }

        fn on_conversion_error(&self, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start("in.html");
        cb.on_stage_start(ConversionStage::Read);
        cb.on_stage_complete(ConversionStage::Read, 3);
        cb.on_conversion_complete(1024);
        cb.on_conversion_error("boom");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        for stage in ConversionStage::ALL {
            tracker.on_stage_complete(stage, 1);
        }
        tracker.on_conversion_complete(2048);

        assert_eq!(*tracker.stages.lock().unwrap(), ConversionStage::ALL.to_vec());
        assert_eq!(tracker.completed_bytes.load(Ordering::SeqCst), 2048);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn percent_complete_is_monotonic() {
        let pct: Vec<u8> = ConversionStage::ALL
            .iter()
            .map(|s| s.percent_complete())
            .collect();
        assert!(pct.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(pct.last(), Some(&100));
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ConversionProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_stage_start(ConversionStage::Render);
        cb.on_stage_complete(ConversionStage::Render, 10);
    }
}
