use std::sync::atomic::{AtomicBool, Ordering};

use crate::cache::HistoryCache;
use crate::client::GenerationClient;
use crate::error::StudioError;
use crate::intake::{self, UploadCandidate};
use crate::models::{Generation, Style};

/// One user's studio session: intake, request, and history behind a
/// single-flight guard.
pub struct Studio {
    client: GenerationClient,
    history: HistoryCache,
    busy: AtomicBool,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Studio {
    pub fn new(client: GenerationClient, history: HistoryCache) -> Self {
        Self {
            client,
            history,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_generating(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Runs one generation attempt and records the result.
    ///
    /// Returns `Ok(None)` without touching the file or the network when an
    /// attempt is already in flight.
    pub async fn generate(
        &self,
        candidate: &UploadCandidate,
        prompt: &str,
        style: Style,
    ) -> Result<Option<Generation>, StudioError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("generation already in flight, ignoring request");
            return Ok(None);
        }
        let _guard = BusyGuard(&self.busy);

        let candidate = candidate.clone();
        let processed =
            tokio::task::spawn_blocking(move || intake::process_image_file(&candidate)).await??;
        let generation = self
            .client
            .generate(&processed.transfer_payload, prompt, style)
            .await?;
        self.history.append(generation.clone());
        tracing::info!(id = %generation.id, %style, "generation completed");
        Ok(Some(generation))
    }

    pub fn history(&self) -> Vec<Generation> {
        self.history.load()
    }

    pub fn clear_history(&self) {
        self.history.clear();
    }
}
