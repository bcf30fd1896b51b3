//! Batch survey over a list of candidate addresses
//!
//! Addresses are processed one at a time. Each finished analysis is written to
//! the store before the next address starts, so a rerun skips what is done.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use super::annotate::frame_property;
use crate::cadastre::BoundaryProvider;
use crate::capture::ImageSource;
use crate::classify::Classifier;
use crate::config::RenderOptions;
use crate::domain::{AnalysisRecord, Candidate, Summary};
use crate::error::FrameError;
use crate::session::{ResultStore, paths};

/// Reasoning stored when no tile could be fetched for an address
pub const FETCH_FAILED_REASONING: &str = "Could not retrieve satellite image";

/// Runs the frame, classify, persist loop
pub struct Survey<'a> {
    provider: &'a dyn BoundaryProvider,
    images: &'a dyn ImageSource,
    classifier: &'a dyn Classifier,
    folder: PathBuf,
    options: RenderOptions,
    request_delay: Duration,
}

impl<'a> Survey<'a> {
    pub fn new(
        provider: &'a dyn BoundaryProvider,
        images: &'a dyn ImageSource,
        classifier: &'a dyn Classifier,
        folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            images,
            classifier,
            folder: folder.into(),
            options: RenderOptions::default(),
            request_delay: Duration::ZERO,
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Process every candidate, returning the records analyzed in this run
    pub fn run(
        &self,
        candidates: &[Candidate],
        store: &mut dyn ResultStore,
    ) -> Result<Vec<AnalysisRecord>> {
        std::fs::create_dir_all(&self.folder)
            .with_context(|| format!("Failed to create {}", self.folder.display()))?;

        let mut analyzed = Vec::new();
        for (i, candidate) in candidates.iter().enumerate() {
            log::info!(
                "[{}/{}] {}",
                i + 1,
                candidates.len(),
                candidate.address
            );

            if let Some(record) = self.process(candidate, store)? {
                analyzed.push(record);
                if !self.request_delay.is_zero() {
                    std::thread::sleep(self.request_delay);
                }
            }
        }

        let summary = Summary::from_records(&analyzed);
        log::info!(
            "Analyzed {} addresses: {} high, {} medium, {} low",
            summary.total(),
            summary.high,
            summary.medium,
            summary.low
        );
        Ok(analyzed)
    }

    /// Returns the new record, or None if the address was skipped
    fn process(
        &self,
        candidate: &Candidate,
        store: &mut dyn ResultStore,
    ) -> Result<Option<AnalysisRecord>> {
        let address = candidate.address.as_str();
        store.ensure(address)?;

        if store.is_complete(address) {
            log::debug!("Already analyzed: {address}");
            return Ok(None);
        }

        let image = match self.annotated_image(candidate) {
            Ok(image) => image,
            Err(err) => {
                log::warn!("Skipping {address}: {err}");
                let mut record = AnalysisRecord::pending(address);
                record.reasoning = Some(match err {
                    FrameError::Fetch(_) => FETCH_FAILED_REASONING.to_string(),
                    FrameError::Geo(err) => err.to_string(),
                });
                store.upsert(record)?;
                return Ok(None);
            }
        };

        let analysis = self.classifier.classify(&image, address);
        log::info!("{address}: {}", analysis.likelihood);

        let record = AnalysisRecord::analyzed(address, analysis);
        store.upsert(record.clone())?;
        Ok(Some(record))
    }

    /// Reuse a saved tile for this address, or frame a new one and save it
    fn annotated_image(&self, candidate: &Candidate) -> Result<Vec<u8>, FrameError> {
        let path = paths::image_path(
            &self.folder,
            &candidate.address,
            self.options.format.extension(),
        );

        if path.exists() {
            match std::fs::read(&path) {
                Ok(bytes) => {
                    log::debug!("Using saved image {}", path.display());
                    return Ok(bytes);
                }
                Err(err) => log::warn!("Failed to read {}: {err}", path.display()),
            }
        }

        let framed = frame_property(self.provider, self.images, candidate.point(), &self.options)?;
        if !framed.has_boundary {
            log::info!("No parcel boundary for {}, marking center", candidate.address);
        }

        if let Err(err) = std::fs::write(&path, &framed.image) {
            log::warn!("Failed to save {}: {err}", path.display());
        }
        Ok(framed.image)
    }
}
