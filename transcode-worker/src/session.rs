//! One worker lifetime for a single job
// Copyright 2025 Reelvault Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use crate::encoder::Encoder;
use crate::manifest::ManifestBuilder;
use futures::future::join_all;
use reelvault_types::{
    PipelineError, RenditionDescriptor, RenditionFailurePolicy, RenditionOutput, Result,
    RENDITION_LADDER,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Subdirectory of the bucket holding thumbnail images.
const THUMBS_DIR: &str = "thumbs";

/// Result of the parse phase.
#[derive(Debug)]
pub struct ParseOutcome {
    pub outputs: Vec<RenditionOutput>,
    pub thumbnail_ok: bool,
    pub policy_satisfied: bool,
}

/// Drives the work for one job: bucket preparation, concurrent encodes,
/// manifest assembly. Lives exactly as long as the worker process.
pub struct WorkerSession {
    source: PathBuf,
    bucket: PathBuf,
    thumbs_dir: PathBuf,
    manifest: ManifestBuilder,
    ladder: &'static [RenditionDescriptor],
    policy: RenditionFailurePolicy,
    encoder: Arc<dyn Encoder>,
}

impl WorkerSession {
    pub fn new(
        source: PathBuf,
        bucket: PathBuf,
        policy: RenditionFailurePolicy,
        encoder: Arc<dyn Encoder>,
    ) -> Self {
        let thumbs_dir = bucket.join(THUMBS_DIR);
        let manifest = ManifestBuilder::new(&bucket);

        Self {
            source,
            bucket,
            thumbs_dir,
            manifest,
            ladder: &RENDITION_LADDER,
            policy,
            encoder,
        }
    }

    pub fn bucket(&self) -> &Path {
        &self.bucket
    }

    /// Validate the source and create the output bucket layout.
    ///
    /// A missing source is a hard failure: no directory is created and the
    /// caller is expected to terminate with a nonzero exit code.
    pub async fn preset(&self) -> Result<()> {
        if !self.source.exists() {
            return Err(PipelineError::MissingSource(self.source.clone()));
        }

        std::fs::create_dir_all(&self.bucket)?;
        std::fs::create_dir_all(&self.thumbs_dir)?;
        self.manifest.initialize()?;

        for descriptor in self.ladder {
            std::fs::create_dir_all(self.bucket.join(descriptor.name))?;
        }

        match self.encoder.probe(&self.source).await {
            Ok(probe) => info!(
                source = %self.source.display(),
                duration_secs = probe.duration_secs,
                width = probe.width,
                height = probe.height,
                "Output bucket prepared"
            ),
            Err(e) => warn!(
                source = %self.source.display(),
                error = %e,
                "Source probe failed"
            ),
        }

        Ok(())
    }

    /// Run thumbnail extraction and every rendition encode concurrently,
    /// then write the manifest entries in ladder order and evaluate the
    /// failure policy.
    pub async fn parse(&self) -> Result<ParseOutcome> {
        let thumb_task = {
            let encoder = Arc::clone(&self.encoder);
            let source = self.source.clone();
            let thumbs_dir = self.thumbs_dir.clone();
            tokio::spawn(async move { encoder.extract_thumbnail(&source, &thumbs_dir).await })
        };

        let rendition_tasks: Vec<_> = self
            .ladder
            .iter()
            .map(|descriptor| {
                let encoder = Arc::clone(&self.encoder);
                let source = self.source.clone();
                let rendition_dir = self.bucket.join(descriptor.name);
                let descriptor = *descriptor;

                tokio::spawn(async move {
                    encoder
                        .encode_rendition(&source, &descriptor, &rendition_dir)
                        .await
                })
            })
            .collect();

        let results = join_all(rendition_tasks).await;

        let mut outputs = Vec::with_capacity(self.ladder.len());
        for (descriptor, result) in self.ladder.iter().zip(results) {
            let completed = match result {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    error!(rendition = descriptor.name, error = %e, "Rendition encode failed");
                    false
                }
                Err(e) => {
                    error!(rendition = descriptor.name, error = %e, "Rendition task panicked");
                    false
                }
            };

            outputs.push(RenditionOutput {
                descriptor: *descriptor,
                playlist_path: PathBuf::from(format!("{}/playlist.m3u8", descriptor.name)),
                completed,
            });
        }

        let thumbnail_ok = match thumb_task.await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "Thumbnail extraction failed");
                false
            }
            Err(e) => {
                warn!(error = %e, "Thumbnail task panicked");
                false
            }
        };

        self.manifest.append_completed(&outputs)?;

        let policy_satisfied = self.policy.is_satisfied(&outputs);
        let completed = outputs.iter().filter(|o| o.completed).count();

        info!(
            renditions = self.ladder.len(),
            completed = completed,
            thumbnail_ok = thumbnail_ok,
            policy = ?self.policy,
            policy_satisfied = policy_satisfied,
            "Parse phase finished"
        );

        Ok(ParseOutcome {
            outputs,
            thumbnail_ok,
            policy_satisfied,
        })
    }
}
