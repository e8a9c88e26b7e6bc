//! Master playlist assembly
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


use reelvault_types::{RenditionOutput, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Filename of the master playlist inside an output bucket.
pub const MASTER_PLAYLIST_NAME: &str = "playlist.m3u8";

/// Assembles the adaptive-bitrate master playlist for one output bucket.
///
/// Variant entries are written after all rendition encodes have finished and
/// always follow the configured ladder order, so players see quality levels
/// in a stable descending sequence regardless of which encode finished first.
pub struct ManifestBuilder {
    master_path: PathBuf,
}

impl ManifestBuilder {
    pub fn new(bucket: &Path) -> Self {
        Self {
            master_path: bucket.join(MASTER_PLAYLIST_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.master_path
    }

    /// Create the master playlist with the fixed header and no variants.
    pub fn initialize(&self) -> Result<()> {
        let mut file = File::create(&self.master_path)?;
        writeln!(file, "#EXTM3U")?;
        writeln!(file, "#EXT-X-VERSION:3")?;
        Ok(())
    }

    /// Append one stream-info/path pair per completed rendition, in the
    /// order the outputs are given (ladder order).
    pub fn append_completed(&self, outputs: &[RenditionOutput]) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.master_path)?;

        let mut variants = 0;
        for output in outputs.iter().filter(|o| o.completed) {
            writeln!(
                file,
                "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}",
                output.descriptor.bandwidth_bits(),
                output.descriptor.resolution_label()
            )?;
            writeln!(file, "{}", output.playlist_path.display())?;
            variants += 1;
        }

        info!(
            master_playlist = %self.master_path.display(),
            variants = variants,
            "Master playlist written"
        );

        Ok(())
    }
}
