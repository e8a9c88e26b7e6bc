//! External encoder invocation
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


use async_trait::async_trait;
use reelvault_types::{PipelineError, RenditionDescriptor, Result};
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

/// Source metadata extracted before encoding. Fields are optional because
/// probing is best-effort and must never fail a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceProbe {
    pub duration_secs: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Seam over the external encoder tool. One implementation shells out to
/// ffmpeg/ffprobe; tests substitute their own.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Produce one scaled, bitrate-capped, segmented bitstream plus its
    /// sub-playlist inside `rendition_dir`.
    async fn encode_rendition(
        &self,
        source: &Path,
        descriptor: &RenditionDescriptor,
        rendition_dir: &Path,
    ) -> Result<()>;

    /// Extract a single still frame into `thumbs_dir`.
    async fn extract_thumbnail(&self, source: &Path, thumbs_dir: &Path) -> Result<()>;

    /// Probe source duration and resolution.
    async fn probe(&self, source: &Path) -> Result<SourceProbe>;
}

/// Offset of the thumbnail frame into the video.
const THUMBNAIL_OFFSET: &str = "00:00:05";

/// Encoder implementation backed by the ffmpeg command-line tools.
#[derive(Debug, Default)]
pub struct FfmpegEncoder;

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Build the ffmpeg argument vector for one rendition encode.
    fn rendition_args(
        source: &Path,
        descriptor: &RenditionDescriptor,
        rendition_dir: &Path,
    ) -> Vec<String> {
        let segment_pattern = rendition_dir.join("seg_%03d.ts");
        let playlist = rendition_dir.join("playlist.m3u8");

        vec![
            "-i".to_string(),
            source.to_string_lossy().into_owned(),
            "-vf".to_string(),
            format!("scale=-2:{}", descriptor.height),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-b:v".to_string(),
            format!("{}k", descriptor.bitrate_kbps),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            "128k".to_string(),
            "-preset".to_string(),
            "veryfast".to_string(),
            "-crf".to_string(),
            "20".to_string(),
            "-g".to_string(),
            "48".to_string(),
            "-keyint_min".to_string(),
            "48".to_string(),
            "-sc_threshold".to_string(),
            "0".to_string(),
            "-hls_time".to_string(),
            "4".to_string(),
            "-hls_playlist_type".to_string(),
            "vod".to_string(),
            "-hls_segment_filename".to_string(),
            segment_pattern.to_string_lossy().into_owned(),
            playlist.to_string_lossy().into_owned(),
        ]
    }

    /// Build the ffmpeg argument vector for the thumbnail still frame.
    fn thumbnail_args(source: &Path, thumbs_dir: &Path) -> Vec<String> {
        let thumb_pattern = thumbs_dir.join("thumb_%03d.jpg");

        vec![
            "-i".to_string(),
            source.to_string_lossy().into_owned(),
            "-ss".to_string(),
            THUMBNAIL_OFFSET.to_string(),
            "-vframes".to_string(),
            "1".to_string(),
            "-s".to_string(),
            "1280x720".to_string(),
            "-q:v".to_string(),
            "2".to_string(),
            thumb_pattern.to_string_lossy().into_owned(),
        ]
    }

    /// Extract source duration using ffprobe
    fn extract_duration(source: &Path) -> Option<u64> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(source)
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let duration_str = String::from_utf8(output.stdout).ok()?;
        let duration: f64 = duration_str.trim().parse().ok()?;
        Some(duration as u64)
    }

    /// Extract source resolution using ffprobe
    fn extract_resolution(source: &Path) -> Option<(u32, u32)> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-of",
                "csv=s=x:p=0",
            ])
            .arg(source)
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let resolution_str = String::from_utf8(output.stdout).ok()?;
        let mut parts = resolution_str.trim().split('x');
        let width: u32 = parts.next()?.parse().ok()?;
        let height: u32 = parts.next()?.parse().ok()?;

        Some((width, height))
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode_rendition(
        &self,
        source: &Path,
        descriptor: &RenditionDescriptor,
        rendition_dir: &Path,
    ) -> Result<()> {
        let args = Self::rendition_args(source, descriptor, rendition_dir);

        info!(
            rendition = descriptor.name,
            height = descriptor.height,
            bitrate_kbps = descriptor.bitrate_kbps,
            "Encoding rendition"
        );

        let status = Command::new("ffmpeg")
            .args(&args)
            .status()
            .map_err(|e| PipelineError::Encoder {
                rendition: descriptor.name.to_string(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(PipelineError::Encoder {
                rendition: descriptor.name.to_string(),
                reason: format!("ffmpeg exited with {status}"),
            });
        }

        info!(rendition = descriptor.name, "Rendition encode completed");
        Ok(())
    }

    async fn extract_thumbnail(&self, source: &Path, thumbs_dir: &Path) -> Result<()> {
        let args = Self::thumbnail_args(source, thumbs_dir);

        let status = Command::new("ffmpeg")
            .args(&args)
            .status()
            .map_err(|e| PipelineError::Encoder {
                rendition: "thumbnail".to_string(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(PipelineError::Encoder {
                rendition: "thumbnail".to_string(),
                reason: format!("ffmpeg exited with {status}"),
            });
        }

        Ok(())
    }

    async fn probe(&self, source: &Path) -> Result<SourceProbe> {
        let duration_secs = Self::extract_duration(source);
        let resolution = Self::extract_resolution(source);

        if duration_secs.is_none() && resolution.is_none() {
            warn!(source = %source.display(), "Source probe returned no metadata");
        }

        Ok(SourceProbe {
            duration_secs,
            width: resolution.map(|(w, _)| w),
            height: resolution.map(|(_, h)| h),
        })
    }
}
