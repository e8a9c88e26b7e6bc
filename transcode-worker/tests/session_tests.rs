//! Worker Session Tests
//!
//! Exercise preset/parse against a stub encoder so no ffmpeg is needed.

use async_trait::async_trait;
use reelvault_types::{
    PipelineError, RenditionDescriptor, RenditionFailurePolicy, Result as PipelineResult,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use transcode_worker::{Encoder, SourceProbe, WorkerSession};

/// Encoder stub that writes placeholder playlists and can be told to fail
/// specific renditions or the thumbnail.
#[derive(Default)]
struct StubEncoder {
    fail_renditions: HashSet<&'static str>,
    fail_thumbnail: bool,
    /// Renditions to delay, to prove manifest order ignores completion order.
    slow_renditions: HashSet<&'static str>,
}

#[async_trait]
impl Encoder for StubEncoder {
    async fn encode_rendition(
        &self,
        _source: &Path,
        descriptor: &RenditionDescriptor,
        rendition_dir: &Path,
    ) -> PipelineResult<()> {
        if self.slow_renditions.contains(descriptor.name) {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        if self.fail_renditions.contains(descriptor.name) {
            return Err(PipelineError::Encoder {
                rendition: descriptor.name.to_string(),
                reason: "stub failure".to_string(),
            });
        }

        std::fs::write(rendition_dir.join("playlist.m3u8"), "#EXTM3U\n")?;
        std::fs::write(rendition_dir.join("seg_000.ts"), b"segment")?;
        Ok(())
    }

    async fn extract_thumbnail(&self, _source: &Path, thumbs_dir: &Path) -> PipelineResult<()> {
        if self.fail_thumbnail {
            return Err(PipelineError::Encoder {
                rendition: "thumbnail".to_string(),
                reason: "stub failure".to_string(),
            });
        }

        std::fs::write(thumbs_dir.join("thumb_001.jpg"), b"jpeg")?;
        Ok(())
    }

    async fn probe(&self, _source: &Path) -> PipelineResult<SourceProbe> {
        Ok(SourceProbe {
            duration_secs: Some(42),
            width: Some(1920),
            height: Some(1080),
        })
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    source: PathBuf,
    bucket: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("intake").join("12.mp4");
    std::fs::create_dir_all(source.parent().unwrap()).unwrap();
    std::fs::write(&source, b"video bytes").unwrap();
    let bucket = dir.path().join("media").join("12");

    Fixture {
        _dir: dir,
        source,
        bucket,
    }
}

fn session(fx: &Fixture, policy: RenditionFailurePolicy, encoder: StubEncoder) -> WorkerSession {
    WorkerSession::new(
        fx.source.clone(),
        fx.bucket.clone(),
        policy,
        Arc::new(encoder),
    )
}

#[tokio::test]
async fn test_preset_creates_bucket_layout() {
    let fx = fixture();
    let session = session(&fx, RenditionFailurePolicy::AllMustSucceed, StubEncoder::default());

    session.preset().await.unwrap();

    assert!(fx.bucket.is_dir());
    assert!(fx.bucket.join("thumbs").is_dir());
    for name in ["1080p", "720p", "480p"] {
        assert!(fx.bucket.join(name).is_dir(), "missing rendition dir {name}");
    }

    let manifest = std::fs::read_to_string(fx.bucket.join("playlist.m3u8")).unwrap();
    assert_eq!(manifest, "#EXTM3U\n#EXT-X-VERSION:3\n");
}

#[tokio::test]
async fn test_preset_missing_source_creates_nothing() {
    let fx = fixture();
    std::fs::remove_file(&fx.source).unwrap();
    let session = session(&fx, RenditionFailurePolicy::AllMustSucceed, StubEncoder::default());

    let err = session.preset().await.unwrap_err();
    assert!(matches!(err, PipelineError::MissingSource(_)));
    assert!(!fx.bucket.exists());
}

#[tokio::test]
async fn test_parse_full_success_builds_complete_manifest() {
    let fx = fixture();
    let session = session(&fx, RenditionFailurePolicy::AllMustSucceed, StubEncoder::default());

    session.preset().await.unwrap();
    let outcome = session.parse().await.unwrap();

    assert!(outcome.policy_satisfied);
    assert!(outcome.thumbnail_ok);
    assert!(outcome.outputs.iter().all(|o| o.completed));

    let manifest = std::fs::read_to_string(fx.bucket.join("playlist.m3u8")).unwrap();
    let stream_lines: Vec<&str> = manifest
        .lines()
        .filter(|l| l.starts_with("#EXT-X-STREAM-INF"))
        .collect();
    assert_eq!(stream_lines.len(), 3);
    assert!(manifest.contains("BANDWIDTH=8000000,RESOLUTION=1080p"));
    assert!(manifest.contains("BANDWIDTH=5000000,RESOLUTION=720p"));
    assert!(manifest.contains("BANDWIDTH=2500000,RESOLUTION=480p"));
    assert!(fx.bucket.join("thumbs/thumb_001.jpg").is_file());
}

#[tokio::test]
async fn test_manifest_order_ignores_completion_order() {
    let fx = fixture();
    let encoder = StubEncoder {
        // The highest rung finishes last; the manifest must still lead with it.
        slow_renditions: HashSet::from(["1080p"]),
        ..Default::default()
    };
    let session = session(&fx, RenditionFailurePolicy::AllMustSucceed, encoder);

    session.preset().await.unwrap();
    session.parse().await.unwrap();

    let manifest = std::fs::read_to_string(fx.bucket.join("playlist.m3u8")).unwrap();
    let pos_1080 = manifest.find("RESOLUTION=1080p").unwrap();
    let pos_480 = manifest.find("RESOLUTION=480p").unwrap();
    assert!(pos_1080 < pos_480);
}

#[tokio::test]
async fn test_single_rendition_failure_fails_strict_policy() {
    let fx = fixture();
    let encoder = StubEncoder {
        fail_renditions: HashSet::from(["720p"]),
        ..Default::default()
    };
    let session = session(&fx, RenditionFailurePolicy::AllMustSucceed, encoder);

    session.preset().await.unwrap();
    let outcome = session.parse().await.unwrap();

    assert!(!outcome.policy_satisfied);

    // Siblings are not aborted and still reach the manifest.
    let manifest = std::fs::read_to_string(fx.bucket.join("playlist.m3u8")).unwrap();
    assert!(manifest.contains("RESOLUTION=1080p"));
    assert!(!manifest.contains("RESOLUTION=720p"));
    assert!(manifest.contains("RESOLUTION=480p"));
}

#[tokio::test]
async fn test_single_rendition_failure_passes_lenient_policy() {
    let fx = fixture();
    let encoder = StubEncoder {
        fail_renditions: HashSet::from(["1080p", "720p"]),
        ..Default::default()
    };
    let session = session(&fx, RenditionFailurePolicy::AnySuccess, encoder);

    session.preset().await.unwrap();
    let outcome = session.parse().await.unwrap();

    assert!(outcome.policy_satisfied);
    assert_eq!(outcome.outputs.iter().filter(|o| o.completed).count(), 1);
}

#[tokio::test]
async fn test_thumbnail_failure_does_not_affect_policy() {
    let fx = fixture();
    let encoder = StubEncoder {
        fail_thumbnail: true,
        ..Default::default()
    };
    let session = session(&fx, RenditionFailurePolicy::AllMustSucceed, encoder);

    session.preset().await.unwrap();
    let outcome = session.parse().await.unwrap();

    assert!(!outcome.thumbnail_ok);
    assert!(outcome.policy_satisfied);
}
