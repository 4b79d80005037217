use crate::error::CaptureError;
use crate::transport::LocalTracks;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::{info, warn};
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

pub const SCREEN_STREAM_ID: &str = "lumen-screen";

/// Source of the tracks a broadcaster sends to its viewers.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    async fn capture(&self) -> Result<LocalTracks, CaptureError>;
}

/// Sample-fed VP8 video and Opus audio tracks.
///
/// The tracks are created empty; whoever owns the real source writes samples
/// into them with `TrackLocalStaticSample::write_sample`.
#[derive(Debug, Clone)]
pub struct SampleTrackCapture {
    pub video: bool,
    pub audio: bool,
}

impl Default for SampleTrackCapture {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

#[async_trait]
impl MediaCapture for SampleTrackCapture {
    async fn capture(&self) -> Result<LocalTracks, CaptureError> {
        let mut tracks: LocalTracks = Vec::new();

        if self.video {
            tracks.push(Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_VP8.to_owned(),
                    ..Default::default()
                },
                "video".to_owned(),
                SCREEN_STREAM_ID.to_owned(),
            )));
        }

        if self.audio {
            tracks.push(Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_OPUS.to_owned(),
                    ..Default::default()
                },
                "audio".to_owned(),
                SCREEN_STREAM_ID.to_owned(),
            )));
        }

        if tracks.is_empty() {
            return Err(CaptureError::NoTracks);
        }
        Ok(tracks)
    }
}

type CaptureSlot = Arc<OnceCell<Result<LocalTracks, CaptureError>>>;

/// Per-session capture cache.
///
/// The first link that needs media triggers the capture; every later link
/// gets the same tracks, or the same error. Nothing is retried until
/// [`LocalMedia::release`].
pub struct LocalMedia {
    source: Arc<dyn MediaCapture>,
    slot: RwLock<CaptureSlot>,
}

impl LocalMedia {
    pub fn new(source: Arc<dyn MediaCapture>) -> Self {
        Self {
            source,
            slot: RwLock::new(Arc::new(OnceCell::new())),
        }
    }

    pub async fn tracks(&self) -> Result<LocalTracks, CaptureError> {
        let slot = self.slot.read().await.clone();
        slot.get_or_init(|| async {
            let result = self.source.capture().await;
            match &result {
                Ok(tracks) => info!("Captured {} local track(s)", tracks.len()),
                Err(e) => warn!("Media capture failed: {}", e),
            }
            result
        })
        .await
        .clone()
    }

    /// Forgets the captured tracks so the next call captures again.
    pub async fn release(&self) {
        *self.slot.write().await = Arc::new(OnceCell::new());
    }
}
