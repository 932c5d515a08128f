//! Local Media Source
//!
//! The host captures its playing audio exactly once and every peer session
//! shares the same track. The embedding player writes samples into the track;
//! this module only owns the capture-once contract.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use webrtc::api::media_engine::MIME_TYPE_OPUS;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// The host environment cannot capture its own playback. Fatal to the media
/// broadcast only; control-plane sync keeps working.
#[derive(Debug, Clone, Error)]
pub enum MediaCaptureError {
    #[error("media capture unsupported: {0}")]
    Unsupported(String),
}

/// Factory producing the streamable track for the host's playback
pub type CaptureFn =
    Box<dyn Fn() -> Result<Arc<TrackLocalStaticSample>, MediaCaptureError> + Send + Sync>;

/// Lazily captured, shared audio source
pub struct MediaSource {
    capture: CaptureFn,
    cached: Mutex<Option<Arc<TrackLocalStaticSample>>>,
}

impl MediaSource {
    pub fn new(capture: CaptureFn) -> Self {
        Self {
            capture,
            cached: Mutex::new(None),
        }
    }

    /// Default source: one Opus sample track the embedding player feeds via
    /// `write_sample`
    pub fn opus() -> Self {
        Self::new(Box::new(|| {
            Ok(Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_OPUS.to_owned(),
                    clock_rate: 48000,
                    channels: 2,
                    ..Default::default()
                },
                "audio".to_owned(),
                "waveroom".to_owned(),
            )))
        }))
    }

    /// Get the captured track, capturing on first use. Idempotent: every call
    /// after the first returns the same track.
    pub fn acquire(&self) -> Result<Arc<TrackLocalStaticSample>, MediaCaptureError> {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(track) = cached.as_ref() {
            return Ok(Arc::clone(track));
        }
        let track = (self.capture)()?;
        *cached = Some(Arc::clone(&track));
        Ok(track)
    }

    /// Whether capture has already happened
    pub fn is_captured(&self) -> bool {
        self.cached
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_happens_once() {
        let source = MediaSource::opus();
        assert!(!source.is_captured());

        let first = source.acquire().unwrap();
        let second = source.acquire().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(source.is_captured());
    }

    #[test]
    fn test_unsupported_capture_is_not_cached() {
        let source = MediaSource::new(Box::new(|| {
            Err(MediaCaptureError::Unsupported("no capture backend".to_string()))
        }));

        assert!(source.acquire().is_err());
        assert!(!source.is_captured());
    }
}
