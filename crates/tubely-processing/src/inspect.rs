//! Media Inspector
//!
//! Probes a staged file and classifies its display aspect ratio.

use crate::tools::{MediaTools, ToolError};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tubely_core::Classification;

#[derive(Debug, Error)]
pub enum InspectionError {
    #[error("Probe failed: {0}")]
    ProbeFailed(#[from] ToolError),

    #[error("Malformed probe output: {0}")]
    MalformedOutput(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    display_aspect_ratio: Option<String>,
}

/// What the probe reported about the primary video stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbedAspect {
    /// The stream declares a display aspect ratio such as `"16:9"`
    Declared(String),
    /// A stream exists but carries no usable aspect ratio
    Undeclared,
    /// The container has no streams at all
    NoStreams,
}

impl ProbedAspect {
    /// Parse ffprobe `-show_streams` JSON.
    ///
    /// The primary stream is the first one whose `codec_type` is `video`; when
    /// no stream declares a codec type the first stream is used.
    pub fn from_probe_json(raw: &[u8]) -> Result<Self, InspectionError> {
        let output: ProbeOutput =
            serde_json::from_slice(raw).map_err(InspectionError::MalformedOutput)?;

        if output.streams.is_empty() {
            return Ok(ProbedAspect::NoStreams);
        }

        let untyped = output.streams.iter().all(|s| s.codec_type.is_none());
        let primary = if untyped {
            output.streams.first()
        } else {
            output
                .streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some("video"))
        };

        let ratio = primary
            .and_then(|s| s.display_aspect_ratio.as_deref())
            .map(str::trim)
            .filter(|r| !r.is_empty());

        Ok(match ratio {
            Some(r) => ProbedAspect::Declared(r.to_string()),
            None => ProbedAspect::Undeclared,
        })
    }

    pub fn classification(&self) -> Classification {
        match self {
            ProbedAspect::Declared(ratio) => Classification::from_aspect_ratio(Some(ratio)),
            ProbedAspect::Undeclared | ProbedAspect::NoStreams => Classification::Other,
        }
    }
}

/// Runs the probe tool and classifies the result
#[derive(Clone)]
pub struct MediaInspector {
    tools: Arc<dyn MediaTools>,
}

impl MediaInspector {
    pub fn new(tools: Arc<dyn MediaTools>) -> Self {
        Self { tools }
    }

    /// Classify the file at `path`. Reads the file only; safe to repeat.
    pub async fn inspect(&self, path: &Path) -> Result<(ProbedAspect, Classification), InspectionError> {
        let raw = self.tools.probe(path).await.map_err(|e| {
            tracing::error!(
                error = %e,
                stderr = e.stderr().unwrap_or_default(),
                path = %path.display(),
                "ffprobe failed"
            );
            InspectionError::ProbeFailed(e)
        })?;

        let aspect = ProbedAspect::from_probe_json(&raw)?;
        let classification = aspect.classification();

        match &aspect {
            ProbedAspect::NoStreams => tracing::warn!(
                path = %path.display(),
                "Probe found no streams, classifying as other"
            ),
            ProbedAspect::Undeclared => tracing::debug!(
                path = %path.display(),
                "No display aspect ratio declared, classifying as other"
            ),
            ProbedAspect::Declared(ratio) => tracing::debug!(
                path = %path.display(),
                aspect_ratio = %ratio,
                classification = %classification,
                "Aspect ratio classified"
            ),
        }

        Ok((aspect, classification))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    const LANDSCAPE: &str = r#"{
        "streams": [
            {"index": 0, "codec_name": "h264", "codec_type": "video", "width": 1920, "height": 1080,
             "sample_aspect_ratio": "1:1", "display_aspect_ratio": "16:9"},
            {"index": 1, "codec_name": "aac", "codec_type": "audio"}
        ]
    }"#;

    #[test]
    fn parses_landscape_and_portrait() {
        let aspect = ProbedAspect::from_probe_json(LANDSCAPE.as_bytes()).unwrap();
        assert_eq!(aspect, ProbedAspect::Declared("16:9".to_string()));
        assert_eq!(aspect.classification(), Classification::Landscape);

        let portrait = br#"{"streams": [{"codec_type": "video", "display_aspect_ratio": "9:16"}]}"#;
        let aspect = ProbedAspect::from_probe_json(portrait).unwrap();
        assert_eq!(aspect.classification(), Classification::Portrait);
    }

    #[test]
    fn video_stream_is_primary_even_when_not_first() {
        let raw = br#"{"streams": [
            {"codec_type": "audio"},
            {"codec_type": "video", "display_aspect_ratio": "9:16"}
        ]}"#;
        let aspect = ProbedAspect::from_probe_json(raw).unwrap();
        assert_eq!(aspect.classification(), Classification::Portrait);
    }

    #[test]
    fn untyped_streams_use_first() {
        let raw = br#"{"streams": [{"display_aspect_ratio": "16:9"}, {"display_aspect_ratio": "9:16"}]}"#;
        let aspect = ProbedAspect::from_probe_json(raw).unwrap();
        assert_eq!(aspect.classification(), Classification::Landscape);
    }

    #[test]
    fn missing_or_odd_ratios_are_other() {
        let cases: [&[u8]; 4] = [
            br#"{"streams": [{"codec_type": "video"}]}"#,
            br#"{"streams": [{"codec_type": "video", "display_aspect_ratio": ""}]}"#,
            br#"{"streams": [{"codec_type": "video", "display_aspect_ratio": "4:3"}]}"#,
            br#"{"streams": [{"codec_type": "audio", "display_aspect_ratio": "16:9"}]}"#,
        ];
        for raw in cases {
            let aspect = ProbedAspect::from_probe_json(raw).unwrap();
            assert_eq!(aspect.classification(), Classification::Other);
        }
    }

    #[test]
    fn zero_streams_is_not_an_error() {
        assert_eq!(
            ProbedAspect::from_probe_json(br#"{"streams": []}"#).unwrap(),
            ProbedAspect::NoStreams
        );
        assert_eq!(
            ProbedAspect::from_probe_json(b"{}").unwrap(),
            ProbedAspect::NoStreams
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let err = ProbedAspect::from_probe_json(b"not json").unwrap_err();
        assert!(matches!(err, InspectionError::MalformedOutput(_)));
    }

    struct CannedProbe(Result<&'static str, ()>);

    #[async_trait]
    impl MediaTools for CannedProbe {
        async fn probe(&self, _input: &Path) -> Result<Vec<u8>, ToolError> {
            match self.0 {
                Ok(json) => Ok(json.as_bytes().to_vec()),
                Err(()) => Err(ToolError::Exit {
                    tool: "ffprobe",
                    status: "exit status: 1".to_string(),
                    stderr: "Invalid data found when processing input".to_string(),
                }),
            }
        }

        async fn remux(&self, _input: &Path, _output: &Path) -> Result<(), ToolError> {
            unreachable!("inspector never remuxes")
        }
    }

    #[tokio::test]
    async fn inspection_is_repeatable() {
        let inspector = MediaInspector::new(Arc::new(CannedProbe(Ok(LANDSCAPE))));
        let path = Path::new("/tmp/tubely-upload.mp4");

        let (_, first) = inspector.inspect(path).await.unwrap();
        let (_, second) = inspector.inspect(path).await.unwrap();
        assert_eq!(first, Classification::Landscape);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn tool_failure_is_probe_failed() {
        let inspector = MediaInspector::new(Arc::new(CannedProbe(Err(()))));
        let err = inspector
            .inspect(Path::new("/tmp/tubely-upload.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, InspectionError::ProbeFailed(_)));
    }
}
