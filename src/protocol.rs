//! Wire format of the conversion backend and the decoded result type.
//!
//! The backend speaks plain JSON over two endpoints:
//!
//! ```text
//! POST /convert  { "url", "session_id" }  ──▶  { "status": "success" | "cancelled" | "error", … }
//! POST /cancel   { "session_id" }          ──▶  (ignored)
//! ```
//!
//! [`ConvertResponse`] mirrors the body loosely (every field optional) and
//! [`ConvertResponse::into_result`] turns it into the strict
//! [`ConversionResult`] the rest of the crate works with.

use crate::error::TrackfetchError;
use crate::session::SessionId;
use serde::{Deserialize, Serialize};

/// Body of `POST /convert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub url: String,
    pub session_id: SessionId,
}

/// Body of `POST /cancel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub session_id: SessionId,
}

/// One converted output item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    /// Path relative to the backend origin, e.g. `/downloads/<id>/song.mp3`.
    #[serde(rename = "downloadLink")]
    pub download_link: String,
}

/// Raw `POST /convert` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConvertResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tracks: Option<Vec<Track>>,
    #[serde(default, rename = "zipLink")]
    pub zip_link: Option<String>,
    #[serde(default)]
    pub skipped: Option<Vec<String>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ConvertResponse {
    /// Decode the loose wire shape into a [`ConversionResult`].
    ///
    /// Any tag other than `success` or `cancelled` is an error result.
    /// A `success` without a `tracks` array is malformed.
    pub fn into_result(self) -> Result<ConversionResult, TrackfetchError> {
        match self.status.as_str() {
            "success" => {
                let tracks = self.tracks.ok_or_else(|| TrackfetchError::Decode {
                    endpoint: "/convert".into(),
                    reason: "success response without a 'tracks' array".into(),
                })?;
                Ok(ConversionResult::Success {
                    tracks,
                    zip_link: self.zip_link.filter(|z| !z.is_empty()),
                    skipped: self.skipped.unwrap_or_default(),
                })
            }
            "cancelled" => Ok(ConversionResult::Cancelled),
            _ => Ok(ConversionResult::Error {
                message: self.message.unwrap_or_else(|| "unknown error".to_string()),
            }),
        }
    }
}

/// Outcome reported by the backend for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ConversionResult {
    Success {
        tracks: Vec<Track>,
        zip_link: Option<String>,
        skipped: Vec<String>,
    },
    Cancelled,
    Error { message: String },
}

impl ConversionResult {
    /// Status line shown once this result has been presented.
    pub fn status_text(&self) -> String {
        match self {
            ConversionResult::Success { tracks, .. } => format!("{} track(s) ready.", tracks.len()),
            ConversionResult::Cancelled => "Conversion stopped.".to_string(),
            ConversionResult::Error { message } => format!("Error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Result<ConversionResult, TrackfetchError> {
        serde_json::from_str::<ConvertResponse>(json)
            .expect("valid JSON")
            .into_result()
    }

    #[test]
    fn success_with_everything() {
        let r = decode(
            r#"{"status":"success",
                "tracks":[{"name":"A","downloadLink":"/d/a.mp3"},{"name":"B","downloadLink":"/d/b.mp3"}],
                "zipLink":"/d/all.zip",
                "skipped":["Gone"]}"#,
        )
        .unwrap();
        match r {
            ConversionResult::Success { tracks, zip_link, skipped } => {
                assert_eq!(tracks.len(), 2);
                assert_eq!(tracks[1].download_link, "/d/b.mp3");
                assert_eq!(zip_link.as_deref(), Some("/d/all.zip"));
                assert_eq!(skipped, vec!["Gone".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn success_minimal_and_empty_zip() {
        let r = decode(r#"{"status":"success","tracks":[],"zipLink":""}"#).unwrap();
        assert_eq!(
            r,
            ConversionResult::Success {
                tracks: vec![],
                zip_link: None,
                skipped: vec![]
            }
        );
        assert_eq!(r.status_text(), "0 track(s) ready.");
    }

    #[test]
    fn success_without_tracks_is_malformed() {
        let err = decode(r#"{"status":"success"}"#).unwrap_err();
        assert!(matches!(err, TrackfetchError::Decode { .. }));
    }

    #[test]
    fn cancelled_and_error() {
        assert_eq!(decode(r#"{"status":"cancelled"}"#).unwrap(), ConversionResult::Cancelled);
        let r = decode(r#"{"status":"error","message":"Invalid URL"}"#).unwrap();
        assert_eq!(r.status_text(), "Error: Invalid URL");
    }

    #[test]
    fn unknown_tag_is_error() {
        let r = decode(r#"{"status":"weird","message":"nope"}"#).unwrap();
        assert_eq!(r, ConversionResult::Error { message: "nope".into() });
        let r = decode(r#"{}"#).unwrap();
        assert_eq!(r.status_text(), "Error: unknown error");
    }

    #[test]
    fn request_wire_shape() {
        let id = SessionId::new();
        let body = serde_json::to_value(ConvertRequest {
            url: "https://example.com/list".into(),
            session_id: id.clone(),
        })
        .unwrap();
        assert_eq!(body["url"], "https://example.com/list");
        assert_eq!(body["session_id"], id.to_string());
    }
}
