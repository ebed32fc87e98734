//! Upload envelopes: the small JSON documents that bundle text with file ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{Attachment, ContentId};

/// Upload shape chosen for a `(text, files)` input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadShape {
    /// Text only, uploaded as a plain file
    Text,
    /// A single file, uploaded as-is
    File,
    /// Text plus one file, bundled in a [`SingleFileEnvelope`]
    TextWithFile,
    /// Several files (with or without text), bundled in a [`MultiFileEnvelope`]
    MultiFile,
}

impl UploadShape {
    /// Pick the upload shape, or `None` when there is nothing to upload.
    ///
    /// Text counts as present only if it has non-whitespace characters.
    pub fn select(text: &str, files: &[Attachment]) -> Option<Self> {
        let has_text = !text.trim().is_empty();
        match (has_text, files.len()) {
            (true, 0) => Some(UploadShape::Text),
            (false, 0) => None,
            (false, 1) => Some(UploadShape::File),
            (true, 1) => Some(UploadShape::TextWithFile),
            (_, _) => Some(UploadShape::MultiFile),
        }
    }

    /// Number of content-store calls this shape performs for `file_count` files.
    pub fn upload_calls(&self, file_count: usize) -> usize {
        match self {
            UploadShape::Text | UploadShape::File => 1,
            UploadShape::TextWithFile => 2,
            UploadShape::MultiFile => file_count + 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadShape::Text => "text",
            UploadShape::File => "file",
            UploadShape::TextWithFile => "text_with_file",
            UploadShape::MultiFile => "multi_file",
        }
    }
}

/// Envelope for text accompanied by exactly one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleFileEnvelope {
    pub text: String,
    #[serde(alias = "fileCID")]
    pub file_content_id: ContentId,
    pub file_name: String,
    pub timestamp: DateTime<Utc>,
}

/// Envelope for several files; `text` may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiFileEnvelope {
    pub text: String,
    #[serde(alias = "fileCIDs")]
    pub file_content_ids: Vec<ContentId>,
    pub file_names: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Lenient view over any stored envelope, current or legacy field names.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeProbe {
    text: Option<String>,
    #[serde(alias = "fileCID")]
    file_content_id: Option<String>,
    #[serde(alias = "fileCIDs")]
    file_content_ids: Option<Vec<String>>,
}

/// Content read back from the store, decoded for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedContent {
    /// Text to show; the envelope's `text` field or the raw content
    pub text: String,
    /// Gateway URLs of files referenced by an envelope
    pub file_urls: Vec<String>,
    /// True when the stored bytes were an envelope
    pub is_envelope: bool,
}

impl ResolvedContent {
    /// Decode raw content bytes. JSON objects carrying envelope fields are
    /// unpacked; anything else is shown as (lossy UTF-8) text.
    pub fn decode(bytes: &[u8], gateway_url: impl Fn(&str) -> String) -> Self {
        let raw = String::from_utf8_lossy(bytes).into_owned();

        let probe = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value @ serde_json::Value::Object(_)) => {
                serde_json::from_value::<EnvelopeProbe>(value).unwrap_or_default()
            }
            _ => return Self::plain(raw),
        };

        let mut file_urls: Vec<String> = Vec::new();
        if let Some(id) = probe.file_content_id.as_deref().filter(|id| !id.is_empty()) {
            file_urls.push(gateway_url(id));
        }
        if let Some(ids) = &probe.file_content_ids {
            file_urls.extend(ids.iter().filter(|id| !id.is_empty()).map(|id| gateway_url(id)));
        }

        if probe.text.is_none() && file_urls.is_empty() {
            // Some other JSON document (e.g. NFT metadata); show it verbatim.
            return Self::plain(raw);
        }

        Self {
            text: probe.text.unwrap_or_default(),
            file_urls,
            is_envelope: true,
        }
    }

    fn plain(text: String) -> Self {
        Self {
            text,
            file_urls: Vec::new(),
            is_envelope: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(id: &str) -> String {
        format!("https://gw/ipfs/{id}")
    }

    #[test]
    fn test_select_shapes() {
        let one = vec![Attachment::new("a.txt", b"a".to_vec())];
        let two = vec![
            Attachment::new("a.txt", b"a".to_vec()),
            Attachment::new("b.txt", b"b".to_vec()),
        ];

        assert_eq!(UploadShape::select("hi", &[]), Some(UploadShape::Text));
        assert_eq!(UploadShape::select("", &one), Some(UploadShape::File));
        assert_eq!(UploadShape::select("hi", &one), Some(UploadShape::TextWithFile));
        assert_eq!(UploadShape::select("hi", &two), Some(UploadShape::MultiFile));
        assert_eq!(UploadShape::select("", &two), Some(UploadShape::MultiFile));
        assert_eq!(UploadShape::select("   ", &[]), None);
        assert_eq!(UploadShape::select("", &[]), None);
    }

    #[test]
    fn test_upload_call_counts() {
        assert_eq!(UploadShape::Text.upload_calls(0), 1);
        assert_eq!(UploadShape::TextWithFile.upload_calls(1), 2);
        assert_eq!(UploadShape::MultiFile.upload_calls(3), 4);
    }

    #[test]
    fn test_single_envelope_field_names() {
        let env = SingleFileEnvelope {
            text: "hello".into(),
            file_content_id: ContentId::from("bafyfile"),
            file_name: "a.png".into(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["fileContentId"], "bafyfile");
        assert_eq!(json["fileName"], "a.png");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_decode_plain_text() {
        let resolved = ResolvedContent::decode(b"just words", url);
        assert_eq!(resolved.text, "just words");
        assert!(!resolved.is_envelope);
        assert!(resolved.file_urls.is_empty());
    }

    #[test]
    fn test_decode_single_envelope_and_legacy_name() {
        let current = br#"{"text":"t","fileContentId":"f1","fileName":"x"}"#;
        let resolved = ResolvedContent::decode(current, url);
        assert_eq!(resolved.text, "t");
        assert_eq!(resolved.file_urls, vec!["https://gw/ipfs/f1".to_string()]);
        assert!(resolved.is_envelope);

        let legacy = br#"{"text":"t","fileCID":"f2","fileName":"x"}"#;
        let resolved = ResolvedContent::decode(legacy, url);
        assert_eq!(resolved.file_urls, vec!["https://gw/ipfs/f2".to_string()]);
    }

    #[test]
    fn test_decode_multi_envelope() {
        let bytes = br#"{"text":"","fileContentIds":["a","b"],"fileNames":["1","2"]}"#;
        let resolved = ResolvedContent::decode(bytes, url);
        assert_eq!(resolved.text, "");
        assert_eq!(resolved.file_urls.len(), 2);
    }

    #[test]
    fn test_decode_non_envelope_json_is_plain() {
        let bytes = br#"{"name":"Autho.D.oX Proof #1","attributes":[]}"#;
        let resolved = ResolvedContent::decode(bytes, url);
        assert!(!resolved.is_envelope);
        assert!(resolved.text.contains("Autho.D.oX"));

        let resolved = ResolvedContent::decode(b"[1,2,3]", url);
        assert_eq!(resolved.text, "[1,2,3]");
    }
}
