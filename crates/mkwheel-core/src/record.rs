//! RECORD manifest: the content-addressed listing of archive members.
//!
//! Installers verify a wheel against its RECORD, one `path,digest,size`
//! row per member in insertion order. The RECORD itself is listed last
//! with empty digest and size fields, since it cannot hash itself.

use std::borrow::Cow;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Compute the RECORD digest of a member's bytes.
///
/// Format: `sha256=` followed by the URL-safe base64 encoding of the raw
/// digest with trailing `=` padding stripped.
pub fn content_hash(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    format!("sha256={}", URL_SAFE_NO_PAD.encode(digest))
}

/// One row of the RECORD manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    /// Archive-relative path of the member.
    pub path: String,
    /// Content digest; empty only for the RECORD's own row.
    pub digest: String,
    /// Member size in bytes; absent only for the RECORD's own row.
    pub size: Option<u64>,
}

impl RecordEntry {
    /// Row for a hashed archive member.
    pub fn hashed(path: impl Into<String>, data: &[u8]) -> Self {
        Self {
            path: path.into(),
            digest: content_hash(data),
            size: Some(data.len() as u64),
        }
    }

    /// The RECORD's self-referencing final row: no digest, no size.
    pub fn self_row(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            digest: String::new(),
            size: None,
        }
    }
}

/// Accumulating RECORD manifest for one archive build.
#[derive(Debug, Default)]
pub struct Record {
    entries: Vec<RecordEntry>,
}

impl Record {
    /// Append a row. Insertion order is preserved in the serialized output.
    pub fn push(&mut self, entry: RecordEntry) {
        self.entries.push(entry);
    }

    /// Rows appended so far.
    pub fn entries(&self) -> &[RecordEntry] {
        &self.entries
    }

    /// Serialize all rows as CSV, one `\r\n`-terminated row per member.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&csv_field(&entry.path));
            out.push(',');
            out.push_str(&csv_field(&entry.digest));
            out.push(',');
            if let Some(size) = entry.size {
                out.push_str(&size.to_string());
            }
            out.push_str("\r\n");
        }
        out
    }
}

/// Quote a field if it contains the delimiter, a quote, or a line break.
fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_hash() {
        assert_eq!(
            content_hash(b""),
            "sha256=47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU"
        );
    }

    #[test]
    fn digest_decodes_to_raw_sha256() {
        let data = b"built extension bytes";
        let hash = content_hash(data);
        let encoded = hash.strip_prefix("sha256=").unwrap();
        let raw = URL_SAFE_NO_PAD.decode(encoded).unwrap();
        assert_eq!(raw.as_slice(), Sha256::digest(data).as_slice());
    }

    #[test]
    fn hashed_entry_records_size() {
        let entry = RecordEntry::hashed("coho/__init__.py", b"abcd");
        assert_eq!(entry.size, Some(4));
        assert!(entry.digest.starts_with("sha256="));
    }

    #[test]
    fn serialize_preserves_order_and_self_row() {
        let mut record = Record::default();
        record.push(RecordEntry::hashed("coho/smi.py", b"x"));
        record.push(RecordEntry::hashed("coho-1.0.dist-info/WHEEL", b"y"));
        record.push(RecordEntry::self_row("coho-1.0.dist-info/RECORD"));

        let text = record.serialize();
        let rows: Vec<&str> = text.split("\r\n").filter(|r| !r.is_empty()).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("coho/smi.py,sha256="));
        assert!(rows[1].starts_with("coho-1.0.dist-info/WHEEL,sha256="));
        assert_eq!(rows[2], "coho-1.0.dist-info/RECORD,,");
    }

    #[test]
    fn field_with_delimiter_is_quoted() {
        let mut record = Record::default();
        record.push(RecordEntry::hashed("odd,name.py", b"x"));
        let text = record.serialize();
        assert!(text.starts_with("\"odd,name.py\",sha256="));
    }

    #[test]
    fn rows_end_with_crlf() {
        let mut record = Record::default();
        record.push(RecordEntry::self_row("RECORD"));
        assert_eq!(record.serialize(), "RECORD,,\r\n");
    }
}
