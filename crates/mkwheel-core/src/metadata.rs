//! WHEEL and METADATA record formatting.
//!
//! Both records are fixed-format text blocks. They are modeled as small
//! structs with pure `render` functions so the exact field ordering and
//! literal text stay auditable and independently testable.

/// Contents of the `WHEEL` metadata record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelRecord<'a> {
    /// Name of the generating tool, e.g. `coho`.
    pub generator: &'a str,
    /// Version of the packaged release.
    pub version: &'a str,
    /// Canonical text of the resolved compatibility tag.
    pub tag: &'a str,
}

impl WheelRecord<'_> {
    /// Render the record text, one `Key: value` line per field.
    pub fn render(&self) -> String {
        format!(
            "Wheel-Version: 1.0\n\
             Generator: {} ({})\n\
             Root-Is-Purelib: false\n\
             Tag: {}\n",
            self.generator, self.version, self.tag
        )
    }
}

/// Contents of the `METADATA` record.
///
/// Only name, version, and license vary; the remaining descriptive fields
/// are fixed `UNKNOWN` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord<'a> {
    /// Distribution name.
    pub name: &'a str,
    /// Version of the packaged release.
    pub version: &'a str,
    /// SPDX license identifier.
    pub license: &'a str,
}

impl MetadataRecord<'_> {
    /// Render the record text, one `Key: value` line per field.
    pub fn render(&self) -> String {
        format!(
            "Metadata-Version: 2.0\n\
             Name: {}\n\
             Version: {}\n\
             Summary: UNKNOWN\n\
             Home-page: UNKNOWN\n\
             Author: UNKNOWN\n\
             Author-email: UNKNOWN\n\
             License: {}\n\
             Platform: UNKNOWN\n\
             \n\
             UNKNOWN\n",
            self.name, self.version, self.license
        )
    }
}
