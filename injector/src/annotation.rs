//! Extraction of the last-applied-configuration annotation
//!
//! The admission envelope is treated as untrusted. The body is scanned as a
//! stream: sibling values before the annotation are skipped without being
//! typed, and scanning stops as soon as the annotation has been read, so
//! anything after it may be malformed or truncated.

use std::fmt;

use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde_json::value::RawValue;

use crate::{Error, Result};

/// Annotation kubectl uses to record the last applied configuration
pub const LAST_APPLIED_ANNOTATION: &str = "kubectl.kubernetes.io/last-applied-configuration";

const ANNOTATION_PATH: [&str; 5] = [
    "request",
    "object",
    "metadata",
    "annotations",
    LAST_APPLIED_ANNOTATION,
];

/// Returns the sanitized annotation fragment found in an admission request body
pub fn extract_annotation(body: &[u8]) -> Result<String> {
    let raw = lookup_raw(body)?;
    Ok(sanitize(raw))
}

/// Progress of a path scan
struct Lookup<'de> {
    /// Number of path segments matched so far
    matched: usize,
    found: Option<&'de RawValue>,
}

/// Walks one object level of the annotation path
struct PathSeed<'l, 'de> {
    lookup: &'l mut Lookup<'de>,
}

impl<'de> DeserializeSeed<'de> for PathSeed<'_, 'de> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for PathSeed<'_, 'de> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an object holding `{}`", ANNOTATION_PATH[self.lookup.matched])
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let segment = ANNOTATION_PATH[self.lookup.matched];

        while let Some(key) = map.next_key::<String>()? {
            if key != segment {
                map.next_value::<IgnoredAny>()?;
                continue;
            }

            self.lookup.matched += 1;
            if self.lookup.matched < ANNOTATION_PATH.len() {
                return map.next_value_seed(PathSeed {
                    lookup: self.lookup,
                });
            }

            // Abort the scan so the rest of the document is never parsed.
            self.lookup.found = Some(map.next_value()?);
            return Err(de::Error::custom("annotation found"));
        }

        Ok(())
    }
}

/// Resolves the annotation path and returns the string value exactly as it
/// appears in the document, escapes included.
fn lookup_raw(body: &[u8]) -> Result<&str> {
    let mut lookup = Lookup {
        matched: 0,
        found: None,
    };

    let mut deserializer = serde_json::Deserializer::from_slice(body);
    // Errors are expected here: a found annotation ends the scan with one.
    let _ = PathSeed {
        lookup: &mut lookup,
    }
    .deserialize(&mut deserializer);

    let Some(raw) = lookup.found else {
        return Err(Error::MissingField(ANNOTATION_PATH[lookup.matched]));
    };

    raw.get()
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or(Error::MissingField(LAST_APPLIED_ANNOTATION))
}

/// Turns an escaped JSON string into parseable JSON text
///
/// Drops literal `\n` sequences first, then every remaining backslash.
/// Applying it to already sanitized text is a no-op.
pub fn sanitize(raw: &str) -> String {
    raw.replace("\\n", "").replace('\\', "")
}
