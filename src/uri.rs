//! Schema identity URIs.
//!
//! [`SchemaUri`] wraps a [`url::Url`] and adds the fragment handling JSON
//! Schema needs: a fragment is either a JSON Pointer (`#/$defs/item`) or a
//! plain-name anchor (`#item`). Empty fragments are normalized away so that
//! `http://x/s.json` and `http://x/s.json#` are the same identity.

use std::fmt::{self, Display};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Serialize, Serializer};
use url::Url;

use crate::path::{JsonPointer, PathSegment};

/// Base URI given to documents that carry no `$id` of their own.
pub const DEFAULT_BASE_URI: &str = "json-schema:///";

const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// An absolute schema URI, optionally with a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaUri {
    url: Url,
}

impl SchemaUri {
    /// Parses an absolute URI.
    pub fn parse(uri: &str) -> Result<Self, url::ParseError> {
        Url::parse(uri).map(Self::from_url)
    }

    /// The base URI used for documents without an `$id`.
    pub fn default_base() -> Self {
        Self::parse(DEFAULT_BASE_URI).expect("DEFAULT_BASE_URI is a valid absolute URI")
    }

    /// Wraps a parsed URL, dropping an empty fragment.
    pub fn from_url(mut url: Url) -> Self {
        if url.fragment() == Some("") {
            url.set_fragment(None);
        }
        Self { url }
    }

    /// Resolves a (possibly relative) reference against this URI.
    pub fn resolve(&self, reference: &str) -> Result<Self, url::ParseError> {
        self.url.join(reference).map(Self::from_url)
    }

    /// Returns the underlying URL.
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// Returns the URI as a string.
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Returns this URI without its fragment.
    pub fn base(&self) -> SchemaUri {
        let mut url = self.url.clone();
        url.set_fragment(None);
        Self { url }
    }

    /// Returns the base (fragment-less) URI as a string key.
    pub fn base_key(&self) -> String {
        self.base().url.into()
    }

    /// Returns the percent-decoded fragment, or an empty string if absent.
    pub fn fragment(&self) -> String {
        self.url
            .fragment()
            .map(|f| percent_decode_str(f).decode_utf8_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Returns true if the fragment is absent or a JSON Pointer.
    pub fn has_pointer_fragment(&self) -> bool {
        let fragment = self.fragment();
        fragment.is_empty() || fragment.starts_with('/')
    }

    /// Returns true if the fragment is a plain-name anchor.
    pub fn has_plain_name_fragment(&self) -> bool {
        !self.has_pointer_fragment()
    }

    /// Returns the fragment parsed as a JSON Pointer, if it is one.
    pub fn pointer(&self) -> Option<JsonPointer> {
        if self.has_plain_name_fragment() {
            return None;
        }
        JsonPointer::parse(&self.fragment())
    }

    /// Returns a copy with the fragment replaced by `fragment` (unencoded).
    pub fn with_fragment(&self, fragment: &str) -> SchemaUri {
        let mut url = self.url.clone();
        if fragment.is_empty() {
            url.set_fragment(None);
        } else {
            let encoded = utf8_percent_encode(fragment, FRAGMENT).to_string();
            url.set_fragment(Some(&encoded));
        }
        Self { url }
    }

    /// Returns a copy with the JSON Pointer fragment replaced by `pointer`.
    pub fn with_pointer(&self, pointer: &JsonPointer) -> SchemaUri {
        self.with_fragment(&pointer.to_string())
    }

    /// Appends a segment to the JSON Pointer fragment.
    ///
    /// Plain-name fragments have no structural children; they are returned
    /// unchanged.
    pub fn append(&self, segment: &PathSegment) -> SchemaUri {
        match self.pointer() {
            Some(pointer) => {
                let extended = match segment {
                    PathSegment::Field(name) => pointer.push_field(name.clone()),
                    PathSegment::Index(idx) => pointer.push_index(*idx),
                };
                self.with_pointer(&extended)
            }
            None => self.clone(),
        }
    }

    /// Appends a keyword name to the JSON Pointer fragment.
    pub fn append_keyword(&self, keyword: &str) -> SchemaUri {
        self.append(&PathSegment::field(keyword))
    }
}

impl Display for SchemaUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl Serialize for SchemaUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.url.as_str())
    }
}
