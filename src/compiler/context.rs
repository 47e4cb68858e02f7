//! Per-subschema compilation context.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::compiler::Draft;
use crate::error::SchemaError;
use crate::schema::KeywordMeta;
use crate::uri::SchemaUri;

/// `errorMessage` overrides in effect for one schema object.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct CustomMessages {
    schema: Option<String>,
    keywords: HashMap<String, String>,
}

impl CustomMessages {
    /// Reads a string (whole schema) or an object of per-keyword strings.
    fn from_value(value: &Value) -> Self {
        match value {
            Value::String(message) => Self {
                schema: Some(message.clone()),
                keywords: HashMap::new(),
            },
            Value::Object(map) => Self {
                schema: None,
                keywords: map
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|m| (k.clone(), m.to_string())))
                    .collect(),
            },
            _ => Self::default(),
        }
    }

    /// Child overrides win over inherited ones.
    fn merged_with(&self, child: CustomMessages) -> Self {
        let mut keywords = self.keywords.clone();
        keywords.extend(child.keywords);
        Self {
            schema: child.schema.or_else(|| self.schema.clone()),
            keywords,
        }
    }

    pub(crate) fn message_for(&self, keyword: &str) -> Option<String> {
        self.keywords
            .get(keyword)
            .or(self.schema.as_ref())
            .cloned()
    }
}

/// Identity and inherited settings of the subschema being compiled.
///
/// A context holds every URI the subschema is reachable under: the
/// JSON-Pointer locations inherited from each enclosing resource, the
/// subschema's own `$id`, and any anchors it declares.
#[derive(Debug, Clone)]
pub(crate) struct CompilationContext {
    uris: Vec<SchemaUri>,
    id: Option<SchemaUri>,
    base: SchemaUri,
    draft: Draft,
    messages: CustomMessages,
    custom_messages_enabled: bool,
}

impl CompilationContext {
    /// Seed for a whole document; the node compiled from it is a resource.
    pub(crate) fn document(base: SchemaUri, draft: Draft, custom_messages_enabled: bool) -> Self {
        Self {
            uris: vec![base.clone()],
            id: Some(base.clone()),
            base,
            draft,
            messages: CustomMessages::default(),
            custom_messages_enabled,
        }
    }

    /// Seed for a subtree found at `uri` inside an already known document.
    pub(crate) fn fragment(uri: SchemaUri, draft: Draft) -> Self {
        Self {
            base: uri.base(),
            uris: vec![uri],
            id: None,
            draft,
            messages: CustomMessages::default(),
            custom_messages_enabled: false,
        }
    }

    /// Derives the context of `schema`, found under `keys` relative to this one.
    ///
    /// With no keys the derived context keeps this context's identity, which
    /// is how a document root becomes a resource.
    pub(crate) fn derive(&self, schema: &Value, keys: &[&str]) -> Result<Self, SchemaError> {
        let uris = self
            .uris
            .iter()
            .filter(|uri| uri.has_pointer_fragment())
            .map(|uri| keys.iter().fold(uri.clone(), |acc, key| acc.append_keyword(key)))
            .collect();
        let mut ctx = Self {
            uris,
            id: if keys.is_empty() { self.id.clone() } else { None },
            base: self.base.clone(),
            draft: self.draft,
            messages: self.messages.clone(),
            custom_messages_enabled: self.custom_messages_enabled,
        };

        let Value::Object(map) = schema else {
            return Ok(ctx);
        };

        if let Some(Value::String(dialect)) = map.get("$schema") {
            if keys.is_empty() || map.contains_key(ctx.draft.id_keyword()) {
                let draft = Draft::from_schema_uri(dialect)
                    .ok_or_else(|| SchemaError::UnknownDialect(dialect.clone()))?;
                if draft != ctx.draft {
                    debug!(dialect = ?draft, location = %ctx.location(), "switching dialect");
                }
                ctx.draft = draft;
            }
        }

        // draft-04 and draft-07 ignore every sibling of `$ref`, `$id` included
        let declared_id = if ctx.draft.ref_overrides_siblings() && map.contains_key("$ref") {
            None
        } else {
            map.get(ctx.draft.id_keyword()).and_then(Value::as_str)
        };
        if let Some(raw) = declared_id {
            let resolved = self.base.resolve(raw).map_err(|source| SchemaError::InvalidUri {
                uri: raw.to_string(),
                source,
            })?;
            let base = resolved.base();
            if base != self.base || !resolved.has_plain_name_fragment() {
                ctx.base = base.clone();
                ctx.uris.push(base.clone());
                ctx.id = Some(base);
            }
            if resolved.has_plain_name_fragment() {
                ctx.uris.push(resolved);
            }
        }

        if ctx.draft.supports_anchors() {
            for keyword in ["$anchor", "$dynamicAnchor"] {
                if let Some(Value::String(name)) = map.get(keyword) {
                    if keyword == "$dynamicAnchor" && ctx.draft != Draft::Draft202012 {
                        continue;
                    }
                    ctx.uris.push(ctx.base.with_fragment(name));
                }
            }
        }

        if ctx.custom_messages_enabled {
            if let Some(value) = map.get("errorMessage") {
                ctx.messages = ctx.messages.merged_with(CustomMessages::from_value(value));
            }
        }

        Ok(ctx)
    }

    /// Every URI this subschema is registered under.
    pub(crate) fn uris(&self) -> &[SchemaUri] {
        &self.uris
    }

    /// The resource identity, when this subschema starts a resource.
    pub(crate) fn id(&self) -> Option<&SchemaUri> {
        self.id.as_ref()
    }

    /// Base URI that references inside this subschema resolve against.
    pub(crate) fn base(&self) -> &SchemaUri {
        &self.base
    }

    pub(crate) fn draft(&self) -> Draft {
        self.draft
    }

    /// Canonical location: the innermost JSON-Pointer URI.
    pub(crate) fn location(&self) -> &SchemaUri {
        self.uris
            .iter()
            .rev()
            .find(|uri| uri.has_pointer_fragment())
            .unwrap_or(&self.base)
    }

    pub(crate) fn keyword_location(&self, keyword: &str) -> SchemaUri {
        self.location().append_keyword(keyword)
    }

    /// Identity for a keyword validator compiled in this context.
    pub(crate) fn meta(&self, keyword: &'static str) -> KeywordMeta {
        KeywordMeta::new(
            keyword,
            self.keyword_location(keyword),
            self.messages.message_for(keyword),
        )
    }
}
