//! Schema dialects and their keyword tables.
//!
//! Each dialect maps keyword names to constructor functions. Differences
//! between drafts are expressed as different table entries: draft-04's
//! boolean `exclusiveMinimum` is a flag read by its `minimum` constructor,
//! while later drafts register `exclusiveMinimum` as a keyword of its own.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::compiler::context::CompilationContext;
use crate::compiler::factory::SchemaFactory;
use crate::error::SchemaError;
use crate::schema::{array, combinators, generic, numeric, object, ref_schema, string};
use crate::schema::KeywordValidator;

/// A JSON Schema draft.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Draft {
    /// Draft-04.
    #[serde(rename = "draft4")]
    Draft4,
    /// Draft-07 (also used for draft-06 documents).
    #[serde(rename = "draft7")]
    Draft7,
    /// 2019-09.
    #[serde(rename = "2019-09")]
    Draft201909,
    /// 2020-12.
    #[default]
    #[serde(rename = "2020-12")]
    Draft202012,
}

impl Draft {
    /// Recognizes a `$schema` meta-schema URI.
    ///
    /// ```rust
    /// use schemawalk::Draft;
    ///
    /// assert_eq!(
    ///     Draft::from_schema_uri("http://json-schema.org/draft-04/schema#"),
    ///     Some(Draft::Draft4)
    /// );
    /// assert_eq!(
    ///     Draft::from_schema_uri("https://json-schema.org/draft/2020-12/schema"),
    ///     Some(Draft::Draft202012)
    /// );
    /// assert_eq!(Draft::from_schema_uri("http://example.com/meta"), None);
    /// ```
    pub fn from_schema_uri(uri: &str) -> Option<Draft> {
        let trimmed = uri.trim_end_matches('#');
        let path = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))?;
        match path {
            "json-schema.org/draft-04/schema" => Some(Draft::Draft4),
            "json-schema.org/draft-06/schema" | "json-schema.org/draft-07/schema" => {
                Some(Draft::Draft7)
            }
            "json-schema.org/draft/2019-09/schema" => Some(Draft::Draft201909),
            "json-schema.org/draft/2020-12/schema" => Some(Draft::Draft202012),
            _ => None,
        }
    }

    /// The canonical meta-schema URI.
    pub fn schema_uri(self) -> &'static str {
        match self {
            Draft::Draft4 => "http://json-schema.org/draft-04/schema#",
            Draft::Draft7 => "http://json-schema.org/draft-07/schema#",
            Draft::Draft201909 => "https://json-schema.org/draft/2019-09/schema",
            Draft::Draft202012 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    /// The keyword that declares a schema's identity.
    pub fn id_keyword(self) -> &'static str {
        match self {
            Draft::Draft4 => "id",
            _ => "$id",
        }
    }

    pub(crate) fn ref_overrides_siblings(self) -> bool {
        self <= Draft::Draft7
    }

    pub(crate) fn supports_anchors(self) -> bool {
        self >= Draft::Draft201909
    }

    pub(crate) fn supports_unevaluated(self) -> bool {
        self >= Draft::Draft201909
    }

    pub(crate) fn keyword_table(self) -> KeywordTable {
        match self {
            Draft::Draft4 => draft4_table(),
            Draft::Draft7 => draft7_table(),
            Draft::Draft201909 => draft201909_table(),
            Draft::Draft202012 => draft202012_table(),
        }
    }
}

/// The result of compiling one keyword; `None` when the keyword adds no check.
pub(crate) type KeywordResult = Result<Option<Box<dyn KeywordValidator>>, SchemaError>;

/// Builds a validator from the keyword's value and its sibling keywords.
pub(crate) type KeywordCtor =
    fn(&mut SchemaFactory, &CompilationContext, &Map<String, Value>, &Value) -> KeywordResult;

pub(crate) type KeywordTable = HashMap<&'static str, KeywordCtor>;

/// Keywords handled by a sibling's constructor.
fn consumed_by_sibling(
    _factory: &mut SchemaFactory,
    _ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    _value: &Value,
) -> KeywordResult {
    Ok(None)
}

fn common_table() -> KeywordTable {
    let mut table: KeywordTable = HashMap::new();
    table.insert("type", generic::compile_type);
    table.insert("enum", generic::compile_enum);
    table.insert("multipleOf", numeric::compile_multiple_of);
    table.insert("maximum", numeric::compile_maximum);
    table.insert("minimum", numeric::compile_minimum);
    table.insert("exclusiveMaximum", numeric::compile_exclusive_maximum);
    table.insert("exclusiveMinimum", numeric::compile_exclusive_minimum);
    table.insert("maxLength", string::compile_max_length);
    table.insert("minLength", string::compile_min_length);
    table.insert("pattern", string::compile_pattern);
    table.insert("format", string::compile_format);
    table.insert("items", array::compile_items);
    table.insert("additionalItems", consumed_by_sibling);
    table.insert("maxItems", array::compile_max_items);
    table.insert("minItems", array::compile_min_items);
    table.insert("uniqueItems", array::compile_unique_items);
    table.insert("maxProperties", object::compile_max_properties);
    table.insert("minProperties", object::compile_min_properties);
    table.insert("required", object::compile_required);
    table.insert("properties", object::compile_properties);
    table.insert("patternProperties", object::compile_pattern_properties);
    table.insert("additionalProperties", object::compile_additional_properties);
    table.insert("dependencies", object::compile_dependencies);
    table.insert("allOf", combinators::compile_all_of);
    table.insert("anyOf", combinators::compile_any_of);
    table.insert("oneOf", combinators::compile_one_of);
    table.insert("not", combinators::compile_not);
    table.insert("$ref", ref_schema::compile_ref);
    table
}

fn draft4_table() -> KeywordTable {
    let mut table = common_table();
    table.insert("type", generic::compile_type_draft4);
    table.insert("maximum", numeric::compile_maximum_draft4);
    table.insert("minimum", numeric::compile_minimum_draft4);
    table.insert("exclusiveMaximum", consumed_by_sibling);
    table.insert("exclusiveMinimum", consumed_by_sibling);
    table
}

fn draft7_table() -> KeywordTable {
    let mut table = common_table();
    table.insert("const", generic::compile_const);
    table.insert("contains", array::compile_contains);
    table.insert("propertyNames", object::compile_property_names);
    table.insert("if", combinators::compile_if);
    table.insert("then", combinators::compile_then);
    table.insert("else", combinators::compile_else);
    table
}

fn draft201909_table() -> KeywordTable {
    let mut table = draft7_table();
    table.remove("dependencies");
    table.insert("dependentRequired", object::compile_dependent_required);
    table.insert("dependentSchemas", object::compile_dependent_schemas);
    table.insert("contains", array::compile_contains_counted);
    table.insert("minContains", consumed_by_sibling);
    table.insert("maxContains", consumed_by_sibling);
    table.insert("$recursiveRef", ref_schema::compile_recursive_ref);
    table
}

fn draft202012_table() -> KeywordTable {
    let mut table = draft201909_table();
    table.remove("$recursiveRef");
    table.remove("additionalItems");
    table.insert("prefixItems", array::compile_prefix_items);
    table.insert("items", array::compile_items_after_prefix);
    table.insert("contains", array::compile_contains_claiming);
    table.insert("$dynamicRef", ref_schema::compile_dynamic_ref);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_schema_uri_variants() {
        assert_eq!(
            Draft::from_schema_uri("http://json-schema.org/draft-06/schema#"),
            Some(Draft::Draft7)
        );
        assert_eq!(
            Draft::from_schema_uri("https://json-schema.org/draft-07/schema"),
            Some(Draft::Draft7)
        );
        assert_eq!(
            Draft::from_schema_uri("https://json-schema.org/draft/2019-09/schema"),
            Some(Draft::Draft201909)
        );
        assert_eq!(Draft::from_schema_uri("draft-07"), None);
    }

    #[test]
    fn test_schema_uri_round_trips() {
        for draft in [
            Draft::Draft4,
            Draft::Draft7,
            Draft::Draft201909,
            Draft::Draft202012,
        ] {
            assert_eq!(Draft::from_schema_uri(draft.schema_uri()), Some(draft));
        }
    }

    #[test]
    fn test_tables_differ_only_where_drafts_do() {
        let draft4 = Draft::Draft4.keyword_table();
        let draft7 = Draft::Draft7.keyword_table();
        let draft2019 = Draft::Draft201909.keyword_table();
        let draft2020 = Draft::Draft202012.keyword_table();

        assert!(!draft4.contains_key("const"));
        assert!(draft7.contains_key("const"));
        assert!(draft7.contains_key("dependencies"));
        assert!(!draft2019.contains_key("dependencies"));
        assert!(draft2019.contains_key("$recursiveRef"));
        assert!(!draft2020.contains_key("$recursiveRef"));
        assert!(draft2020.contains_key("$dynamicRef"));
        assert!(draft2020.contains_key("prefixItems"));
        assert!(!draft2020.contains_key("additionalItems"));
    }

    #[test]
    fn test_serde_names() {
        let draft: Draft = serde_json::from_str("\"2019-09\"").unwrap();
        assert_eq!(draft, Draft::Draft201909);
        assert_eq!(serde_json::to_string(&Draft::Draft4).unwrap(), "\"draft4\"");
        assert_eq!(Draft::default(), Draft::Draft202012);
    }
}
