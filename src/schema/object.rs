//! Object keywords.
//!
//! `properties`, `patternProperties` and `additionalProperties` compose: when
//! `additionalProperties` is present it owns the other two and runs them
//! first, so it knows which members they matched. Otherwise each is an
//! independent keyword.
//!
//! `properties` also carries default values: an absent property whose schema
//! declares `default` produces an "add" operation in the patch.

use regex::Regex;
use serde_json::{Map, Value};

use crate::compiler::{CompilationContext, KeywordResult, SchemaFactory};
use crate::error::{ErrorReporter, SchemaError};
use crate::patch::Patch;
use crate::path::JsonPointer;
use crate::schema::string::compile_regex;
use crate::schema::{
    compile_schema_map, compile_subschema, non_negative_integer, string_array, KeywordMeta,
    KeywordValidator, NodeId,
};
use crate::validation::{EvalContext, EvaluationResults, Outcome, WalkResult};
use crate::walk::{SchemaVisitor, WalkEvent};

struct PropertiesValidator {
    meta: KeywordMeta,
    properties: Vec<(String, NodeId)>,
    defaults: Vec<(String, NodeId, Value)>,
    always_succeeds: bool,
}

impl PropertiesValidator {
    fn compile(
        factory: &mut SchemaFactory,
        ctx: &CompilationContext,
        value: &Value,
    ) -> Result<Self, SchemaError> {
        let properties = compile_schema_map(factory, ctx, "properties", value)?;
        let defaults: Vec<_> = properties
            .iter()
            .filter_map(|(name, id)| {
                factory
                    .node(*id)
                    .default_value()
                    .map(|default| (name.clone(), *id, default.clone()))
            })
            .collect();
        let always_succeeds = defaults.is_empty()
            && properties
                .iter()
                .all(|(_, id)| factory.node(*id).always_succeeds());
        Ok(Self {
            meta: ctx.meta("properties"),
            properties,
            defaults,
            always_succeeds,
        })
    }

    fn declares(&self, name: &str) -> bool {
        self.properties.iter().any(|(declared, _)| declared == name)
    }
}

impl KeywordValidator for PropertiesValidator {
    fn meta(&self) -> &KeywordMeta {
        &self.meta
    }

    fn validate(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        results: &mut EvaluationResults,
        reporter: &mut dyn ErrorReporter,
        patch: &mut Patch,
    ) -> Outcome {
        let Value::Object(members) = instance else {
            return Outcome::Valid;
        };
        let claim = ctx.requires_evaluated_properties();
        if self.always_succeeds && !claim {
            return Outcome::Valid;
        }

        let keyword_ctx = ctx.member("properties").without_evaluation();
        let mut outcome = Outcome::Valid;
        for (name, node) in &self.properties {
            let Some(member) = members.get(name) else {
                continue;
            };
            if claim {
                results.claim_property(name);
            }
            let step = keyword_ctx.member(name).evaluate(
                *node,
                member,
                &location.push_field(name),
                &mut EvaluationResults::default(),
                reporter,
                patch,
            );
            outcome = outcome.and(step);
            if outcome == Outcome::Abort {
                return Outcome::Abort;
            }
        }

        for (name, _, default) in &self.defaults {
            if !members.contains_key(name) {
                patch.add(location.push_field(name), default.clone());
            }
        }
        outcome
    }

    fn walk(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        visitor: &mut dyn SchemaVisitor,
    ) -> WalkResult {
        if visitor.visit(&self.meta.event(ctx, instance, location)) == WalkResult::Abort {
            return WalkResult::Abort;
        }
        let Value::Object(members) = instance else {
            return WalkResult::Advance;
        };
        let keyword_ctx = ctx.member("properties");
        for (name, node) in &self.properties {
            let Some(member) = members.get(name) else {
                continue;
            };
            let step = keyword_ctx
                .member(name)
                .walk_node(*node, member, &location.push_field(name), visitor);
            if step == WalkResult::Abort {
                return WalkResult::Abort;
            }
        }
        for (name, node, default) in &self.defaults {
            if members.contains_key(name) {
                continue;
            }
            let event = WalkEvent {
                keyword: "default",
                schema_location: ctx.arena().node(*node).location(),
                evaluation_path: keyword_ctx.member(name).eval_path().push_field("default"),
                instance_location: location.push_field(name),
                instance: None,
                default_value: Some(default),
            };
            if visitor.visit(&event) == WalkResult::Abort {
                return WalkResult::Abort;
            }
        }
        WalkResult::Advance
    }

    fn always_succeeds(&self) -> bool {
        self.always_succeeds
    }
}

pub(crate) fn compile_properties(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    if schema.contains_key("additionalProperties") {
        return Ok(None);
    }
    Ok(Some(Box::new(PropertiesValidator::compile(factory, ctx, value)?)))
}

struct PatternPropertiesValidator {
    meta: KeywordMeta,
    patterns: Vec<(Regex, NodeId)>,
    always_succeeds: bool,
}

impl PatternPropertiesValidator {
    fn compile(
        factory: &mut SchemaFactory,
        ctx: &CompilationContext,
        value: &Value,
    ) -> Result<Self, SchemaError> {
        let patterns = compile_schema_map(factory, ctx, "patternProperties", value)?
            .into_iter()
            .map(|(pattern, id)| -> Result<_, SchemaError> {
                Ok((compile_regex(ctx, "patternProperties", &pattern)?, id))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let always_succeeds = patterns
            .iter()
            .all(|(_, id)| factory.node(*id).always_succeeds());
        Ok(Self {
            meta: ctx.meta("patternProperties"),
            patterns,
            always_succeeds,
        })
    }

    fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|(regex, _)| regex.is_match(name))
    }
}

impl KeywordValidator for PatternPropertiesValidator {
    fn meta(&self) -> &KeywordMeta {
        &self.meta
    }

    fn validate(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        results: &mut EvaluationResults,
        reporter: &mut dyn ErrorReporter,
        patch: &mut Patch,
    ) -> Outcome {
        let Value::Object(members) = instance else {
            return Outcome::Valid;
        };
        let claim = ctx.requires_evaluated_properties();
        if self.always_succeeds && !claim {
            return Outcome::Valid;
        }

        let keyword_ctx = ctx.member("patternProperties").without_evaluation();
        let mut outcome = Outcome::Valid;
        for (name, member) in members {
            for (regex, node) in &self.patterns {
                if !regex.is_match(name) {
                    continue;
                }
                if claim {
                    results.claim_property(name);
                }
                let step = keyword_ctx.member(regex.as_str()).evaluate(
                    *node,
                    member,
                    &location.push_field(name),
                    &mut EvaluationResults::default(),
                    reporter,
                    patch,
                );
                outcome = outcome.and(step);
                if outcome == Outcome::Abort {
                    return Outcome::Abort;
                }
            }
        }
        outcome
    }

    fn walk(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        visitor: &mut dyn SchemaVisitor,
    ) -> WalkResult {
        if visitor.visit(&self.meta.event(ctx, instance, location)) == WalkResult::Abort {
            return WalkResult::Abort;
        }
        let Value::Object(members) = instance else {
            return WalkResult::Advance;
        };
        let keyword_ctx = ctx.member("patternProperties");
        for (name, member) in members {
            for (regex, node) in &self.patterns {
                if !regex.is_match(name) {
                    continue;
                }
                let step = keyword_ctx.member(regex.as_str()).walk_node(
                    *node,
                    member,
                    &location.push_field(name),
                    visitor,
                );
                if step == WalkResult::Abort {
                    return WalkResult::Abort;
                }
            }
        }
        WalkResult::Advance
    }

    fn always_succeeds(&self) -> bool {
        self.always_succeeds
    }
}

pub(crate) fn compile_pattern_properties(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    if schema.contains_key("additionalProperties") {
        return Ok(None);
    }
    Ok(Some(Box::new(PatternPropertiesValidator::compile(
        factory, ctx, value,
    )?)))
}

struct AdditionalPropertiesValidator {
    meta: KeywordMeta,
    properties: Option<PropertiesValidator>,
    pattern_properties: Option<PatternPropertiesValidator>,
    node: NodeId,
    always_fails: bool,
    always_succeeds: bool,
}

impl AdditionalPropertiesValidator {
    fn is_additional(&self, name: &str) -> bool {
        !self
            .properties
            .as_ref()
            .is_some_and(|properties| properties.declares(name))
            && !self
                .pattern_properties
                .as_ref()
                .is_some_and(|patterns| patterns.matches(name))
    }
}

impl KeywordValidator for AdditionalPropertiesValidator {
    fn meta(&self) -> &KeywordMeta {
        &self.meta
    }

    fn validate(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        results: &mut EvaluationResults,
        reporter: &mut dyn ErrorReporter,
        patch: &mut Patch,
    ) -> Outcome {
        let Value::Object(members) = instance else {
            return Outcome::Valid;
        };
        let claim = ctx.requires_evaluated_properties();
        if self.always_succeeds && !claim {
            return Outcome::Valid;
        }

        let mut outcome = Outcome::Valid;
        if let Some(properties) = &self.properties {
            outcome = properties.validate(ctx, instance, location, results, reporter, patch);
            if outcome == Outcome::Abort {
                return Outcome::Abort;
            }
        }
        if let Some(patterns) = &self.pattern_properties {
            let step = patterns.validate(ctx, instance, location, results, reporter, patch);
            outcome = outcome.and(step);
            if outcome == Outcome::Abort {
                return Outcome::Abort;
            }
        }

        let keyword_ctx = ctx.member("additionalProperties").without_evaluation();
        for (name, member) in members {
            if !self.is_additional(name) {
                continue;
            }
            if claim {
                results.claim_property(name);
            }
            let member_location = location.push_field(name);
            let step = if self.always_fails {
                let text = format!("additional property '{}' is not allowed", name);
                self.meta.report(ctx, &member_location, text, reporter)
            } else {
                keyword_ctx.evaluate(
                    self.node,
                    member,
                    &member_location,
                    &mut EvaluationResults::default(),
                    reporter,
                    patch,
                )
            };
            outcome = outcome.and(step);
            if outcome == Outcome::Abort {
                return Outcome::Abort;
            }
        }
        outcome
    }

    fn walk(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        visitor: &mut dyn SchemaVisitor,
    ) -> WalkResult {
        if let Some(properties) = &self.properties {
            if properties.walk(ctx, instance, location, visitor) == WalkResult::Abort {
                return WalkResult::Abort;
            }
        }
        if let Some(patterns) = &self.pattern_properties {
            if patterns.walk(ctx, instance, location, visitor) == WalkResult::Abort {
                return WalkResult::Abort;
            }
        }
        if visitor.visit(&self.meta.event(ctx, instance, location)) == WalkResult::Abort {
            return WalkResult::Abort;
        }
        let Value::Object(members) = instance else {
            return WalkResult::Advance;
        };
        let keyword_ctx = ctx.member("additionalProperties");
        for (name, member) in members {
            if !self.is_additional(name) {
                continue;
            }
            let member_location = location.push_field(name);
            let step = keyword_ctx.walk_node(self.node, member, &member_location, visitor);
            if step == WalkResult::Abort {
                return WalkResult::Abort;
            }
        }
        WalkResult::Advance
    }

    fn always_succeeds(&self) -> bool {
        self.always_succeeds
    }
}

pub(crate) fn compile_additional_properties(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    let properties = match schema.get("properties") {
        Some(value) => Some(PropertiesValidator::compile(factory, ctx, value)?),
        None => None,
    };
    let pattern_properties = match schema.get("patternProperties") {
        Some(value) => Some(PatternPropertiesValidator::compile(factory, ctx, value)?),
        None => None,
    };
    let node = compile_subschema(factory, ctx, "additionalProperties", value)?;
    let always_succeeds = factory.node(node).always_succeeds()
        && properties.as_ref().map_or(true, |p| p.always_succeeds)
        && pattern_properties.as_ref().map_or(true, |p| p.always_succeeds);
    Ok(Some(Box::new(AdditionalPropertiesValidator {
        meta: ctx.meta("additionalProperties"),
        properties,
        pattern_properties,
        node,
        always_fails: factory.node(node).always_fails(),
        always_succeeds,
    })))
}

#[derive(Debug, Clone, Copy)]
enum CountBound {
    Max,
    Min,
}

struct PropertyCountValidator {
    meta: KeywordMeta,
    limit: u64,
    bound: CountBound,
}

impl KeywordValidator for PropertyCountValidator {
    fn meta(&self) -> &KeywordMeta {
        &self.meta
    }

    fn validate(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        _results: &mut EvaluationResults,
        reporter: &mut dyn ErrorReporter,
        _patch: &mut Patch,
    ) -> Outcome {
        let Value::Object(members) = instance else {
            return Outcome::Valid;
        };
        let len = members.len() as u64;
        match self.bound {
            CountBound::Max if len > self.limit => {
                let text = format!(
                    "object must have at most {} properties, got {}",
                    self.limit, len
                );
                self.meta.report(ctx, location, text, reporter)
            }
            CountBound::Min if len < self.limit => {
                let text = format!(
                    "object must have at least {} properties, got {}",
                    self.limit, len
                );
                self.meta.report(ctx, location, text, reporter)
            }
            _ => Outcome::Valid,
        }
    }

    fn always_succeeds(&self) -> bool {
        matches!(self.bound, CountBound::Min) && self.limit == 0
    }
}

pub(crate) fn compile_max_properties(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    Ok(Some(Box::new(PropertyCountValidator {
        meta: ctx.meta("maxProperties"),
        limit: non_negative_integer(ctx, "maxProperties", value)?,
        bound: CountBound::Max,
    })))
}

pub(crate) fn compile_min_properties(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    Ok(Some(Box::new(PropertyCountValidator {
        meta: ctx.meta("minProperties"),
        limit: non_negative_integer(ctx, "minProperties", value)?,
        bound: CountBound::Min,
    })))
}

struct RequiredValidator {
    meta: KeywordMeta,
    required: Vec<String>,
}

impl KeywordValidator for RequiredValidator {
    fn meta(&self) -> &KeywordMeta {
        &self.meta
    }

    fn validate(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        _results: &mut EvaluationResults,
        reporter: &mut dyn ErrorReporter,
        _patch: &mut Patch,
    ) -> Outcome {
        let Value::Object(members) = instance else {
            return Outcome::Valid;
        };
        let mut outcome = Outcome::Valid;
        for name in &self.required {
            if members.contains_key(name) {
                continue;
            }
            let text = format!("required property '{}' is missing", name);
            outcome = outcome.and(self.meta.report(ctx, location, text, reporter));
            if outcome == Outcome::Abort {
                return Outcome::Abort;
            }
        }
        outcome
    }

    fn always_succeeds(&self) -> bool {
        self.required.is_empty()
    }
}

pub(crate) fn compile_required(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    Ok(Some(Box::new(RequiredValidator {
        meta: ctx.meta("required"),
        required: string_array(ctx, "required", value)?,
    })))
}

/// `dependencies`, `dependentRequired` and `dependentSchemas`.
///
/// When the trigger property is present, its dependent property names must
/// also be present and its dependent schema applies to the whole object.
struct DependenciesValidator {
    meta: KeywordMeta,
    required: Vec<(String, Vec<String>)>,
    schemas: Vec<(String, NodeId)>,
}

impl KeywordValidator for DependenciesValidator {
    fn meta(&self) -> &KeywordMeta {
        &self.meta
    }

    fn validate(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        results: &mut EvaluationResults,
        reporter: &mut dyn ErrorReporter,
        patch: &mut Patch,
    ) -> Outcome {
        let Value::Object(members) = instance else {
            return Outcome::Valid;
        };
        let mut outcome = Outcome::Valid;
        for (trigger, dependents) in &self.required {
            if !members.contains_key(trigger) {
                continue;
            }
            for missing in dependents.iter().filter(|name| !members.contains_key(*name)) {
                let text = format!(
                    "property '{}' is required when '{}' is present",
                    missing, trigger
                );
                outcome = outcome.and(self.meta.report(ctx, location, text, reporter));
                if outcome == Outcome::Abort {
                    return Outcome::Abort;
                }
            }
        }

        let keyword_ctx = ctx.member(self.meta.keyword());
        for (trigger, node) in &self.schemas {
            if !members.contains_key(trigger) {
                continue;
            }
            let step = keyword_ctx
                .member(trigger)
                .evaluate(*node, instance, location, results, reporter, patch);
            outcome = outcome.and(step);
            if outcome == Outcome::Abort {
                return Outcome::Abort;
            }
        }
        outcome
    }

    fn walk(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        visitor: &mut dyn SchemaVisitor,
    ) -> WalkResult {
        if visitor.visit(&self.meta.event(ctx, instance, location)) == WalkResult::Abort {
            return WalkResult::Abort;
        }
        let Value::Object(members) = instance else {
            return WalkResult::Advance;
        };
        let keyword_ctx = ctx.member(self.meta.keyword());
        for (trigger, node) in &self.schemas {
            if !members.contains_key(trigger) {
                continue;
            }
            let step = keyword_ctx
                .member(trigger)
                .walk_node(*node, instance, location, visitor);
            if step == WalkResult::Abort {
                return WalkResult::Abort;
            }
        }
        WalkResult::Advance
    }
}

fn dependent_required_map(
    ctx: &CompilationContext,
    keyword: &'static str,
    value: &Value,
) -> Result<Vec<(String, Vec<String>)>, SchemaError> {
    let Value::Object(entries) = value else {
        return Err(SchemaError::invalid_keyword(
            ctx.location(),
            keyword,
            "an object of string arrays",
        ));
    };
    entries
        .iter()
        .map(|(name, names)| -> Result<_, SchemaError> {
            Ok((name.clone(), string_array(ctx, keyword, names)?))
        })
        .collect()
}

/// Draft-04/07 `dependencies`: each entry is a name array or a schema.
pub(crate) fn compile_dependencies(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    let Value::Object(entries) = value else {
        return Err(SchemaError::invalid_keyword(
            ctx.location(),
            "dependencies",
            "an object",
        ));
    };
    let mut required = Vec::new();
    let mut schemas = Vec::new();
    for (name, dependency) in entries {
        match dependency {
            Value::Array(_) => {
                required.push((name.clone(), string_array(ctx, "dependencies", dependency)?));
            }
            _ => {
                let node =
                    factory.make_schema_validator(ctx, dependency, &["dependencies", name])?;
                schemas.push((name.clone(), node));
            }
        }
    }
    Ok(Some(Box::new(DependenciesValidator {
        meta: ctx.meta("dependencies"),
        required,
        schemas,
    })))
}

pub(crate) fn compile_dependent_required(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    Ok(Some(Box::new(DependenciesValidator {
        meta: ctx.meta("dependentRequired"),
        required: dependent_required_map(ctx, "dependentRequired", value)?,
        schemas: Vec::new(),
    })))
}

pub(crate) fn compile_dependent_schemas(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    Ok(Some(Box::new(DependenciesValidator {
        meta: ctx.meta("dependentSchemas"),
        required: Vec::new(),
        schemas: compile_schema_map(factory, ctx, "dependentSchemas", value)?,
    })))
}

struct PropertyNamesValidator {
    meta: KeywordMeta,
    node: NodeId,
}

impl KeywordValidator for PropertyNamesValidator {
    fn meta(&self) -> &KeywordMeta {
        &self.meta
    }

    fn validate(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        _results: &mut EvaluationResults,
        reporter: &mut dyn ErrorReporter,
        patch: &mut Patch,
    ) -> Outcome {
        let Value::Object(members) = instance else {
            return Outcome::Valid;
        };
        let keyword_ctx = ctx.member("propertyNames").without_evaluation();
        let mut outcome = Outcome::Valid;
        for name in members.keys() {
            let step = keyword_ctx.evaluate(
                self.node,
                &Value::String(name.clone()),
                location,
                &mut EvaluationResults::default(),
                reporter,
                patch,
            );
            outcome = outcome.and(step);
            if outcome == Outcome::Abort {
                return Outcome::Abort;
            }
        }
        outcome
    }
}

pub(crate) fn compile_property_names(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    let node = compile_subschema(factory, ctx, "propertyNames", value)?;
    if factory.node(node).always_succeeds() {
        return Ok(None);
    }
    Ok(Some(Box::new(PropertyNamesValidator {
        meta: ctx.meta("propertyNames"),
        node,
    })))
}

/// `unevaluatedProperties`: applies to members no sibling keyword claimed.
struct UnevaluatedPropertiesValidator {
    meta: KeywordMeta,
    node: NodeId,
    always_fails: bool,
}

impl KeywordValidator for UnevaluatedPropertiesValidator {
    fn meta(&self) -> &KeywordMeta {
        &self.meta
    }

    fn validate(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        results: &mut EvaluationResults,
        reporter: &mut dyn ErrorReporter,
        patch: &mut Patch,
    ) -> Outcome {
        let Value::Object(members) = instance else {
            return Outcome::Valid;
        };
        let keyword_ctx = ctx.member("unevaluatedProperties").without_evaluation();
        let mut outcome = Outcome::Valid;
        for (name, member) in members {
            if results.is_property_evaluated(name) {
                continue;
            }
            let member_location = location.push_field(name);
            let step = if self.always_fails {
                let text = format!("unevaluated property '{}' is not allowed", name);
                self.meta.report(ctx, &member_location, text, reporter)
            } else {
                keyword_ctx.evaluate(
                    self.node,
                    member,
                    &member_location,
                    &mut EvaluationResults::default(),
                    reporter,
                    patch,
                )
            };
            results.claim_property(name);
            outcome = outcome.and(step);
            if outcome == Outcome::Abort {
                return Outcome::Abort;
            }
        }
        outcome
    }
}

pub(crate) fn compile_unevaluated_properties(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    value: &Value,
) -> Result<Box<dyn KeywordValidator>, SchemaError> {
    let node = compile_subschema(factory, ctx, "unevaluatedProperties", value)?;
    Ok(Box::new(UnevaluatedPropertiesValidator {
        meta: ctx.meta("unevaluatedProperties"),
        node,
        always_fails: factory.node(node).always_fails(),
    }))
}
