//! Policy loading: a parsed document tree in, an immutable [`PolicyDocument`] out.
//!
//! Two input shapes are accepted:
//! - flat: `name`, `enforcementMode`, `rules[]` with `match.kinds`
//! - cluster policy: `metadata.name`, `spec.validationFailureAction`, `spec.rules[]`
//!   with `match.resources.kinds`

use crate::error::{ParseError, ParseErrorKind};
use crate::model::{
    EnforcementMode, ImageVerificationSpec, MatchSelector, PolicyDocument, Rule, RuleBody,
    ValidationSpec,
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Build a policy document from a parsed source. No evaluation happens here.
pub fn load(source: &Value) -> Result<PolicyDocument, ParseError> {
    let root = as_object(source, "<root>")?;

    let (name, name_field, body, prefix, mode_key) = if root.contains_key("rules") {
        let name = root.get("name");
        (name, "name".to_string(), root, String::new(), "enforcementMode")
    } else if let Some(spec) = root.get("spec") {
        let name = root.get("metadata").and_then(|m| m.get("name"));
        let spec = as_object(spec, "spec")?;
        (
            name,
            "metadata.name".to_string(),
            spec,
            "spec.".to_string(),
            "validationFailureAction",
        )
    } else {
        return Err(ParseError::new(ParseErrorKind::MissingField, "rules"));
    };

    let name = required_str(name, &name_field)?;

    let mode_field = format!("{prefix}{mode_key}");
    // Flat documents may also carry the cluster-policy key, and vice versa.
    let mode_value = body
        .get(mode_key)
        .or_else(|| body.get("enforcementMode"))
        .or_else(|| body.get("validationFailureAction"));
    let mode = parse_mode(mode_value, &mode_field)?;

    let rules_field = format!("{prefix}rules");
    let Some(rules) = body.get("rules") else {
        return Err(ParseError::new(ParseErrorKind::MissingField, rules_field));
    };
    let Some(rules) = rules.as_array() else {
        return Err(ParseError::new(ParseErrorKind::InvalidType, rules_field));
    };
    if rules.is_empty() {
        return Err(ParseError::new(ParseErrorKind::EmptyRuleSet, rules_field));
    }

    let mut seen = BTreeSet::new();
    let mut parsed = Vec::with_capacity(rules.len());
    for (idx, raw) in rules.iter().enumerate() {
        let field = format!("{rules_field}[{idx}]");
        let rule = parse_rule(raw, &field)?;
        if !seen.insert(rule.name.clone()) {
            return Err(ParseError::new(
                ParseErrorKind::DuplicateName,
                format!("{field}.name"),
            ));
        }
        parsed.push(rule);
    }

    Ok(PolicyDocument {
        name: name.to_string(),
        mode,
        rules: parsed,
    })
}

/// Load several policies, keeping their order. Policy names must be unique.
pub fn load_policy_set(sources: &[Value]) -> Result<Vec<PolicyDocument>, ParseError> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(sources.len());
    for (idx, source) in sources.iter().enumerate() {
        let policy = load(source).map_err(|e| ParseError {
            kind: e.kind,
            field: format!("[{idx}].{}", e.field),
        })?;
        if !seen.insert(policy.name.clone()) {
            return Err(ParseError::new(
                ParseErrorKind::DuplicateName,
                format!("[{idx}].name"),
            ));
        }
        out.push(policy);
    }
    Ok(out)
}

/// Parse an enforcement mode string. Case-insensitive; absent means audit.
pub fn parse_mode(value: Option<&Value>, field: &str) -> Result<EnforcementMode, ParseError> {
    let Some(value) = value else {
        return Ok(EnforcementMode::Audit);
    };
    let Some(s) = value.as_str() else {
        return Err(ParseError::new(ParseErrorKind::InvalidType, field));
    };
    match s.trim().to_ascii_lowercase().as_str() {
        "enforce" => Ok(EnforcementMode::Enforce),
        "audit" => Ok(EnforcementMode::Audit),
        _ => Err(ParseError::new(ParseErrorKind::InvalidEnforcementMode, field)),
    }
}

fn parse_rule(raw: &Value, field: &str) -> Result<Rule, ParseError> {
    let obj = as_object(raw, field)?;
    let name = required_str(obj.get("name"), &format!("{field}.name"))?;
    let selector = parse_selector(obj.get("match"), &format!("{field}.match"))?;

    let validate = obj.get("validate");
    let verify = obj.get("verifyImages");
    let body = match (validate, verify) {
        (Some(_), Some(_)) => {
            return Err(ParseError::new(ParseErrorKind::AmbiguousRuleBody, field));
        }
        (Some(v), None) => RuleBody::Validation(parse_validation(v, &format!("{field}.validate"))?),
        (None, Some(v)) => {
            RuleBody::ImageVerification(parse_verify_images(v, &format!("{field}.verifyImages"))?)
        }
        (None, None) => {
            return Err(ParseError::new(
                ParseErrorKind::MissingField,
                format!("{field}.validate"),
            ));
        }
    };

    Ok(Rule {
        name: name.to_string(),
        selector,
        body,
    })
}

fn parse_selector(raw: Option<&Value>, field: &str) -> Result<MatchSelector, ParseError> {
    let Some(raw) = raw else {
        return Err(ParseError::new(ParseErrorKind::MissingField, field));
    };
    let obj = as_object(raw, field)?;

    // `match.resources` wraps the selector in the cluster-policy shape.
    let (sel, field) = match obj.get("resources") {
        Some(res) => {
            let f = format!("{field}.resources");
            (as_object(res, &f)?, f)
        }
        None => (obj, field.to_string()),
    };

    let kinds_field = format!("{field}.kinds");
    let kinds = string_list(sel.get("kinds"), &kinds_field)?
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingField, kinds_field.clone()))?;
    if kinds.is_empty() {
        return Err(ParseError::new(ParseErrorKind::MissingField, kinds_field));
    }

    let namespaces =
        string_list(sel.get("namespaces"), &format!("{field}.namespaces"))?.unwrap_or_default();

    let labels_value = sel
        .get("labels")
        .or_else(|| sel.get("selector").and_then(|s| s.get("matchLabels")));
    let labels = string_map(labels_value, &format!("{field}.labels"))?;

    Ok(MatchSelector {
        kinds,
        namespaces,
        labels,
    })
}

fn parse_validation(raw: &Value, field: &str) -> Result<ValidationSpec, ParseError> {
    let obj = as_object(raw, field)?;
    let Some(pattern) = obj.get("pattern") else {
        return Err(ParseError::new(
            ParseErrorKind::MissingField,
            format!("{field}.pattern"),
        ));
    };
    let message = match obj.get("message") {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(ParseError::new(
                ParseErrorKind::InvalidType,
                format!("{field}.message"),
            ));
        }
    };
    Ok(ValidationSpec {
        pattern: pattern.clone(),
        message,
    })
}

fn parse_verify_images(raw: &Value, field: &str) -> Result<Vec<ImageVerificationSpec>, ParseError> {
    let Some(entries) = raw.as_array() else {
        return Err(ParseError::new(ParseErrorKind::InvalidType, field));
    };
    if entries.is_empty() {
        return Err(ParseError::new(ParseErrorKind::MissingField, field));
    }

    let mut out = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        let entry_field = format!("{field}[{idx}]");
        let obj = as_object(entry, &entry_field)?;
        let key = required_str(obj.get("key"), &format!("{entry_field}.key"))?;

        // `image` holds one glob; `imageReferences` holds several.
        let globs = match (obj.get("image"), obj.get("imageReferences")) {
            (Some(image), _) => {
                vec![required_str(Some(image), &format!("{entry_field}.image"))?.to_string()]
            }
            (None, Some(refs)) => {
                let refs_field = format!("{entry_field}.imageReferences");
                let refs = string_list(Some(refs), &refs_field)?.unwrap_or_default();
                if refs.is_empty() {
                    return Err(ParseError::new(ParseErrorKind::MissingField, refs_field));
                }
                refs
            }
            (None, None) => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingField,
                    format!("{entry_field}.image"),
                ));
            }
        };

        out.extend(globs.into_iter().map(|image| ImageVerificationSpec {
            image,
            key: key.to_string(),
        }));
    }
    Ok(out)
}

fn as_object<'a>(value: &'a Value, field: &str) -> Result<&'a Map<String, Value>, ParseError> {
    value
        .as_object()
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidType, field))
}

fn required_str<'a>(value: Option<&'a Value>, field: &str) -> Result<&'a str, ParseError> {
    match value {
        None | Some(Value::Null) => Err(ParseError::new(ParseErrorKind::MissingField, field)),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(ParseError::new(ParseErrorKind::MissingField, field))
        }
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ParseError::new(ParseErrorKind::InvalidType, field)),
    }
}

fn string_list(value: Option<&Value>, field: &str) -> Result<Option<Vec<String>>, ParseError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let Some(items) = value.as_array() else {
        return Err(ParseError::new(ParseErrorKind::InvalidType, field));
    };
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidType, format!("{field}[{idx}]")))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn string_map(value: Option<&Value>, field: &str) -> Result<BTreeMap<String, String>, ParseError> {
    let Some(value) = value else {
        return Ok(BTreeMap::new());
    };
    let obj = as_object(value, field)?;
    let mut out = BTreeMap::new();
    for (k, v) in obj {
        let v = match v {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidType,
                    format!("{field}.{k}"),
                ));
            }
        };
        out.insert(k.clone(), v);
    }
    Ok(out)
}
