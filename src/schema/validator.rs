use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::SchemaNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    TypeMismatch,
    MinLength,
    MaxLength,
    Pattern,
    Enum,
    NotInteger,
    Minimum,
    Maximum,
    MaxItems,
    UniqueItems,
    MissingRequired,
    AdditionalProperty,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub code: IssueCode,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Warnings never affect validity.
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: &str, code: IssueCode, message: String) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            code,
            message,
        });
    }

    fn warning(&mut self, path: &str, code: IssueCode, message: String) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            code,
            message,
        });
    }
}

/// Validate a value against a schema tree. Read-only; the value is never
/// mutated. The root is treated as required.
pub fn validate(value: &Value, schema: &SchemaNode) -> ValidationReport {
    let mut report = ValidationReport::default();
    walk(value, schema, "", true, &mut report);
    report
}

fn walk(value: &Value, schema: &SchemaNode, path: &str, required: bool, report: &mut ValidationReport) {
    if !type_matches(value, schema) {
        // A null value for a non-required field passes untouched; nested
        // constraints are skipped along with the type check.
        if value.is_null() && !required {
            return;
        }
        report.error(
            path,
            IssueCode::TypeMismatch,
            format!(
                "expected {}, got {}",
                schema.type_name(),
                json_type_name(value)
            ),
        );
        // Constraints of a mismatched node are not validated.
        return;
    }

    match schema {
        SchemaNode::String {
            min_length,
            max_length,
            pattern,
            enum_values,
        } => {
            let s = value.as_str().unwrap_or_default();
            if let Some(min) = min_length {
                if s.chars().count() < *min {
                    report.error(
                        path,
                        IssueCode::MinLength,
                        format!("length {} is below minimum {}", s.chars().count(), min),
                    );
                }
            }
            if let Some(max) = max_length {
                if s.chars().count() > *max {
                    report.error(
                        path,
                        IssueCode::MaxLength,
                        format!("length {} exceeds maximum {}", s.chars().count(), max),
                    );
                }
            }
            if let Some(pattern) = pattern {
                if let Ok(re) = Regex::new(pattern) {
                    if !re.is_match(s) {
                        report.error(
                            path,
                            IssueCode::Pattern,
                            format!("value does not match pattern {pattern}"),
                        );
                    }
                }
            }
            if let Some(allowed) = enum_values {
                if !allowed.iter().any(|v| v == s) {
                    report.error(
                        path,
                        IssueCode::Enum,
                        format!("value must be one of {allowed:?}"),
                    );
                }
            }
        }
        SchemaNode::Integer { minimum, maximum } => {
            match value.as_i64() {
                None => {
                    report.error(
                        path,
                        IssueCode::NotInteger,
                        "number is not an integer".to_string(),
                    );
                }
                Some(n) => {
                    if let Some(min) = minimum {
                        if n < *min {
                            report.error(
                                path,
                                IssueCode::Minimum,
                                format!("{n} is below minimum {min}"),
                            );
                        }
                    }
                    if let Some(max) = maximum {
                        if n > *max {
                            report.error(
                                path,
                                IssueCode::Maximum,
                                format!("{n} exceeds maximum {max}"),
                            );
                        }
                    }
                }
            }
        }
        SchemaNode::Boolean => {}
        SchemaNode::Array {
            max_items,
            unique_items,
            items,
        } => {
            let elements = value.as_array().cloned().unwrap_or_default();
            if let Some(max) = max_items {
                if elements.len() > *max {
                    report.error(
                        path,
                        IssueCode::MaxItems,
                        format!("{} items exceed maximum {}", elements.len(), max),
                    );
                }
            }
            if *unique_items && has_duplicates(&elements) {
                report.warning(
                    path,
                    IssueCode::UniqueItems,
                    "array contains duplicate items".to_string(),
                );
            }
            if let Some(item_schema) = items {
                for (index, element) in elements.iter().enumerate() {
                    let child = format!("{path}[{index}]");
                    walk(element, item_schema, &child, true, report);
                }
            }
        }
        SchemaNode::Object {
            properties,
            required: required_names,
            additional_properties,
        } => {
            let empty = serde_json::Map::new();
            let fields = value.as_object().unwrap_or(&empty);

            for name in required_names {
                if !fields.contains_key(name) {
                    report.error(
                        &join(path, name),
                        IssueCode::MissingRequired,
                        format!("missing required field {name}"),
                    );
                }
            }

            if !additional_properties {
                for name in fields.keys() {
                    if !properties.contains_key(name) {
                        report.warning(
                            &join(path, name),
                            IssueCode::AdditionalProperty,
                            format!("unexpected field {name}"),
                        );
                    }
                }
            }

            for (name, child_schema) in properties {
                if let Some(child) = fields.get(name) {
                    let child_required = required_names.iter().any(|r| r == name);
                    walk(child, child_schema, &join(path, name), child_required, report);
                }
            }
        }
    }
}

fn type_matches(value: &Value, schema: &SchemaNode) -> bool {
    match schema {
        SchemaNode::String { .. } => value.is_string(),
        SchemaNode::Integer { .. } => value.is_number(),
        SchemaNode::Boolean => value.is_boolean(),
        SchemaNode::Array { .. } => value.is_array(),
        SchemaNode::Object { .. } => value.is_object(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn has_duplicates(elements: &[Value]) -> bool {
    for (i, a) in elements.iter().enumerate() {
        if elements.iter().skip(i + 1).any(|b| a == b) {
            return true;
        }
    }
    false
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn get_component_schema() -> SchemaNode {
        SchemaNode::object()
            .property(
                "id",
                SchemaNode::string()
                    .pattern("^[a-zA-Z0-9\\-_]+$")
                    .max_length(100),
            )
            .required(&["id"])
            .no_additional_properties()
    }

    #[test]
    fn missing_required_field_is_exactly_one_error() {
        let report = validate(&json!({}), &get_component_schema());
        assert!(!report.valid());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, "id");
        assert_eq!(report.errors[0].code, IssueCode::MissingRequired);
    }

    #[test]
    fn additional_property_is_a_warning_not_an_error() {
        let report = validate(&json!({"id": "ok", "extra": 1}), &get_component_schema());
        assert!(report.valid());
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].path, "extra");
        assert_eq!(report.warnings[0].code, IssueCode::AdditionalProperty);
    }

    #[test]
    fn type_mismatch_stops_nested_checks() {
        let schema = SchemaNode::string().min_length(5).pattern("^x");
        let report = validate(&json!(42), &schema);
        // Only the mismatch is reported, not min_length or pattern.
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, IssueCode::TypeMismatch);
    }

    #[test]
    fn null_for_non_required_field_is_exempt() {
        let schema = SchemaNode::object().property("tag", SchemaNode::string());
        let report = validate(&json!({"tag": null}), &schema);
        assert!(report.valid());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn null_for_required_field_is_a_mismatch() {
        let schema = SchemaNode::object()
            .property("tag", SchemaNode::string())
            .required(&["tag"]);
        let report = validate(&json!({"tag": null}), &schema);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, IssueCode::TypeMismatch);
    }

    #[test]
    fn string_constraints_do_not_short_circuit() {
        let schema = SchemaNode::string().min_length(5).one_of(&["alpha", "beta"]);
        let report = validate(&json!("x"), &schema);
        let codes: Vec<IssueCode> = report.errors.iter().map(|e| e.code).collect();
        assert!(codes.contains(&IssueCode::MinLength));
        assert!(codes.contains(&IssueCode::Enum));
    }

    #[test]
    fn integer_bounds() {
        let schema = SchemaNode::integer().minimum(1).maximum(50);
        assert!(validate(&json!(10), &schema).valid());
        assert!(!validate(&json!(0), &schema).valid());
        assert!(!validate(&json!(51), &schema).valid());
        let report = validate(&json!(1.5), &schema);
        assert_eq!(report.errors[0].code, IssueCode::NotInteger);
    }

    #[test]
    fn array_duplicates_warn_and_max_items_errors() {
        let schema = SchemaNode::array()
            .max_items(2)
            .unique()
            .items(SchemaNode::string());
        let report = validate(&json!(["a", "a", "b"]), &schema);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, IssueCode::MaxItems);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].code, IssueCode::UniqueItems);
    }

    #[test]
    fn array_elements_validated_with_index_paths() {
        let schema = SchemaNode::array().items(SchemaNode::string());
        let report = validate(&json!(["ok", 3]), &schema);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, "[1]");
    }

    #[test]
    fn nested_objects_report_dotted_paths() {
        let schema = SchemaNode::object().property(
            "filters",
            SchemaNode::object()
                .property("limit", SchemaNode::integer())
                .required(&["limit"]),
        );
        let report = validate(&json!({"filters": {}}), &schema);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, "filters.limit");
    }
}
