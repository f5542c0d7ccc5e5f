use std::collections::BTreeMap;

use serde_json::{json, Value};

/// One node of a schema tree. Covers the subset of JSON schema the tool
/// surface actually uses: five types with type-specific constraints.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    String {
        min_length: Option<usize>,
        max_length: Option<usize>,
        pattern: Option<String>,
        enum_values: Option<Vec<String>>,
    },
    Integer {
        minimum: Option<i64>,
        maximum: Option<i64>,
    },
    Boolean,
    Array {
        max_items: Option<usize>,
        unique_items: bool,
        items: Option<Box<SchemaNode>>,
    },
    Object {
        properties: BTreeMap<String, SchemaNode>,
        required: Vec<String>,
        additional_properties: bool,
    },
}

impl SchemaNode {
    pub fn string() -> Self {
        SchemaNode::String {
            min_length: None,
            max_length: None,
            pattern: None,
            enum_values: None,
        }
    }

    pub fn integer() -> Self {
        SchemaNode::Integer {
            minimum: None,
            maximum: None,
        }
    }

    pub fn boolean() -> Self {
        SchemaNode::Boolean
    }

    pub fn array() -> Self {
        SchemaNode::Array {
            max_items: None,
            unique_items: false,
            items: None,
        }
    }

    pub fn object() -> Self {
        SchemaNode::Object {
            properties: BTreeMap::new(),
            required: Vec::new(),
            additional_properties: true,
        }
    }

    pub fn min_length(mut self, n: usize) -> Self {
        if let SchemaNode::String { min_length, .. } = &mut self {
            *min_length = Some(n);
        }
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        if let SchemaNode::String { max_length, .. } = &mut self {
            *max_length = Some(n);
        }
        self
    }

    pub fn pattern(mut self, regex: impl Into<String>) -> Self {
        if let SchemaNode::String { pattern, .. } = &mut self {
            *pattern = Some(regex.into());
        }
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        if let SchemaNode::String { enum_values, .. } = &mut self {
            *enum_values = Some(values.iter().map(|v| v.to_string()).collect());
        }
        self
    }

    pub fn minimum(mut self, n: i64) -> Self {
        if let SchemaNode::Integer { minimum, .. } = &mut self {
            *minimum = Some(n);
        }
        self
    }

    pub fn maximum(mut self, n: i64) -> Self {
        if let SchemaNode::Integer { maximum, .. } = &mut self {
            *maximum = Some(n);
        }
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        if let SchemaNode::Array { max_items, .. } = &mut self {
            *max_items = Some(n);
        }
        self
    }

    pub fn unique(mut self) -> Self {
        if let SchemaNode::Array { unique_items, .. } = &mut self {
            *unique_items = true;
        }
        self
    }

    pub fn items(mut self, node: SchemaNode) -> Self {
        if let SchemaNode::Array { items, .. } = &mut self {
            *items = Some(Box::new(node));
        }
        self
    }

    pub fn property(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        if let SchemaNode::Object { properties, .. } = &mut self {
            properties.insert(name.into(), node);
        }
        self
    }

    pub fn required(mut self, names: &[&str]) -> Self {
        if let SchemaNode::Object { required, .. } = &mut self {
            required.extend(names.iter().map(|n| n.to_string()));
        }
        self
    }

    pub fn no_additional_properties(mut self) -> Self {
        if let SchemaNode::Object {
            additional_properties,
            ..
        } = &mut self
        {
            *additional_properties = false;
        }
        self
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaNode::String { .. } => "string",
            SchemaNode::Integer { .. } => "integer",
            SchemaNode::Boolean => "boolean",
            SchemaNode::Array { .. } => "array",
            SchemaNode::Object { .. } => "object",
        }
    }

    /// JSON-schema-shaped value, as listed by the tools route.
    pub fn to_json_schema(&self) -> Value {
        match self {
            SchemaNode::String {
                min_length,
                max_length,
                pattern,
                enum_values,
            } => {
                let mut out = json!({ "type": "string" });
                if let Some(n) = min_length {
                    out["minLength"] = json!(n);
                }
                if let Some(n) = max_length {
                    out["maxLength"] = json!(n);
                }
                if let Some(p) = pattern {
                    out["pattern"] = json!(p);
                }
                if let Some(values) = enum_values {
                    out["enum"] = json!(values);
                }
                out
            }
            SchemaNode::Integer { minimum, maximum } => {
                let mut out = json!({ "type": "integer" });
                if let Some(n) = minimum {
                    out["minimum"] = json!(n);
                }
                if let Some(n) = maximum {
                    out["maximum"] = json!(n);
                }
                out
            }
            SchemaNode::Boolean => json!({ "type": "boolean" }),
            SchemaNode::Array {
                max_items,
                unique_items,
                items,
            } => {
                let mut out = json!({ "type": "array" });
                if let Some(n) = max_items {
                    out["maxItems"] = json!(n);
                }
                if *unique_items {
                    out["uniqueItems"] = json!(true);
                }
                if let Some(node) = items {
                    out["items"] = node.to_json_schema();
                }
                out
            }
            SchemaNode::Object {
                properties,
                required,
                additional_properties,
            } => {
                let props: serde_json::Map<String, Value> = properties
                    .iter()
                    .map(|(name, node)| (name.clone(), node.to_json_schema()))
                    .collect();
                let mut out = json!({ "type": "object", "properties": props });
                if !required.is_empty() {
                    out["required"] = json!(required);
                }
                if !additional_properties {
                    out["additionalProperties"] = json!(false);
                }
                out
            }
        }
    }
}
