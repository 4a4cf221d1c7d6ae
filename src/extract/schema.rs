//! Field schema, instruction text, and response parsing.
//!
//! The response must be a JSON object whose values are strings. Keys may be
//! missing and values may be `null`; both mean "not found". A value of any
//! other type, or a body that is not an object, rejects the whole response.

use super::{ExtractionError, ExtractionResult};
use crate::record::BusinessType;
use serde_json::{Map, Value, json};

/// Wire names of the ten extracted fields, in schema order.
pub const FIELD_NAMES: [&str; 10] = [
    "companyName",
    "address",
    "contactPerson",
    "contactNumber",
    "whatsappNumber",
    "email",
    "website",
    "natureOfBusiness",
    "businessType",
    "notes",
];

/// Fields the schema marks as required.
pub const REQUIRED_FIELDS: [&str; 2] = ["companyName", "contactNumber"];

pub const INSTRUCTION: &str = "\
This is a photo of a business card, shop sign, or banner. Extract the \
following details for a business contact: company name, full address, \
contact person, phone number, WhatsApp number, email, website, nature of \
business (what they make, sell, or do), business type, and any other useful \
text as notes.

Classify businessType as exactly one of Trading, Manufacturing, Service, or \
Other. Use keyword hints: names containing \"Works\", \"Industries\", \
\"Mfg\" or \"Manufacturers\" are Manufacturing; \"Traders\", \"Trading\", \
\"Enterprises\", \"Suppliers\" or \"Distributors\" are Trading; \
\"Services\", \"Solutions\", \"Consultants\" or \"Agency\" are Service. \
Use Other when nothing fits.

If the WhatsApp number is not marked separately, leave it empty. Leave any \
field as an empty string if it cannot be read. Do not invent values.";

/// Response schema in the service's OpenAPI-subset dialect.
pub fn response_schema() -> Value {
    let mut properties = Map::new();
    for name in FIELD_NAMES {
        let prop = if name == "businessType" {
            let variants: Vec<&str> = BusinessType::ALL.iter().map(|t| t.as_str()).collect();
            json!({ "type": "STRING", "enum": variants })
        } else {
            json!({ "type": "STRING" })
        };
        properties.insert(name.to_string(), prop);
    }
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": REQUIRED_FIELDS,
        "propertyOrdering": FIELD_NAMES,
    })
}

/// Parse the service's JSON text into a field mapping.
pub fn parse_fields(text: &str) -> Result<ExtractionResult, ExtractionError> {
    let text = strip_code_fence(text.trim());
    if text.is_empty() {
        return Err(ExtractionError::EmptyResponse);
    }

    let value: Value =
        serde_json::from_str(text).map_err(|e| ExtractionError::Malformed(e.to_string()))?;
    let Value::Object(map) = &value else {
        return Err(ExtractionError::Malformed(format!(
            "expected a JSON object, got {}",
            kind(&value)
        )));
    };

    for name in FIELD_NAMES {
        match map.get(name) {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(other) => {
                return Err(ExtractionError::Malformed(format!(
                    "field {name} must be a string, got {}",
                    kind(other)
                )));
            }
        }
    }

    serde_json::from_value(value).map_err(|e| ExtractionError::Malformed(e.to_string()))
}

/// Some models wrap JSON in a Markdown fence even when asked not to.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
