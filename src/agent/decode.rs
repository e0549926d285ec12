use super::call::Format;
use crate::errors::AgentError;
use serde_json::Value;
use xmltree::Element;

/// Decoded response body, one variant per supported wire format.
#[derive(Debug, Clone)]
pub enum Decoded {
    Json(Value),
    Xml(Element),
}

impl Decoded {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Decoded::Json(value) => Some(value),
            Decoded::Xml(_) => None,
        }
    }

    pub fn as_xml(&self) -> Option<&Element> {
        match self {
            Decoded::Xml(element) => Some(element),
            Decoded::Json(_) => None,
        }
    }
}

/// Decodes raw response bytes per the declared format. A malformed payload
/// is a `Decode` error carrying the original payload for diagnostics.
pub fn decode(raw: &[u8], format: Format) -> Result<Decoded, AgentError> {
    match format {
        Format::Json => serde_json::from_slice(raw)
            .map(Decoded::Json)
            .map_err(|err| decode_error(raw, format, &err.to_string())),
        Format::Xml => Element::parse(raw)
            .map(Decoded::Xml)
            .map_err(|err| decode_error(raw, format, &err.to_string())),
    }
}

fn decode_error(raw: &[u8], format: Format, reason: &str) -> AgentError {
    AgentError::decode(format!(
        "Response is not valid {}: {}",
        format.as_str(),
        reason
    ))
    .with_details(serde_json::json!({
        "format": format.as_str(),
        "raw": String::from_utf8_lossy(raw),
    }))
}
