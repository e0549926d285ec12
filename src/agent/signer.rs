use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Signs a parameter map in place: strips `login`, sorts the remaining keys
/// ascending, form-encodes them into the canonical query string, computes
/// HMAC-SHA1 over it keyed by `token`, then reinstates `login` and appends
/// the lowercase-hex `signature`. Returns the signature.
///
/// Identical (login, token, params-minus-login) always produce the same
/// signature; this is the contract the remote API verifies.
pub fn sign_params(params: &mut Map<String, Value>, login: &str, token: &str) -> String {
    params.remove("login");

    let mut sorted: Vec<(String, Value)> = params
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut canonical = Map::new();
    for (key, value) in sorted {
        canonical.insert(key, value);
    }
    let signed_material = form_encode(&canonical);

    let mut mac =
        HmacSha1::new_from_slice(token.as_bytes()).expect("HMAC can take key of any size");
    mac.update(signed_material.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    *params = canonical;
    params.insert("login".to_string(), Value::String(login.to_string()));
    params.insert(
        "signature".to_string(),
        Value::String(signature.clone()),
    );

    signature
}

/// Form-encodes a parameter map in its current key order. Array values
/// expand into indexed pairs (`key[0]`, `key[1]`, ...); null values are
/// skipped.
pub(crate) fn form_encode(params: &Map<String, Value>) -> String {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    pairs.push((format!("{}[{}]", key, idx), render_scalar(item)));
                }
            }
            other => pairs.push((key.clone(), render_scalar(other))),
        }
    }
    serde_urlencoded::to_string(&pairs).unwrap_or_default()
}

fn render_scalar(value: &Value) -> String {
    value
        .as_str()
        .map(|s| s.to_string())
        .unwrap_or_else(|| value.to_string())
}
