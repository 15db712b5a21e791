use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ws::WsNode;

/// Deserialize with JSON-path context in error messages.
fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

/// Parse a WS schema source.
pub fn ws_from_str(src: &str) -> Result<WsNode, String> {
    from_str_with_path(src)
}

/// Parse a candidate document.
pub fn value_from_str(src: &str) -> Result<Value, String> {
    from_str_with_path(src)
}
