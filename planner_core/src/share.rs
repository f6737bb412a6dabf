//! Share links - persisted state encoded into a URL query parameter
//!
//! Format: `?shared=<base64(JSON object of key -> value)>`. Values stored as
//! JSON text travel as JSON values, anything else as a JSON string.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Map, Value};
use tracing::{info, warn};
use url::Url;

use crate::store::StateStore;

/// Query parameter carrying the encoded state
pub const SHARE_PARAM: &str = "shared";

/// Decoded share payload
pub type SharedData = Map<String, Value>;

#[derive(Debug)]
pub enum ShareError {
    Url(url::ParseError),
    Base64(base64::DecodeError),
    Utf8(std::string::FromUtf8Error),
    Json(serde_json::Error),
    /// Payload decoded but is not a JSON object
    NotAnObject,
}

impl std::fmt::Display for ShareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShareError::Url(e) => write!(f, "Invalid URL: {e}"),
            ShareError::Base64(e) => write!(f, "Share payload is not base64: {e}"),
            ShareError::Utf8(e) => write!(f, "Share payload is not UTF-8: {e}"),
            ShareError::Json(e) => write!(f, "Share payload is not JSON: {e}"),
            ShareError::NotAnObject => write!(f, "Share payload is not a JSON object"),
        }
    }
}

impl std::error::Error for ShareError {}

impl From<url::ParseError> for ShareError {
    fn from(e: url::ParseError) -> Self {
        ShareError::Url(e)
    }
}

impl From<base64::DecodeError> for ShareError {
    fn from(e: base64::DecodeError) -> Self {
        ShareError::Base64(e)
    }
}

impl From<std::string::FromUtf8Error> for ShareError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        ShareError::Utf8(e)
    }
}

impl From<serde_json::Error> for ShareError {
    fn from(e: serde_json::Error) -> Self {
        ShareError::Json(e)
    }
}

/// Read `keys` from the store; missing keys are skipped
pub fn collect_keys<S: StateStore + ?Sized, K: AsRef<str>>(store: &S, keys: &[K]) -> SharedData {
    let mut data = SharedData::new();
    for key in keys {
        let key = key.as_ref();
        if let Some(raw) = store.get(key) {
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            data.insert(key.to_string(), value);
        }
    }
    data
}

pub fn encode_payload(data: &SharedData) -> Result<String, ShareError> {
    let json = serde_json::to_string(data)?;
    Ok(BASE64.encode(json))
}

pub fn decode_payload(encoded: &str) -> Result<SharedData, ShareError> {
    let bytes = BASE64.decode(encoded.trim())?;
    let json = String::from_utf8(bytes)?;
    match serde_json::from_str(&json)? {
        Value::Object(data) => Ok(data),
        _ => Err(ShareError::NotAnObject),
    }
}

/// Build a link to `base_url` carrying `keys` from the store.
///
/// When none of the keys has a value, `base_url` comes back unchanged.
pub fn create_share_link<S: StateStore + ?Sized, K: AsRef<str>>(
    store: &S,
    keys: &[K],
    base_url: &str,
) -> Result<String, ShareError> {
    let data = collect_keys(store, keys);
    link_with_payload(&data, base_url)
}

/// Like `create_share_link`, for every key in the store
pub fn create_share_link_all<S: StateStore + ?Sized>(store: &S, base_url: &str) -> Result<String, ShareError> {
    let data = collect_keys(store, &store.keys());
    link_with_payload(&data, base_url)
}

fn link_with_payload(data: &SharedData, base_url: &str) -> Result<String, ShareError> {
    let mut url = Url::parse(base_url)?;
    if data.is_empty() {
        warn!("No stored state found for the requested keys");
        return Ok(url.into());
    }
    let encoded = encode_payload(data)?;
    let others: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != SHARE_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(others)
        .append_pair(SHARE_PARAM, &encoded);
    Ok(url.into())
}

/// A successful restore
#[derive(Debug, Clone, PartialEq)]
pub struct Restored {
    pub data: SharedData,
    /// The input URL without the share parameter
    pub cleaned_url: String,
}

/// Decode the share parameter of `url` and write every key into the store.
///
/// `Ok(None)` means the URL carries no share parameter. On error the store is
/// left untouched.
pub fn try_restore_from_url<S: StateStore + ?Sized>(
    url: &str,
    store: &mut S,
) -> Result<Option<Restored>, ShareError> {
    let parsed = Url::parse(url)?;
    let Some(encoded) = parsed
        .query_pairs()
        .find(|(k, _)| k == SHARE_PARAM)
        .map(|(_, v)| v.into_owned())
    else {
        return Ok(None);
    };

    let data = decode_payload(&encoded)?;
    for (key, value) in &data {
        let raw = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        store.set(key, raw);
    }
    info!(keys = ?data.keys().collect::<Vec<_>>(), "Restored state from share link");

    Ok(Some(Restored {
        data,
        cleaned_url: strip_share_param(parsed),
    }))
}

/// Restore, logging failures; invalid links yield `None`
pub fn restore_from_url<S: StateStore + ?Sized>(url: &str, store: &mut S) -> Option<Restored> {
    match try_restore_from_url(url, store) {
        Ok(restored) => restored,
        Err(e) => {
            warn!("Error restoring state from share link: {}", e);
            None
        }
    }
}

fn strip_share_param(mut url: Url) -> String {
    let others: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != SHARE_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if others.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(others);
    }
    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const BASE: &str = "http://localhost:3000/";

    fn shared_param(link: &str) -> String {
        Url::parse(link)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == SHARE_PARAM)
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[test]
    fn test_share_round_trip() {
        let mut source = MemoryStore::new();
        source.set("a", "1".to_string());
        source.set("b", r#"{"x":1}"#.to_string());
        source.set("c", "unrelated".to_string());

        let link = create_share_link(&source, &["a", "b"], BASE).unwrap();
        assert!(link.starts_with("http://localhost:3000/?shared="));

        let mut target = MemoryStore::new();
        let restored = restore_from_url(&link, &mut target).unwrap();
        assert_eq!(target.get("a").as_deref(), Some("1"));
        assert_eq!(target.get("b").as_deref(), Some(r#"{"x":1}"#));
        assert_eq!(target.get("c"), None);
        assert!(!restored.data.contains_key("c"));
        assert_eq!(restored.cleaned_url, BASE);
    }

    #[test]
    fn test_payload_is_base64_json() {
        let mut store = MemoryStore::new();
        store.set("settings", r#"{"lang":"en","theme":"dark"}"#.to_string());
        store.set("name", "plain text".to_string());

        let link = create_share_link(&store, &["settings", "name"], BASE).unwrap();
        let decoded = BASE64.decode(shared_param(&link)).unwrap();
        let json: Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "settings": { "theme": "dark", "lang": "en" },
                "name": "plain text",
            })
        );
    }

    #[test]
    fn test_no_values_returns_base_url() {
        let store = MemoryStore::new();
        let link = create_share_link(&store, &["missing"], BASE).unwrap();
        assert_eq!(link, BASE);
    }

    #[test]
    fn test_missing_keys_are_skipped() {
        let mut store = MemoryStore::new();
        store.set("key1", "value1".to_string());
        let data = collect_keys(&store, &["key1", "nonexistent"]);
        assert_eq!(data.len(), 1);
        assert_eq!(data["key1"], Value::String("value1".to_string()));
    }

    #[test]
    fn test_share_all_keys() {
        let mut store = MemoryStore::new();
        store.set("one", "1".to_string());
        store.set("two", "[2]".to_string());
        let link = create_share_link_all(&store, BASE).unwrap();
        let data = decode_payload(&shared_param(&link)).unwrap();
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn test_invalid_payload_restores_nothing() {
        let mut store = MemoryStore::new();
        assert!(restore_from_url("http://localhost/?shared=%%%not-base64", &mut store).is_none());
        assert!(restore_from_url("http://localhost/?shared=WzEsMl0=", &mut store).is_none());
        assert!(matches!(
            try_restore_from_url("http://localhost/?shared=WzEsMl0=", &mut store),
            Err(ShareError::NotAnObject)
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_no_param_is_not_an_error() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            try_restore_from_url("http://localhost/?tab=1", &mut store),
            Ok(None)
        ));
    }

    #[test]
    fn test_cleaning_keeps_other_params() {
        let mut source = MemoryStore::new();
        source.set("a", "1".to_string());
        let link = create_share_link(&source, &["a"], "http://localhost/page?tab=2").unwrap();

        let mut target = MemoryStore::new();
        let restored = restore_from_url(&link, &mut target).unwrap();
        assert_eq!(restored.cleaned_url, "http://localhost/page?tab=2");
    }
}
