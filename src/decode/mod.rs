//! Response decoding.
//!
//! Turns 2xx response bodies into domain types. Field-level date and time
//! coercion happens inside each type's `Deserialize`; failures there are
//! reported as [`CalendarErrorKind::Coercion`](crate::errors::CalendarErrorKind)
//! and everything else as a decode error.

use crate::errors::{CalendarError, CalendarResult};
use crate::types::time::COERCION_ERROR_PREFIX;
use once_cell::unsync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Decoder for one response body.
pub struct ResponseParser<'a> {
    body: &'a str,
    json: OnceCell<Value>,
}

/// Decodes a collection under one attribute of a response.
pub type CollectionDecoder<R> = fn(&ResponseParser<'_>, &str) -> CalendarResult<R>;

impl<'a> ResponseParser<'a> {
    /// Creates a parser over a response body.
    pub fn new(body: &'a str) -> Self {
        Self {
            body,
            json: OnceCell::new(),
        }
    }

    fn value(&self) -> CalendarResult<&Value> {
        self.json.get_or_try_init(|| {
            serde_json::from_str(self.body).map_err(|e| {
                CalendarError::decode(format!("Invalid JSON in response body: {}", e)).with_cause(e)
            })
        })
    }

    fn target(&self, attribute: Option<&str>) -> CalendarResult<&Value> {
        let value = self.value()?;
        match attribute {
            None => Ok(value),
            Some(attribute) => value.get(attribute).ok_or_else(|| {
                CalendarError::decode(format!("Response has no \"{}\" attribute", attribute))
            }),
        }
    }

    /// Decodes one value, from the whole body or from an attribute of it.
    pub fn parse_json<T: DeserializeOwned>(&self, attribute: Option<&str>) -> CalendarResult<T> {
        let target = self.target(attribute)?;
        T::deserialize(target).map_err(classify)
    }

    /// Decodes an attribute that may be absent.
    ///
    /// An absent or null attribute is `None`; a present one that fails to
    /// decode is an error.
    pub fn parse_optional<T: DeserializeOwned>(&self, attribute: &str) -> CalendarResult<Option<T>> {
        match self.value()?.get(attribute) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value).map(Some).map_err(classify),
        }
    }

    /// Decodes a list, from the whole body or from an attribute of it.
    pub fn parse_collection<T: DeserializeOwned>(
        &self,
        attribute: Option<&str>,
    ) -> CalendarResult<Vec<T>> {
        let target = self.target(attribute)?;
        if !target.is_array() {
            return Err(CalendarError::decode(format!(
                "Expected a list under {}",
                attribute.unwrap_or("the response body")
            )));
        }

        Vec::<T>::deserialize(target).map_err(classify)
    }

    /// Decodes the first of several attributes present in the body.
    ///
    /// Each candidate pairs an attribute with the decoder for it; the first
    /// attribute holding a non-null value wins.
    pub fn parse_collections<R>(&self, candidates: &[(&str, CollectionDecoder<R>)]) -> CalendarResult<R> {
        let json = self.json()?;

        for (attribute, decode) in candidates {
            if json.get(*attribute).map_or(false, |v| !v.is_null()) {
                return decode(self, attribute);
            }
        }

        let keys: Vec<&String> = json.keys().collect();
        Err(CalendarError::decode(format!(
            "No mapped attributes for response - {:?}",
            keys
        )))
    }

    /// The body as a raw JSON object.
    pub fn json(&self) -> CalendarResult<Map<String, Value>> {
        match self.value()? {
            Value::Object(map) => Ok(map.clone()),
            _ => Err(CalendarError::decode("Response body is not a JSON object")),
        }
    }
}

fn classify(error: serde_json::Error) -> CalendarError {
    let message = error.to_string();
    if message.contains(COERCION_ERROR_PREFIX) {
        CalendarError::coercion(message).with_cause(error)
    } else {
        CalendarError::decode(format!("Failed to decode response: {}", message)).with_cause(error)
    }
}
