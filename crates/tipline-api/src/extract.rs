use axum::{
    body::Bytes,
    extract::{FromRequest, Request, rejection::BytesRejection},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A JSON request body that never rejects on content.
///
/// A missing, non-JSON or non-object body is read as an empty object, so
/// validation reports the missing fields. Top-level fields whose value has
/// the wrong type are dropped and listed in `mistyped`. Only reading the
/// body itself (e.g. hitting the size limit) can still reject.
#[derive(Debug)]
pub struct JsonBody<T> {
    pub value: T,
    pub mistyped: Vec<String>,
}

impl<T> From<T> for JsonBody<T> {
    fn from(value: T) -> Self {
        Self {
            value,
            mistyped: Vec::new(),
        }
    }
}

impl<T: DeserializeOwned + Default> JsonBody<T> {
    pub fn parse(bytes: &[u8]) -> Self {
        let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(bytes) else {
            return T::default().into();
        };

        let mut kept = Map::new();
        let mut mistyped = Vec::new();
        for (key, value) in fields {
            let single = Map::from_iter([(key.clone(), value.clone())]);
            if serde_json::from_value::<T>(Value::Object(single)).is_ok() {
                kept.insert(key, value);
            } else {
                mistyped.push(key);
            }
        }

        let value = serde_json::from_value(Value::Object(kept)).unwrap_or_default();
        Self { value, mistyped }
    }
}

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = BytesRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await?;
        Ok(Self::parse(&bytes))
    }
}
