use serde::{self, de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

/// Epoch-millisecond timestamps that degrade to `None` when the backend sends
/// something that is not a number (or a numeric string).
pub mod lenient_millis {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ms) => serializer.serialize_some(ms),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(millis_from_value))
    }
}

fn millis_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|v| i64::try_from(v).ok()))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Lists that the backend sometimes omits or replaces with a non-array value.
/// Anything other than an array becomes `None`; array elements must decode.
pub fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(serde::de::Error::custom))
            .collect::<Result<Vec<T>, _>>()
            .map(Some),
        _ => Ok(None),
    }
}

/// `null` reads the same as an absent field: the type's default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Row lists where one bad row must not cost the others.
/// Rows that fail to decode are logged and skipped; a non-array is empty.
pub fn skip_malformed<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        Some(other) => {
            log::warn!("Expected a list, got {}", other);
            return Ok(Vec::new());
        }
        None => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(row) => Some(row),
            Err(e) => {
                log::warn!("Skipping malformed row {}: {}", i, e);
                None
            }
        })
        .collect())
}
