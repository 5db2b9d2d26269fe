//! Stable hashing helpers for group keys, pipeline fingerprints, and digests.

use blake3::Hasher;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        // blake3 hex(32b) is 64 hex chars
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            use std::fmt::Write as _;
            let _ = write!(&mut s, "{:02x}", b);
        }
        s
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

pub fn hash_bytes(bytes: &[u8]) -> Hash256 {
    let mut h = Hasher::new();
    h.update(bytes);
    let out = h.finalize();
    Hash256(out.into())
}

/// Hash any serde-serializable value deterministically (via JSON).
pub fn hash_serde<T: Serialize>(v: &T) -> Result<Hash256, crate::error::Error> {
    let bytes = serde_json::to_vec(v)?;
    Ok(hash_bytes(&bytes))
}

/// Structural digest of a JSON value: object key order is irrelevant and
/// numbers hash by float value, so `{"a":1,"b":2}` and `{"b":2,"a":1.0}`
/// collide on purpose.
pub fn hash_value(value: &Value) -> Hash256 {
    let mut h = Hasher::new();
    hash_value_into(Some(value), &mut h);
    Hash256(h.finalize().into())
}

/// Equality key for a tuple of resolved values (absent ≠ null).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupKey(Hash256);

impl GroupKey {
    pub fn from_values(values: &[Option<&Value>]) -> Self {
        let mut h = Hasher::new();
        h.update(&(values.len() as u64).to_le_bytes());
        for v in values {
            hash_value_into(*v, &mut h);
        }
        GroupKey(Hash256(h.finalize().into()))
    }

    /// Key for a whole record, structurally.
    pub fn from_record(record: &Map<String, Value>) -> Self {
        let mut h = Hasher::new();
        // same discriminant an object value gets
        h.update(&[6]);
        hash_map_into(record, &mut h);
        GroupKey(Hash256(h.finalize().into()))
    }
}

fn tag(value: Option<&Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Null) => 1,
        Some(Value::Bool(_)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Object(_)) => 6,
    }
}

fn hash_str(s: &str, h: &mut Hasher) {
    h.update(&(s.len() as u64).to_le_bytes());
    h.update(s.as_bytes());
}

fn hash_value_into(value: Option<&Value>, h: &mut Hasher) {
    // Write type discriminant first
    h.update(&[tag(value)]);

    match value {
        None | Some(Value::Null) => {}
        Some(Value::Bool(b)) => {
            h.update(&[*b as u8]);
        }
        Some(Value::Number(n)) => {
            let f = n.as_f64().unwrap_or(0.0);
            // -0.0 and 0.0 are the same key
            let f = if f == 0.0 { 0.0 } else { f };
            h.update(&f.to_bits().to_le_bytes());
        }
        Some(Value::String(s)) => hash_str(s, h),
        Some(Value::Array(items)) => {
            h.update(&(items.len() as u64).to_le_bytes());
            for item in items {
                hash_value_into(Some(item), h);
            }
        }
        Some(Value::Object(map)) => hash_map_into(map, h),
    }
}

fn hash_map_into(map: &Map<String, Value>, h: &mut Hasher) {
    h.update(&(map.len() as u64).to_le_bytes());
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    for k in keys {
        hash_str(k, h);
        hash_value_into(map.get(k.as_str()), h);
    }
}
