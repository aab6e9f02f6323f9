use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;

// ================================
// DataValue – runtime value model
// ================================

/// Runtime value carried by instance variables and fact fields.
#[derive(Debug, Clone)]
pub enum DataValue {
    None,
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Object(HashMap<String, DataValue>),
    Array(Vec<DataValue>),
}

impl DataValue {
    /// Create a DataValue from serde_json::Value
    pub fn from_value(v: &Value) -> Self {
        match v {
            Value::Null => DataValue::None,
            Value::Bool(b) => DataValue::Boolean(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DataValue::Integer(i)
                } else {
                    DataValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => DataValue::String(s.clone()),
            Value::Array(arr) => DataValue::Array(arr.iter().map(DataValue::from_value).collect()),
            Value::Object(map) => {
                let m: HashMap<String, DataValue> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), DataValue::from_value(v)))
                    .collect();
                DataValue::Object(m)
            }
        }
    }

    /// Convert DataValue → serde_json::Value
    pub fn to_value(&self) -> Value {
        match self {
            DataValue::None => Value::Null,
            DataValue::String(s) => Value::String(s.clone()),
            DataValue::Integer(i) => serde_json::json!(*i),
            DataValue::Float(f) => serde_json::json!(*f),
            DataValue::Boolean(b) => Value::Bool(*b),
            DataValue::Object(map) => {
                let m: serde_json::Map<String, Value> =
                    map.iter().map(|(k, v)| (k.clone(), v.to_value())).collect();
                Value::Object(m)
            }
            DataValue::Array(items) => Value::Array(items.iter().map(|v| v.to_value()).collect()),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, DataValue::None)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            DataValue::None => true,
            DataValue::String(s) => s.is_empty(),
            DataValue::Array(items) => items.is_empty(),
            DataValue::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Integer(i) => Some(*i as f64),
            DataValue::Float(f) => Some(*f),
            DataValue::String(s) => s.parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn to_display_string(&self) -> String {
        match self {
            DataValue::None => String::new(),
            DataValue::String(s) => s.clone(),
            DataValue::Integer(i) => i.to_string(),
            DataValue::Float(f) => f.to_string(),
            DataValue::Boolean(b) => b.to_string(),
            other => serde_json::to_string(&other.to_value()).unwrap_or_default(),
        }
    }

    /// The declared type this value satisfies.
    pub fn data_type(&self) -> DataType {
        match self {
            DataValue::None => DataType::Any,
            DataValue::String(_) => DataType::String,
            DataValue::Integer(_) | DataValue::Float(_) => DataType::Number,
            DataValue::Boolean(_) => DataType::Boolean,
            DataValue::Object(_) => DataType::Object,
            DataValue::Array(_) => DataType::Array,
        }
    }

    pub fn matches_type(&self, t: &DataType) -> bool {
        match t {
            DataType::Any => true,
            _ => self.data_type() == *t,
        }
    }
}

impl PartialEq for DataValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DataValue::None, DataValue::None) => true,
            (DataValue::String(a), DataValue::String(b)) => a == b,
            (DataValue::Integer(a), DataValue::Integer(b)) => a == b,
            (DataValue::Float(a), DataValue::Float(b)) => (a - b).abs() < 1e-10,
            (DataValue::Integer(a), DataValue::Float(b))
            | (DataValue::Float(b), DataValue::Integer(a)) => (*a as f64 - b).abs() < 1e-10,
            (DataValue::Boolean(a), DataValue::Boolean(b)) => a == b,
            _ => self.to_value() == other.to_value(),
        }
    }
}

impl std::fmt::Display for DataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl Serialize for DataValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DataValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Value::deserialize(deserializer)?;
        Ok(DataValue::from_value(&v))
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::String(s.to_string())
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::String(s)
    }
}

impl From<i64> for DataValue {
    fn from(i: i64) -> Self {
        DataValue::Integer(i)
    }
}

impl From<f64> for DataValue {
    fn from(f: f64) -> Self {
        DataValue::Float(f)
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        DataValue::Boolean(b)
    }
}

// ================================
// DataType – header-declared variable types
// ================================

/// Variable type declared in a definition header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Any,
}

impl DataType {
    /// Parse a header declaration's type name.
    pub fn from_decl(t: &str) -> Option<Self> {
        match t.trim().to_lowercase().as_str() {
            "string" => Some(DataType::String),
            "number" => Some(DataType::Number),
            "boolean" => Some(DataType::Boolean),
            "object" => Some(DataType::Object),
            "array" => Some(DataType::Array),
            "any" => Some(DataType::Any),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Boolean => "boolean",
            DataType::Object => "object",
            DataType::Array => "array",
            DataType::Any => "any",
        }
    }
}
