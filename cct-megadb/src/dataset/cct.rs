//! The COCO Camera Traps JSON schema.

use crate::common::*;

/// A COCO Camera Traps database file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CctDatabase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
    pub images: Vec<CctImage>,
    pub categories: Vec<CctCategory>,
    #[serde(default)]
    pub annotations: Vec<CctAnnotation>,
}

impl CctDatabase {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let reader = BufReader::new(
            File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?,
        );
        let db = serde_json::from_reader(reader).with_context(|| {
            format!(
                "failed to parse '{}', is it a COCO Camera Traps file?",
                path.display()
            )
        })?;
        Ok(db)
    }
}

/// An entry in the image list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CctImage {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<String>,
    /// Fields outside of the common schema, such as `seq_id` or `frame_num`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An entry in the category list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CctCategory {
    pub id: usize,
    pub name: String,
}

/// An entry in the annotation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CctAnnotation {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub image_id: String,
    pub category_id: usize,
    /// Bounding box `[x, y, w, h]` in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<XYWH<f64>>,
}

/// Identifiers in the wild are either strings or integers.
struct StringOrNumber;

impl<'de> Visitor<'de> for StringOrNumber {
    type Value = String;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string or an integer")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(value.to_owned())
    }

    fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(value)
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(value.to_string())
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(value.to_string())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(StringOrNumber)
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expect a string or a number, but get {}",
            other
        ))),
    }
}
