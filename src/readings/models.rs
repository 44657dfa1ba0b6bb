use serde::Deserialize;
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// FieldValue
//
// Devices post either JSON (numbers) or url-encoded forms (everything is a
// string). `untagged` lets serde accept both; numeric strings are parsed
// later by the validator. Any other JSON shape lands in `Other` so the
// validator, not the body decoder, decides which field is wrong.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl FieldValue {
    /// `true` for an empty string; such a field counts as absent.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }

    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().ok()?,
            Self::Other(_) => return None,
        };
        v.is_finite().then_some(v)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            Self::Number(_) | Self::Other(_) => None,
        }
    }
}

/// Raw body of `POST /data`, before validation.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SubmissionFields {
    /// Degrees Celsius
    #[schema(value_type = Option<f64>)]
    pub temp: Option<FieldValue>,
    /// Total dissolved solids, ppm
    #[serde(rename = "TDS", alias = "tds")]
    #[schema(value_type = Option<f64>)]
    pub tds: Option<FieldValue>,
    #[serde(rename = "pH", alias = "ph")]
    #[schema(value_type = Option<f64>)]
    pub ph: Option<FieldValue>,
    /// Oxidation-reduction potential, mV
    #[serde(rename = "ORP", alias = "orp")]
    #[schema(value_type = Option<f64>)]
    pub orp: Option<FieldValue>,
    /// Turbidity, NTU
    #[serde(rename = "TUR", alias = "tur")]
    #[schema(value_type = Option<f64>)]
    pub tur: Option<FieldValue>,
    #[serde(rename = "UID", alias = "uid")]
    #[schema(value_type = Option<String>)]
    pub uid: Option<FieldValue>,
}

impl SubmissionFields {
    /// The UID as sent, if it decoded as a string.
    pub fn raw_uid(&self) -> Option<&str> {
        self.uid.as_ref().and_then(FieldValue::as_str)
    }
}

/// Raw query string of `GET /data`, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryFields {
    #[serde(rename = "UID", alias = "uid")]
    pub uid: Option<String>,
    pub filter: Option<String>,
}

impl QueryFields {
    pub fn raw_uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }
}
