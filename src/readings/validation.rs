use thiserror::Error;

use super::{
    filter::{FilterToken, RECOGNIZED_FILTERS},
    models::{FieldValue, QueryFields, SubmissionFields},
};
use crate::db::models::NewReading;

/// Client-caused request defects. Every variant maps to `400 Bad Request`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("UID is required.")]
    MissingUid,
    /// A reading field is absent or empty. Carries the wire name.
    #[error("Missing required values in the request.")]
    MissingField(&'static str),
    #[error("Invalid UID.")]
    InvalidUid,
    /// A numeric field is present but not a finite number.
    #[error("Invalid value for {0}.")]
    InvalidValue(&'static str),
    #[error("Invalid filter value.")]
    InvalidFilter,
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSubmission {
    pub uid: String,
    pub reading: NewReading,
}

/// A read request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidQuery {
    pub uid: String,
    pub filter: Option<FilterToken>,
}

/// Check a `POST /data` body.
///
/// UID is checked before the reading fields, so a whitespace-only UID is
/// reported as `InvalidUid` whatever else is wrong with the body.
pub fn validate_submission(
    fields: &SubmissionFields,
    require_extended: bool,
) -> Result<ValidSubmission, ValidationError> {
    let uid = match fields.uid.as_ref().filter(|v| !v.is_blank()) {
        None => return Err(ValidationError::MissingField("UID")),
        Some(v) => valid_uid(v.as_str())?,
    };

    let temp = required_number("temp", fields.temp.as_ref())?;
    let tds = required_number("TDS", fields.tds.as_ref())?;
    let ph = required_number("pH", fields.ph.as_ref())?;

    let (orp, tur) = if require_extended {
        (
            Some(required_number("ORP", fields.orp.as_ref())?),
            Some(required_number("TUR", fields.tur.as_ref())?),
        )
    } else {
        (
            optional_number("ORP", fields.orp.as_ref())?,
            optional_number("TUR", fields.tur.as_ref())?,
        )
    };

    Ok(ValidSubmission {
        uid,
        reading: NewReading { temp, tds, ph, orp, tur },
    })
}

/// Check a `GET /data` query string.
pub fn validate_query(fields: &QueryFields) -> Result<ValidQuery, ValidationError> {
    let uid = match fields.uid.as_deref().filter(|s| !s.is_empty()) {
        None => return Err(ValidationError::MissingUid),
        Some(s) => valid_uid(Some(s))?,
    };

    let filter = match fields.filter.as_deref().filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) if RECOGNIZED_FILTERS.contains(&raw) => Some(raw.parse::<FilterToken>()?),
        Some(_) => return Err(ValidationError::InvalidFilter),
    };

    Ok(ValidQuery { uid, filter })
}

fn valid_uid(raw: Option<&str>) -> Result<String, ValidationError> {
    match raw.map(str::trim) {
        Some(uid) if !uid.is_empty() => Ok(uid.to_owned()),
        _ => Err(ValidationError::InvalidUid),
    }
}

fn required_number(
    name: &'static str,
    value: Option<&FieldValue>,
) -> Result<f64, ValidationError> {
    optional_number(name, value)?.ok_or(ValidationError::MissingField(name))
}

fn optional_number(
    name: &'static str,
    value: Option<&FieldValue>,
) -> Result<Option<f64>, ValidationError> {
    match value.filter(|v| !v.is_blank()) {
        None => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or(ValidationError::InvalidValue(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: f64) -> Option<FieldValue> {
        Some(FieldValue::Number(v))
    }

    fn text(s: &str) -> Option<FieldValue> {
        Some(FieldValue::Text(s.to_owned()))
    }

    fn full_submission() -> SubmissionFields {
        SubmissionFields {
            temp: num(25.0),
            tds: num(300.0),
            ph: num(7.0),
            orp: num(250.0),
            tur: num(1.5),
            uid: text("u1"),
        }
    }

    fn query(uid: Option<&str>, filter: Option<&str>) -> QueryFields {
        QueryFields {
            uid: uid.map(str::to_owned),
            filter: filter.map(str::to_owned),
        }
    }

    // -----------------------------------------------------------------------
    // validate_submission
    // -----------------------------------------------------------------------

    #[test]
    fn complete_submission_is_accepted() {
        let valid = validate_submission(&full_submission(), true).unwrap();
        assert_eq!(valid.uid, "u1");
        assert_eq!(
            valid.reading,
            NewReading { temp: 25.0, tds: 300.0, ph: 7.0, orp: Some(250.0), tur: Some(1.5) }
        );
    }

    #[test]
    fn each_core_field_is_required() {
        let cases: [(&str, fn(&mut SubmissionFields)); 4] = [
            ("temp", |f: &mut SubmissionFields| f.temp = None),
            ("TDS", |f: &mut SubmissionFields| f.tds = None),
            ("pH", |f: &mut SubmissionFields| f.ph = None),
            ("UID", |f: &mut SubmissionFields| f.uid = None),
        ];
        for (name, clear) in cases {
            let mut fields = full_submission();
            clear(&mut fields);
            assert_eq!(
                validate_submission(&fields, false).unwrap_err(),
                ValidationError::MissingField(name)
            );
        }
    }

    #[test]
    fn empty_strings_count_as_missing() {
        let mut fields = full_submission();
        fields.tds = text("");
        assert_eq!(
            validate_submission(&fields, false).unwrap_err(),
            ValidationError::MissingField("TDS")
        );

        let mut fields = full_submission();
        fields.uid = text("");
        assert_eq!(
            validate_submission(&fields, false).unwrap_err(),
            ValidationError::MissingField("UID")
        );
    }

    #[test]
    fn extended_fields_required_only_when_flag_set() {
        let mut fields = full_submission();
        fields.orp = None;
        fields.tur = None;

        assert_eq!(
            validate_submission(&fields, true).unwrap_err(),
            ValidationError::MissingField("ORP")
        );

        let valid = validate_submission(&fields, false).unwrap();
        assert_eq!(valid.reading.orp, None);
        assert_eq!(valid.reading.tur, None);
    }

    #[test]
    fn missing_tur_alone_is_reported_when_extended() {
        let mut fields = full_submission();
        fields.tur = text("");
        assert_eq!(
            validate_submission(&fields, true).unwrap_err(),
            ValidationError::MissingField("TUR")
        );
    }

    #[test]
    fn whitespace_uid_is_invalid_regardless_of_other_fields() {
        let fields = SubmissionFields { uid: text("   "), ..Default::default() };
        assert_eq!(
            validate_submission(&fields, true).unwrap_err(),
            ValidationError::InvalidUid
        );
    }

    #[test]
    fn non_string_uid_is_invalid() {
        for uid in [
            FieldValue::Number(42.0),
            FieldValue::Other(serde_json::json!(true)),
            FieldValue::Other(serde_json::json!(["u1"])),
        ] {
            let mut fields = full_submission();
            fields.uid = Some(uid.clone());
            assert_eq!(
                validate_submission(&fields, false).unwrap_err(),
                ValidationError::InvalidUid,
                "UID {uid:?} should be rejected"
            );
        }
    }

    #[test]
    fn uid_is_checked_before_mistyped_fields() {
        let fields = SubmissionFields {
            uid: text("   "),
            temp: Some(FieldValue::Other(serde_json::json!(false))),
            ..Default::default()
        };
        assert_eq!(
            validate_submission(&fields, false).unwrap_err(),
            ValidationError::InvalidUid
        );
    }

    #[test]
    fn uid_is_trimmed() {
        let mut fields = full_submission();
        fields.uid = text("  u1 ");
        assert_eq!(validate_submission(&fields, true).unwrap().uid, "u1");
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let fields = SubmissionFields {
            temp: text("25.5"),
            tds: text("300"),
            ph: text(" 7 "),
            orp: None,
            tur: None,
            uid: text("u1"),
        };
        let valid = validate_submission(&fields, false).unwrap();
        assert_eq!(valid.reading.temp, 25.5);
        assert_eq!(valid.reading.tds, 300.0);
        assert_eq!(valid.reading.ph, 7.0);
    }

    #[test]
    fn zero_is_a_valid_measurement() {
        let mut fields = full_submission();
        fields.temp = num(0.0);
        fields.tur = text("0");
        let valid = validate_submission(&fields, true).unwrap();
        assert_eq!(valid.reading.temp, 0.0);
        assert_eq!(valid.reading.tur, Some(0.0));
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        let mut fields = full_submission();
        fields.ph = text("neutral");
        assert_eq!(
            validate_submission(&fields, false).unwrap_err(),
            ValidationError::InvalidValue("pH")
        );

        let mut fields = full_submission();
        fields.orp = text("inf");
        assert_eq!(
            validate_submission(&fields, false).unwrap_err(),
            ValidationError::InvalidValue("ORP")
        );

        let mut fields = full_submission();
        fields.temp = Some(FieldValue::Other(serde_json::json!(true)));
        assert_eq!(
            validate_submission(&fields, false).unwrap_err(),
            ValidationError::InvalidValue("temp")
        );

        let mut fields = full_submission();
        fields.tds = Some(FieldValue::Other(serde_json::json!([300])));
        assert_eq!(
            validate_submission(&fields, false).unwrap_err(),
            ValidationError::InvalidValue("TDS")
        );
    }

    // -----------------------------------------------------------------------
    // validate_query
    // -----------------------------------------------------------------------

    #[test]
    fn query_without_uid_is_rejected() {
        assert_eq!(
            validate_query(&query(None, Some("top10"))).unwrap_err(),
            ValidationError::MissingUid
        );
        assert_eq!(
            validate_query(&query(Some(""), None)).unwrap_err(),
            ValidationError::MissingUid
        );
    }

    #[test]
    fn query_with_blank_uid_is_invalid() {
        assert_eq!(
            validate_query(&query(Some("  "), None)).unwrap_err(),
            ValidationError::InvalidUid
        );
    }

    #[test]
    fn query_accepts_every_recognized_filter() {
        for raw in RECOGNIZED_FILTERS {
            let valid = validate_query(&query(Some("u1"), Some(raw))).unwrap();
            assert_eq!(valid.filter.map(|t| t.to_string()).as_deref(), Some(raw));
        }
    }

    #[test]
    fn query_rejects_unrecognized_filters() {
        for raw in ["5x", "3h", "48h", "1hour", "top100", "all"] {
            assert_eq!(
                validate_query(&query(Some("u1"), Some(raw))).unwrap_err(),
                ValidationError::InvalidFilter,
                "filter {raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn absent_or_empty_filter_is_none() {
        assert_eq!(validate_query(&query(Some("u1"), None)).unwrap().filter, None);
        assert_eq!(validate_query(&query(Some("u1"), Some(""))).unwrap().filter, None);
    }
}
