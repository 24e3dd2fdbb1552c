use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

use crate::ipc::error::HandlerErr;
use crate::model;
use crate::store::Record;

fn present<'a>(params: &'a Value, key: &str) -> Option<&'a Value> {
    params.get(key).filter(|v| !v.is_null())
}

pub fn optional_i64(params: &Value, key: &str) -> Result<Option<i64>, HandlerErr> {
    let Some(v) = present(params, key) else {
        return Ok(None);
    };
    v.as_i64()
        .map(Some)
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be an integer", key)))
}

pub fn required_i64(params: &Value, key: &str) -> Result<i64, HandlerErr> {
    optional_i64(params, key)?.ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn required_f64(params: &Value, key: &str) -> Result<f64, HandlerErr> {
    let Some(v) = present(params, key) else {
        return Err(HandlerErr::bad_params(format!("missing {}", key)));
    };
    v.as_f64()
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a number", key)))
}

pub fn optional_str(params: &Value, key: &str) -> Result<Option<String>, HandlerErr> {
    let Some(v) = present(params, key) else {
        return Ok(None);
    };
    v.as_str()
        .map(|s| Some(s.to_string()))
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a string", key)))
}

pub fn required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    optional_str(params, key)?.ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn optional_bool(params: &Value, key: &str) -> Result<Option<bool>, HandlerErr> {
    let Some(v) = present(params, key) else {
        return Ok(None);
    };
    v.as_bool()
        .map(Some)
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a boolean", key)))
}

pub fn parse_date(key: &str, raw: &str) -> Result<NaiveDate, HandlerErr> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| HandlerErr {
        code: "bad_params",
        message: format!("{} must be YYYY-MM-DD", key),
        details: Some(json!({ key: raw })),
    })
}

pub fn optional_date(params: &Value, key: &str) -> Result<Option<NaiveDate>, HandlerErr> {
    match optional_str(params, key)? {
        Some(raw) => parse_date(key, &raw).map(Some),
        None => Ok(None),
    }
}

pub fn required_date(params: &Value, key: &str) -> Result<NaiveDate, HandlerErr> {
    let raw = required_str(params, key)?;
    parse_date(key, &raw)
}

/// `params.today` when the caller pins the calendar day, else the local date.
pub fn today(params: &Value) -> Result<NaiveDate, HandlerErr> {
    Ok(optional_date(params, "today")?.unwrap_or_else(model::today))
}

/// Parses an optional enum-valued string through `parse`, naming the accepted
/// values on failure.
pub fn optional_enum<T>(
    params: &Value,
    key: &str,
    parse: fn(&str) -> Option<T>,
    accepted: &str,
) -> Result<Option<T>, HandlerErr> {
    match optional_str(params, key)? {
        Some(raw) => parse(&raw).map(Some).ok_or_else(|| HandlerErr {
            code: "bad_params",
            message: format!("{} must be one of: {}", key, accepted),
            details: Some(json!({ key: raw })),
        }),
        None => Ok(None),
    }
}

pub fn required_object<'a>(params: &'a Value, key: &str) -> Result<&'a Value, HandlerErr> {
    match present(params, key) {
        Some(v) if v.is_object() => Ok(v),
        Some(_) => Err(HandlerErr::bad_params(format!("{} must be an object", key))),
        None => Err(HandlerErr::bad_params(format!("missing {}", key))),
    }
}

/// Decodes the request params as a new record. Fields the record does not know
/// are ignored.
pub fn parse_draft<R: Record>(params: &Value) -> Result<R, HandlerErr> {
    if !params.is_object() {
        return Err(HandlerErr::bad_params(format!("{} fields must be an object", R::KIND)));
    }
    serde_json::from_value(params.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid {}: {}", R::KIND, e)))
}

/// `{ <key>: value, "revision": n }`
pub fn with_revision<T: Serialize>(key: &str, value: &T, revision: u64) -> Result<Value, HandlerErr> {
    let mut out = serde_json::Map::new();
    out.insert(key.to_string(), serde_json::to_value(value)?);
    out.insert("revision".to_string(), json!(revision));
    Ok(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttendanceStatus, Student};

    #[test]
    fn integers_and_dates_are_checked() {
        let p = json!({ "id": 4, "bad": "4", "date": "2024-09-03", "when": "09/03/2024" });
        assert_eq!(required_i64(&p, "id").expect("id"), 4);
        assert_eq!(required_i64(&p, "bad").expect_err("type").code, "bad_params");
        assert_eq!(optional_i64(&p, "missing").expect("none"), None);
        assert_eq!(
            required_date(&p, "date").expect("date"),
            NaiveDate::from_ymd_opt(2024, 9, 3).expect("date")
        );
        assert!(required_date(&p, "when").is_err());
    }

    #[test]
    fn null_counts_as_absent() {
        let p = json!({ "classId": null });
        assert_eq!(optional_i64(&p, "classId").expect("none"), None);
        assert!(required_i64(&p, "classId").is_err());
        assert_eq!(optional_i64(&Value::Null, "classId").expect("none"), None);
    }

    #[test]
    fn enums_report_accepted_values() {
        let p = json!({ "status": "sick" });
        let e = optional_enum(&p, "status", AttendanceStatus::parse, "present, absent, late")
            .expect_err("bad status");
        assert!(e.message.contains("present, absent, late"));
    }

    #[test]
    fn drafts_decode_from_params() {
        let p = json!({
            "firstName": "Rosa",
            "lastName": "Parks",
            "email": "rosa@school.edu",
            "studentId": "S-9",
            "dateOfBirth": "2008-02-04",
            "gradeLevel": 10
        });
        let s: Student = parse_draft(&p).expect("draft");
        assert_eq!(s.grade_level, 10);
        assert!(parse_draft::<Student>(&json!({ "gradeLevel": "ten" })).is_err());
        assert!(parse_draft::<Student>(&json!([])).is_err());
    }
}
