//! Whitelisted field update parsing.

use serde_json::{Map, Value};

use crate::api::handlers::{
    ApiError, normalize_email, valid_age, valid_email, valid_phone, whole_number,
};

/// What an update does to one column.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum FieldChange<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> FieldChange<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: FieldChange<String>,
    pub email: FieldChange<String>,
    pub phone: FieldChange<String>,
    pub age: FieldChange<i32>,
    pub father_number: FieldChange<String>,
}

impl ProfileUpdate {
    /// Parse the allowed keys out of a JSON body, discarding everything else.
    ///
    /// # Errors
    /// `No valid fields provided` when no allowed key is present, otherwise a
    /// per-field validation message.
    pub fn from_json(body: &Value) -> Result<Self, ApiError> {
        let Value::Object(map) = body else {
            return Err(ApiError::BadRequest("No valid fields provided"));
        };

        let update = Self {
            name: parse_field(map, "name", "Invalid name", |text| Some(text.to_string()))?,
            email: parse_field(map, "email", "Invalid email", |text| {
                let email = normalize_email(text);
                valid_email(&email).then_some(email)
            })?,
            phone: parse_field(map, "phone", "Invalid phone", |text| {
                valid_phone(text).then(|| text.to_string())
            })?,
            age: parse_age(map)?,
            father_number: parse_field(map, "fatherNumber", "Invalid father's number", |text| {
                valid_phone(text).then(|| text.to_string())
            })?,
        };

        if update.is_empty() {
            return Err(ApiError::BadRequest("No valid fields provided"));
        }
        Ok(update)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_keep()
            && self.email.is_keep()
            && self.phone.is_keep()
            && self.age.is_keep()
            && self.father_number.is_keep()
    }
}

fn parse_field<F>(
    map: &Map<String, Value>,
    key: &str,
    invalid: &'static str,
    validate: F,
) -> Result<FieldChange<String>, ApiError>
where
    F: Fn(&str) -> Option<String>,
{
    match map.get(key) {
        None => Ok(FieldChange::Keep),
        Some(Value::Null) => Ok(FieldChange::Clear),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(FieldChange::Clear);
            }
            validate(trimmed)
                .map(FieldChange::Set)
                .ok_or(ApiError::BadRequest(invalid))
        }
        Some(_) => Err(ApiError::BadRequest(invalid)),
    }
}

fn parse_age(map: &Map<String, Value>) -> Result<FieldChange<i32>, ApiError> {
    let invalid = ApiError::BadRequest("Invalid age");
    let age = match map.get("age") {
        None => return Ok(FieldChange::Keep),
        Some(Value::Null) => return Ok(FieldChange::Clear),
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(FieldChange::Clear),
        Some(value) => whole_number(value).ok_or(invalid)?,
    };
    if !valid_age(age) {
        return Err(ApiError::BadRequest("Invalid age"));
    }
    i32::try_from(age)
        .map(FieldChange::Set)
        .map_err(|_| ApiError::BadRequest("Invalid age"))
}
