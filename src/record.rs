use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::photo::{self, MAX_PHOTO_BYTES, PhotoError};
use crate::scan;

/// Allergy tags offered by the entry form.
pub const ALLERGY_OPTIONS: &[&str] = &["Nuts", "Dairy", "Seafood", "Eggs"];

/// Class and division choices offered by the entry form.
pub const CLASS_OPTIONS: &[&str] = &[
    "Class 1-A",
    "Class 1-B",
    "Class 2-A",
    "Class 2-B",
    "Class 3-A",
    "Class 3-B",
];

/// Bus routes offered by the entry form.
pub const BUS_ROUTE_OPTIONS: &[&str] = &["Route 1", "Route 2", "Route 3", "Route 4", "Route 5"];

/// One student's card data, as persisted and as embedded in the scan payload.
///
/// Field order is significant: it fixes the key order of the serialized form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub name: String,
    pub roll_number: String,
    pub class_division: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub allergies: Vec<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "blank_as_none"
    )]
    pub photo: Option<String>,
    pub rack_number: String,
    pub bus_route: String,
    pub created_at: String,
}

impl StudentRecord {
    pub fn has_allergies(&self) -> bool {
        !self.allergies.is_empty()
    }
}

/// Form fields a [`DraftRecord`] is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    RollNumber,
    ClassDivision,
    Photo,
    RackNumber,
    BusRoute,
}

impl Field {
    /// Key used by the persisted layout for this field.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::RollNumber => "rollNumber",
            Field::ClassDivision => "classDivision",
            Field::Photo => "photo",
            Field::RackNumber => "rackNumber",
            Field::BusRoute => "busRoute",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single failed form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Transient form state. Nothing here is persisted until it passes [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftRecord {
    pub name: Option<String>,
    pub roll_number: Option<String>,
    pub class_division: Option<String>,
    pub allergies: Vec<String>,
    pub photo: Option<String>,
    pub rack_number: Option<String>,
    pub bus_route: Option<String>,
    /// Submission time; stamped with the current time by [`validate`] when unset.
    pub created_at: Option<String>,
}

impl DraftRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check or uncheck an allergy tag. Checking an already present tag is a no-op.
    pub fn set_allergy(&mut self, tag: &str, checked: bool) {
        if checked {
            if !self.allergies.iter().any(|a| a == tag) {
                self.allergies.push(tag.to_string());
            }
        } else {
            self.allergies.retain(|a| a != tag);
        }
    }

    /// Fix the submission time instead of using the clock.
    pub fn submitted_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }
}

/// Turn a draft into a [`StudentRecord`], or report every failing field.
pub fn validate(draft: &DraftRecord) -> Result<StudentRecord, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = required(&draft.name, Field::Name, "Name is required", &mut errors);
    let roll_number = required(
        &draft.roll_number,
        Field::RollNumber,
        "Roll number is required",
        &mut errors,
    );
    let class_division = required(
        &draft.class_division,
        Field::ClassDivision,
        "Class & Division is required",
        &mut errors,
    );
    let rack_number = required(
        &draft.rack_number,
        Field::RackNumber,
        "Rack number is required",
        &mut errors,
    );
    let bus_route = required(
        &draft.bus_route,
        Field::BusRoute,
        "Bus route is required",
        &mut errors,
    );

    let photo = match draft.photo.as_deref().filter(|p| !p.is_empty()) {
        None => None,
        Some(uri) => match photo::check_upload(uri) {
            Ok(()) => Some(uri.to_string()),
            Err(PhotoError::TooLarge { .. }) => {
                errors.push(FieldError::new(Field::Photo, "Photo must be less than 2MB"));
                None
            }
            Err(err) => {
                errors.push(FieldError::new(Field::Photo, err.to_string()));
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    let created_at = draft
        .created_at
        .clone()
        .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

    let record = StudentRecord {
        name,
        roll_number,
        class_division,
        allergies: draft.allergies.clone(),
        photo,
        rack_number,
        bus_route,
        created_at,
    };
    // the card's scan code carries the whole record, photo included
    if !scan::fits_scan_code(&scan::encode_for_scan(&record)) {
        let error = match record.photo {
            Some(_) => FieldError::new(
                Field::Photo,
                format!(
                    "Photo is too large for the card's scan code (keep it under {} bytes)",
                    MAX_PHOTO_BYTES
                ),
            ),
            None => FieldError::new(Field::Name, "Details are too long for the card's scan code"),
        };
        return Err(vec![error]);
    }
    Ok(record)
}

fn required(
    value: &Option<String>,
    field: Field,
    message: &str,
    errors: &mut Vec<FieldError>,
) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            errors.push(FieldError::new(field, message));
            String::new()
        }
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
