use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Civil-registry person card row.
#[derive(ToSchema, FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct PersonCard {
    pub national_id: String,
    pub first_name: String,
    pub father_name: Option<String>,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub id_number: Option<String>,
    pub profile_image_path: Option<String>,
    pub front_image: Option<String>,
    pub back_image: Option<String>,
}

#[derive(ToSchema, FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct DrivingLicense {
    pub national_id: String,
    pub license_number: String,
    pub category: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub front_image_driver: Option<String>,
    pub back_image_driver: Option<String>,
}

#[derive(ToSchema, FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Passport {
    pub national_id: String,
    pub passport_number: String,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub issuing_authority: Option<String>,
}

/// Generic citizen document row, discriminated by `document_type`.
#[derive(ToSchema, FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct CitizenDocument {
    pub id: i64,
    pub national_id: String,
    pub document_type: String,
    pub title: Option<String>,
    pub document_image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn person_card_serializes_with_image_columns() -> Result<()> {
        let card = PersonCard {
            national_id: "12345".to_string(),
            first_name: "Sami".to_string(),
            father_name: Some("Nour".to_string()),
            last_name: "Haddad".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 4, 1),
            id_number: Some("A-77".to_string()),
            profile_image_path: Some("uploads/p.png".to_string()),
            front_image: None,
            back_image: None,
        };
        let value = serde_json::to_value(&card)?;
        let id = value
            .get("national_id")
            .and_then(serde_json::Value::as_str)
            .context("missing national_id")?;
        assert_eq!(id, "12345");
        assert!(value.get("front_image").is_some_and(serde_json::Value::is_null));
        Ok(())
    }
}
