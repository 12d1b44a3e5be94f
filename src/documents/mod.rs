//! Document store reads and image-URL synthesis.
//!
//! Each document type declares which of its columns hold relative image paths
//! and what the URL-bearing response field is called. [`with_image_urls`]
//! applies that mapping uniformly over the serialized row, so adding an image
//! column is a one-line change to the mapping table.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{info_span, Instrument};

pub mod models;

pub use models::{CitizenDocument, DrivingLicense, Passport, PersonCard};

/// One image column → URL field mapping entry.
pub struct ImageField {
    pub column: &'static str,
    pub url_field: &'static str,
}

pub const PERSON_CARD_IMAGES: &[ImageField] = &[
    ImageField {
        column: "profile_image_path",
        url_field: "profile_image_url",
    },
    ImageField {
        column: "front_image",
        url_field: "front_image_url",
    },
    ImageField {
        column: "back_image",
        url_field: "back_image_url",
    },
];

pub const DRIVING_LICENSE_IMAGES: &[ImageField] = &[
    ImageField {
        column: "front_image_driver",
        url_field: "front_image_url",
    },
    ImageField {
        column: "back_image_driver",
        url_field: "back_image_url",
    },
];

pub const PASSPORT_IMAGES: &[ImageField] = &[];

pub const CITIZEN_DOCUMENT_IMAGES: &[ImageField] = &[ImageField {
    column: "document_image_path",
    url_field: "document_image_url",
}];

/// Filter for the generic `citizen_documents` table.
#[derive(Debug, Clone, Copy)]
pub enum DocumentKind {
    Card,
    Document,
}

impl DocumentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Document => "document",
        }
    }
}

/// Serialize a row and add one absolute URL per mapped image column.
///
/// Paths are stored relative to the upload root; leading `./` or `/` prefixes
/// are stripped before joining with the request's base URL. A NULL path maps
/// to a NULL URL field.
///
/// # Errors
/// Returns an error if the record does not serialize to a JSON object.
pub fn with_image_urls<T: Serialize>(
    record: &T,
    fields: &[ImageField],
    base_url: &str,
) -> Result<Value> {
    let mut value = serde_json::to_value(record).context("failed to serialize document row")?;
    let map = value
        .as_object_mut()
        .context("document row is not a JSON object")?;

    let leading = Regex::new(r"^\.*/").context("invalid path prefix pattern")?;
    let base = base_url.trim_end_matches('/');

    for field in fields {
        let url = map
            .get(field.column)
            .and_then(Value::as_str)
            .filter(|path| !path.trim().is_empty())
            .map(|path| {
                let clean = leading.replace(path, "");
                let clean = clean.trim_start_matches('/');
                Value::String(format!("{base}/{clean}"))
            })
            .unwrap_or(Value::Null);
        map.insert(field.url_field.to_string(), url);
    }

    Ok(value)
}

/// Fetch the citizen's person card, if registered.
///
/// # Errors
/// Returns the store error if the query fails.
pub async fn person_card(
    pool: &PgPool,
    national_id: &str,
) -> Result<Option<PersonCard>, sqlx::Error> {
    let query = "SELECT national_id, first_name, father_name, last_name, birth_date, id_number, \
                 profile_image_path, front_image, back_image \
                 FROM person_card WHERE national_id = $1 LIMIT 1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    sqlx::query_as::<_, PersonCard>(query)
        .bind(national_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
}

/// Fetch the citizen's driving license, if any.
///
/// # Errors
/// Returns the store error if the query fails.
pub async fn driving_license(
    pool: &PgPool,
    national_id: &str,
) -> Result<Option<DrivingLicense>, sqlx::Error> {
    let query = "SELECT national_id, license_number, category, issue_date, expiry_date, \
                 front_image_driver, back_image_driver \
                 FROM driving_licenses WHERE national_id = $1 LIMIT 1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    sqlx::query_as::<_, DrivingLicense>(query)
        .bind(national_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
}

/// Fetch the citizen's passport, if any.
///
/// # Errors
/// Returns the store error if the query fails.
pub async fn passport(pool: &PgPool, national_id: &str) -> Result<Option<Passport>, sqlx::Error> {
    let query = "SELECT national_id, passport_number, issue_date, expiry_date, issuing_authority \
                 FROM passport WHERE national_id = $1 LIMIT 1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    sqlx::query_as::<_, Passport>(query)
        .bind(national_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
}

/// Fetch all generic documents of one kind for the citizen.
///
/// # Errors
/// Returns the store error if the query fails.
pub async fn citizen_documents(
    pool: &PgPool,
    national_id: &str,
    kind: DocumentKind,
) -> Result<Vec<CitizenDocument>, sqlx::Error> {
    let query = "SELECT id, national_id, document_type, title, document_image_path, created_at \
                 FROM citizen_documents WHERE national_id = $1 AND document_type = $2 \
                 ORDER BY created_at DESC";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    sqlx::query_as::<_, CitizenDocument>(query)
        .bind(national_id)
        .bind(kind.as_str())
        .fetch_all(pool)
        .instrument(span)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn fixture_card() -> PersonCard {
        PersonCard {
            national_id: "12345".to_string(),
            first_name: "Sami".to_string(),
            father_name: None,
            last_name: "Haddad".to_string(),
            birth_date: None,
            id_number: None,
            profile_image_path: Some("./uploads/profile.png".to_string()),
            front_image: Some("uploads/front.png".to_string()),
            back_image: None,
        }
    }

    #[test]
    fn image_urls_strip_relative_prefixes() -> Result<()> {
        let value = with_image_urls(&fixture_card(), PERSON_CARD_IMAGES, "http://id.example")?;
        assert_eq!(
            value["profile_image_url"],
            "http://id.example/uploads/profile.png"
        );
        assert_eq!(
            value["front_image_url"],
            "http://id.example/uploads/front.png"
        );
        Ok(())
    }

    #[test]
    fn missing_path_yields_null_url() -> Result<()> {
        let value = with_image_urls(&fixture_card(), PERSON_CARD_IMAGES, "http://id.example")?;
        assert!(value["back_image_url"].is_null());
        // The original path columns stay in place.
        assert_eq!(value["front_image"], "uploads/front.png");
        Ok(())
    }

    #[test]
    fn base_url_trailing_slash_is_collapsed() -> Result<()> {
        let value = with_image_urls(&fixture_card(), PERSON_CARD_IMAGES, "http://id.example/")?;
        assert_eq!(
            value["front_image_url"],
            "http://id.example/uploads/front.png"
        );
        Ok(())
    }

    #[test]
    fn absolute_style_paths_do_not_double_slash() -> Result<()> {
        let mut card = fixture_card();
        card.front_image = Some("/uploads/front.png".to_string());
        let value = with_image_urls(&card, PERSON_CARD_IMAGES, "http://id.example")?;
        assert_eq!(
            value["front_image_url"],
            "http://id.example/uploads/front.png"
        );
        Ok(())
    }

    #[test]
    fn document_kind_filters_are_stable() {
        assert_eq!(DocumentKind::Card.as_str(), "card");
        assert_eq!(DocumentKind::Document.as_str(), "document");
    }
}
