//! PDF export of the person card.

use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::documents::PersonCard;

// A4 in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;

/// Render the card as a single-page PDF and return the raw bytes.
///
/// # Errors
/// Returns an error if content encoding or document serialization fails.
pub fn person_card_pdf(card: &PersonCard) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let content = Content {
        operations: page_operations(card),
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().context("failed to encode PDF content")?,
    ));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                PAGE_WIDTH.into(),
                PAGE_HEIGHT.into(),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .context("failed to serialize PDF document")?;

    Ok(buffer)
}

fn page_operations(card: &PersonCard) -> Vec<Operation> {
    let full_name = [
        Some(card.first_name.as_str()),
        card.father_name.as_deref(),
        Some(card.last_name.as_str()),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");

    let lines = [
        format!("National id: {}", card.national_id),
        format!("Full name: {full_name}"),
        format!(
            "Birth date: {}",
            card.birth_date
                .map_or_else(|| "-".to_string(), |date| date.to_string())
        ),
        format!("Id number: {}", card.id_number.as_deref().unwrap_or("-")),
    ];

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 16.into()]),
        Operation::new("Td", vec![72.into(), 770.into()]),
        Operation::new("Tj", vec![Object::string_literal("Person Card")]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
    ];
    for (index, line) in lines.iter().enumerate() {
        // First offset drops below the title, the rest advance one line.
        let leading = if index == 0 { -36 } else { -18 };
        operations.push(Operation::new("Td", vec![0.into(), leading.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(line.as_str())],
        ));
    }
    operations.push(Operation::new("ET", vec![]));
    operations
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn fixture_card() -> PersonCard {
        PersonCard {
            national_id: "12345".to_string(),
            first_name: "Sami".to_string(),
            father_name: Some("Nour".to_string()),
            last_name: "Haddad".to_string(),
            birth_date: chrono::NaiveDate::from_ymd_opt(1990, 4, 1),
            id_number: Some("A-77".to_string()),
            profile_image_path: None,
            front_image: None,
            back_image: None,
        }
    }

    #[test]
    fn pdf_bytes_carry_the_magic_header() -> Result<()> {
        let bytes = person_card_pdf(&fixture_card())?;
        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert!(bytes.len() > 200);
        Ok(())
    }

    #[test]
    fn pdf_round_trips_through_lopdf() -> Result<()> {
        let bytes = person_card_pdf(&fixture_card())?;
        let parsed = Document::load_mem(&bytes)?;
        assert_eq!(parsed.get_pages().len(), 1);
        Ok(())
    }

    #[test]
    fn missing_optional_fields_render_placeholders() {
        let card = PersonCard {
            father_name: None,
            birth_date: None,
            id_number: None,
            ..fixture_card()
        };
        let operations = page_operations(&card);
        // BT + font + title + font + 4 lines (Td+Tj each) + ET
        assert_eq!(operations.len(), 14);
    }
}
