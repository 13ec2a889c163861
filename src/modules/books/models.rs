use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned identifier of a book.
pub type BookId = Uuid;

/// One catalog title and its stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier, assigned by the store on creation
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// Free-text classification tag
    pub category: String,
    pub published_year: i32,
    /// Copies currently in stock
    pub available_copies: u32,
}

/// Validated record ready to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub category: String,
    pub published_year: i32,
    pub available_copies: u32,
}

impl NewBook {
    pub fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            category: self.category,
            published_year: self.published_year,
            available_copies: self.available_copies,
        }
    }
}

/// Request body for creating a book.
///
/// Every field is optional so that missing fields surface as field-level
/// validation errors rather than an opaque decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookCandidate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub published_year: Option<i64>,
    pub available_copies: Option<i64>,
}

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub error: &'static str,
}

impl FieldError {
    fn new(field: &'static str, error: &'static str) -> Self {
        Self { field, error }
    }
}

fn required_text(
    value: Option<String>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> String {
    match value.map(|v| v.trim().to_string()) {
        Some(text) if !text.is_empty() => text,
        Some(_) => {
            errors.push(FieldError::new(field, "must not be empty"));
            String::new()
        }
        None => {
            errors.push(FieldError::new(field, "required"));
            String::new()
        }
    }
}

impl BookCandidate {
    /// Check every field, collecting all failures before giving up.
    pub fn validate(self) -> Result<NewBook, Vec<FieldError>> {
        let mut errors = Vec::new();

        let title = required_text(self.title, "title", &mut errors);
        let author = required_text(self.author, "author", &mut errors);
        let category = required_text(self.category, "category", &mut errors);

        let published_year = match self.published_year {
            Some(year) => i32::try_from(year).unwrap_or_else(|_| {
                errors.push(FieldError::new("publishedYear", "out of range"));
                0
            }),
            None => {
                errors.push(FieldError::new("publishedYear", "required"));
                0
            }
        };

        let available_copies = match self.available_copies {
            Some(copies) if copies < 0 => {
                errors.push(FieldError::new("availableCopies", "must not be negative"));
                0
            }
            Some(copies) => u32::try_from(copies).unwrap_or_else(|_| {
                errors.push(FieldError::new("availableCopies", "out of range"));
                0
            }),
            None => {
                errors.push(FieldError::new("availableCopies", "required"));
                0
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewBook {
            title,
            author,
            category,
            published_year,
            available_copies,
        })
    }
}

/// Request body for `PUT /books/{id}/copies`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CopiesChange {
    /// Signed adjustment applied to the available copies
    pub change: i64,
}

/// Request body for `PUT /books/{id}/category`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryChange {
    pub category: String,
}

/// Direct field update applied by the store. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub category: Option<String>,
    pub available_copies: Option<u32>,
}

impl BookPatch {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.available_copies.is_none()
    }

    pub fn apply(&self, book: &mut Book) {
        if let Some(category) = &self.category {
            book.category = category.clone();
        }
        if let Some(copies) = self.available_copies {
            book.available_copies = copies;
        }
    }
}

/// Outcome of an atomic conditional copy adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopiesUpdate {
    Applied(Book),
    /// The resulting stock would leave `0..=u32::MAX`; nothing was written
    OutOfRange { available: u32 },
    Missing,
}

/// Outcome of a delete that only succeeds on an out-of-stock record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    /// Copies remain; nothing was removed
    InStock { available: u32 },
    Missing,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dune() -> BookCandidate {
        BookCandidate {
            title: Some("Dune".to_string()),
            author: Some("Herbert".to_string()),
            category: Some("SciFi".to_string()),
            published_year: Some(1965),
            available_copies: Some(3),
        }
    }

    #[test]
    fn complete_candidate_is_accepted() {
        let book = dune().validate().unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.published_year, 1965);
        assert_eq!(book.available_copies, 3);
    }

    #[test]
    fn text_fields_are_trimmed() {
        let candidate = BookCandidate {
            title: Some("  Dune ".to_string()),
            ..dune()
        };
        assert_eq!(candidate.validate().unwrap().title, "Dune");
    }

    #[test]
    fn every_missing_field_is_reported() {
        let errors = BookCandidate::default().validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["title", "author", "category", "publishedYear", "availableCopies"]
        );
        assert!(errors.iter().all(|e| e.error == "required"));
    }

    #[test]
    fn blank_and_negative_values_are_rejected() {
        let candidate = BookCandidate {
            author: Some("   ".to_string()),
            available_copies: Some(-1),
            ..dune()
        };
        let errors = candidate.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                FieldError::new("author", "must not be empty"),
                FieldError::new("availableCopies", "must not be negative"),
            ]
        );
    }

    #[test]
    fn oversized_numbers_are_rejected() {
        let candidate = BookCandidate {
            published_year: Some(i64::MAX),
            available_copies: Some(i64::from(u32::MAX) + 1),
            ..dune()
        };
        let errors = candidate.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.error == "out of range"));
    }

    #[test]
    fn candidate_uses_camel_case_on_the_wire() {
        let candidate: BookCandidate = serde_json::from_value(serde_json::json!({
            "title": "Dune",
            "author": "Herbert",
            "category": "SciFi",
            "publishedYear": 1965,
            "availableCopies": 3
        }))
        .unwrap();
        assert_eq!(candidate.published_year, Some(1965));
        assert_eq!(candidate.available_copies, Some(3));
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut book = dune().validate().unwrap().into_book(BookId::nil());
        BookPatch::category("Classics").apply(&mut book);
        assert_eq!(book.category, "Classics");
        assert_eq!(book.available_copies, 3);
        assert!(BookPatch::default().is_empty());
    }
}
