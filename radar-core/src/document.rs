//! Budget documents produced by collectors and parsers.

use crate::Metadata;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Where a document's content was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Pdf,
    Csv,
    Json,
    Web,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Pdf => "pdf",
            SourceType::Csv => "csv",
            SourceType::Json => "json",
            SourceType::Web => "web",
        }
    }

    /// Guess the source type from a file path or URL extension.
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = path.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(SourceType::Pdf),
            "csv" => Some(SourceType::Csv),
            "json" => Some(SourceType::Json),
            "html" | "htm" => Some(SourceType::Web),
            _ => None,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(SourceType::Pdf),
            "csv" => Ok(SourceType::Csv),
            "json" => Ok(SourceType::Json),
            "web" => Ok(SourceType::Web),
            other => Err(format!("unknown source type: {}", other)),
        }
    }
}

/// One piece of extracted municipal budget data.
///
/// Documents are never mutated once a collector or parser has produced them;
/// validators and loaders only borrow them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetDocument {
    pub city_name: String,
    /// Fiscal year
    pub year: i32,
    pub category: String,
    pub amount: f64,
    pub document_url: String,
    pub extracted_text: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub source_type: SourceType,
    pub collection_date: NaiveDate,
}

impl BudgetDocument {
    /// Create a document with empty metadata, collected today.
    pub fn new(
        city_name: impl Into<String>,
        year: i32,
        category: impl Into<String>,
        amount: f64,
        source_type: SourceType,
    ) -> Self {
        Self {
            city_name: city_name.into(),
            year,
            category: category.into(),
            amount,
            document_url: String::new(),
            extracted_text: String::new(),
            metadata: Metadata::new(),
            source_type,
            collection_date: chrono::Utc::now().date_naive(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.document_url = url.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.extracted_text = text.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_collection_date(mut self, date: NaiveDate) -> Self {
        self.collection_date = date;
        self
    }

    /// Stable identifier derived from source URL, city, year and category.
    ///
    /// Used as the primary key when documents are written to a vector store,
    /// so re-collecting the same source overwrites rather than duplicates.
    pub fn document_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.document_url.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.city_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.year.to_le_bytes());
        hasher.update([0u8]);
        hasher.update(self.category.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Text used for embedding: the extracted text, or a synthetic summary
    /// when the source carried no text.
    pub fn embedding_text(&self) -> String {
        if self.extracted_text.trim().is_empty() {
            format!(
                "{} {} {}: {:.2}",
                self.city_name, self.year, self.category, self.amount
            )
        } else {
            self.extracted_text.clone()
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BudgetDocument {
        BudgetDocument::new("Lyon", 2023, "voirie", 1_250_000.0, SourceType::Pdf)
            .with_url("https://lyon.fr/budget-2023.pdf")
            .with_text("Budget voirie 2023")
            .with_collection_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
    }

    #[test]
    fn test_document_id_is_deterministic() {
        let a = sample();
        let b = sample().with_metadata("page", serde_json::json!(4));
        assert_eq!(a.document_id(), b.document_id());
        assert_eq!(a.document_id().len(), 64);
    }

    #[test]
    fn test_document_id_changes_with_key_fields() {
        let a = sample();
        let mut b = sample();
        b.year = 2024;
        assert_ne!(a.document_id(), b.document_id());
    }

    #[test]
    fn test_source_type_serde_lowercase() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["source_type"], "pdf");
        assert_eq!(value["collection_date"], "2024-01-15");
    }

    #[test]
    fn test_source_type_from_path() {
        assert_eq!(SourceType::from_path("a/b/budget.PDF"), Some(SourceType::Pdf));
        assert_eq!(SourceType::from_path("data.csv"), Some(SourceType::Csv));
        assert_eq!(SourceType::from_path("index.html"), Some(SourceType::Web));
        assert_eq!(SourceType::from_path("archive.zip"), None);
    }

    #[test]
    fn test_source_type_from_str() {
        assert_eq!("JSON".parse::<SourceType>(), Ok(SourceType::Json));
        assert!("xlsx".parse::<SourceType>().is_err());
    }

    #[test]
    fn test_embedding_text_falls_back_to_summary() {
        let doc = BudgetDocument::new("Nantes", 2022, "culture", 10.5, SourceType::Csv);
        assert_eq!(doc.embedding_text(), "Nantes 2022 culture: 10.50");
        assert_eq!(sample().embedding_text(), "Budget voirie 2023");
    }
}
