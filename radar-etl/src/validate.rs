//! Structural checks every budget document should pass.

use crate::Validator;
use async_trait::async_trait;
use radar_core::{BudgetDocument, RadarResult};
use std::ops::RangeInclusive;

/// Rejects documents with missing identity fields or implausible figures.
#[derive(Debug, Clone)]
pub struct BasicValidator {
    years: RangeInclusive<i32>,
    allow_negative: bool,
}

impl Default for BasicValidator {
    fn default() -> Self {
        Self {
            years: 1900..=2100,
            allow_negative: false,
        }
    }
}

impl BasicValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_years(mut self, years: RangeInclusive<i32>) -> Self {
        self.years = years;
        self
    }

    /// Accept negative amounts, e.g. for budget corrections.
    pub fn allow_negative(mut self) -> Self {
        self.allow_negative = true;
        self
    }

    fn check(&self, document: &BudgetDocument) -> Vec<String> {
        let mut errors = Vec::new();
        let label = if document.city_name.trim().is_empty() {
            "<unknown city>"
        } else {
            document.city_name.as_str()
        };

        if document.city_name.trim().is_empty() {
            errors.push("city_name is empty".to_string());
        }
        if document.category.trim().is_empty() {
            errors.push(format!("{}: category is empty", label));
        }
        if !self.years.contains(&document.year) {
            errors.push(format!(
                "{}: year {} outside {}..={}",
                label,
                document.year,
                self.years.start(),
                self.years.end()
            ));
        }
        if !document.amount.is_finite() {
            errors.push(format!("{}: amount is not a finite number", label));
        } else if document.amount < 0.0 && !self.allow_negative {
            errors.push(format!("{}: amount {} is negative", label, document.amount));
        }
        errors
    }
}

#[async_trait]
impl Validator for BasicValidator {
    fn name(&self) -> &str {
        "basic"
    }

    async fn validate(&self, document: &BudgetDocument) -> RadarResult<bool> {
        Ok(self.check(document).is_empty())
    }

    fn validation_errors(&self, document: &BudgetDocument) -> Vec<String> {
        self.check(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_core::SourceType;

    fn doc() -> BudgetDocument {
        BudgetDocument::new("Paris", 2024, "voirie", 1_250_000.0, SourceType::Pdf)
    }

    #[tokio::test]
    async fn test_accepts_well_formed_document() {
        let validator = BasicValidator::new();
        assert!(validator.validate(&doc()).await.unwrap());
        assert!(validator.validation_errors(&doc()).is_empty());
    }

    #[tokio::test]
    async fn test_reports_every_problem() {
        let mut document = doc();
        document.city_name = " ".to_string();
        document.category = String::new();
        document.year = 1850;
        document.amount = f64::NAN;

        let validator = BasicValidator::new();
        assert!(!validator.validate(&document).await.unwrap());
        let errors = validator.validation_errors(&document);
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0], "city_name is empty");
        assert!(errors[2].contains("year 1850"));
    }

    #[tokio::test]
    async fn test_negative_amounts() {
        let mut document = doc();
        document.amount = -10.0;
        assert!(!BasicValidator::new().validate(&document).await.unwrap());
        assert!(BasicValidator::new()
            .allow_negative()
            .validate(&document)
            .await
            .unwrap());
    }

    #[test]
    fn test_custom_year_range() {
        let validator = BasicValidator::new().with_years(2020..=2025);
        let mut document = doc();
        document.year = 2019;
        assert_eq!(
            validator.validation_errors(&document),
            vec!["Paris: year 2019 outside 2020..=2025"]
        );
    }
}
