//! Field validation for index records.
//!
//! Every field of a [`FilingRecord`] is validated at construction time;
//! either all five fields are valid or construction fails with the first
//! error. Partially valid records are not representable.

use chrono::NaiveDate;

use crate::error::ValidationError;

/// Extension every downloadable filing document carries in the index
pub const TEXT_EXT: &str = ".txt";

/// One fully validated row of a period index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingRecord {
    pub cik: u64,
    pub company_name: String,
    pub form_type: String,
    pub date_filed: NaiveDate,
    /// Archive-relative document path, e.g. `edgar/data/.../0001000015-98-000009.txt`
    pub partial_path: String,
}

impl FilingRecord {
    /// Validate all five raw fields; returns the record or the first failure.
    pub fn from_raw(
        cik: &str,
        company_name: &str,
        form_type: &str,
        date_filed: &str,
        partial_path: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            cik: validate_cik(cik)?,
            company_name: validate_company_name(company_name),
            form_type: validate_form_type(form_type)?,
            date_filed: validate_filed_date(date_filed)?,
            partial_path: validate_file_name(partial_path)?,
        })
    }
}

/// Trim and parse the CIK as a positive integer.
pub fn validate_cik(raw: &str) -> Result<u64, ValidationError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<u64>()
        .map_err(|_| ValidationError::InvalidCik(trimmed.to_string()))
}

/// Trim and upper-case the company name. Normalization only, never fails.
pub fn validate_company_name(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Validate a form type such as `10-K`, `NT 10-Q` or `S-1/A`.
///
/// After removing space, `-` and `/`, the remainder must be non-empty and
/// consist solely of upper-case ASCII letters and digits. Returns the
/// trimmed original on success.
pub fn validate_form_type(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let stripped: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '/'))
        .collect();
    let ok = !stripped.is_empty()
        && stripped
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if !ok {
        return Err(ValidationError::InvalidFormType(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Strict `YYYY-M-D` parse; single- or double-digit month and day accepted.
pub fn validate_filed_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(trimmed.to_string()))
}

/// The partial path must denote a plain-text document.
pub fn validate_file_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if !trimmed.ends_with(TEXT_EXT) {
        return Err(ValidationError::InvalidFileName(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cik_parses_with_whitespace() {
        assert_eq!(validate_cik(" 1000015 ").unwrap(), 1000015);
    }

    #[test]
    fn cik_rejects_non_numeric() {
        assert!(matches!(
            validate_cik("12ab"),
            Err(ValidationError::InvalidCik(_))
        ));
    }

    #[test]
    fn cik_rejects_negative() {
        assert!(validate_cik("-5").is_err());
    }

    #[test]
    fn company_name_upper_cased() {
        assert_eq!(validate_company_name("  Magic Company "), "MAGIC COMPANY");
    }

    #[test]
    fn form_type_accepts_standard_codes() {
        for raw in ["10-K", "10-Q", "S-1/A", "NT 10-K", "425", "8-K"] {
            assert_eq!(validate_form_type(raw).unwrap(), raw);
        }
    }

    #[test]
    fn form_type_returns_trimmed_original() {
        assert_eq!(validate_form_type(" 10-K ").unwrap(), "10-K");
    }

    #[test]
    fn form_type_rejects_lower_case() {
        for raw in ["10-k", "s-1", "nT 10-K"] {
            assert!(
                matches!(
                    validate_form_type(raw),
                    Err(ValidationError::InvalidFormType(_))
                ),
                "{raw} should fail"
            );
        }
    }

    #[test]
    fn form_type_rejects_empty_after_strip() {
        assert!(validate_form_type(" - / ").is_err());
        assert!(validate_form_type("").is_err());
    }

    #[test]
    fn filed_date_accepts_single_digit_parts() {
        let d = validate_filed_date("2017-2-9").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2017, 2, 9).unwrap());
    }

    #[test]
    fn filed_date_accepts_padded() {
        assert!(validate_filed_date("1998-03-31").is_ok());
    }

    #[test]
    fn filed_date_rejects_impossible_date() {
        assert!(matches!(
            validate_filed_date("2017-02-31"),
            Err(ValidationError::InvalidDate(_))
        ));
    }

    #[test]
    fn filed_date_rejects_garbage() {
        assert!(validate_filed_date("yesterday").is_err());
    }

    #[test]
    fn file_name_requires_txt() {
        assert!(validate_file_name("edgar/data/1/0001-98-000009.txt").is_ok());
        assert!(matches!(
            validate_file_name("edgar/data/1/index.html"),
            Err(ValidationError::InvalidFileName(_))
        ));
    }

    #[test]
    fn record_from_raw_all_valid() {
        let rec = FilingRecord::from_raw(
            "90810312",
            "Magic Company",
            "10-K",
            "2017-2-9",
            "/edgar/data/08912031231.txt",
        )
        .unwrap();
        assert_eq!(rec.cik, 90810312);
        assert_eq!(rec.company_name, "MAGIC COMPANY");
        assert_eq!(rec.form_type, "10-K");
        assert_eq!(rec.date_filed, NaiveDate::from_ymd_opt(2017, 2, 9).unwrap());
    }

    #[test]
    fn record_from_raw_propagates_first_failure() {
        let err = FilingRecord::from_raw(
            "not-a-cik",
            "X",
            "10-k",
            "bad",
            "a.html",
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCik(_)));
    }
}
