// "<document_id>*<local_filename>" image references
use crate::types::{PaperError, Result};
use std::fmt;
use std::str::FromStr;

pub const SEPARATOR: char = '*';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    pub document_id: String,
    pub file_name: String,
}

impl ImageRef {
    pub fn new(document_id: &str, file_name: &str) -> Result<Self> {
        validate_component(document_id)?;
        validate_component(file_name)?;
        Ok(Self {
            document_id: document_id.to_string(),
            file_name: file_name.to_string(),
        })
    }

    pub fn parse(reference: &str) -> Result<Self> {
        let (document_id, file_name) = reference
            .split_once(SEPARATOR)
            .ok_or_else(|| PaperError::InvalidDocumentId(format!("missing '{}' in {:?}", SEPARATOR, reference)))?;
        Self::new(document_id, file_name)
    }
}

impl FromStr for ImageRef {
    type Err = PaperError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.document_id, SEPARATOR, self.file_name)
    }
}

/// Non-empty, no separator, no path components.
pub fn validate_component(value: &str) -> Result<()> {
    let bad = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(SEPARATOR)
        || value.contains('/')
        || value.contains('\\')
        || value.contains('\0');
    if bad {
        Err(PaperError::InvalidDocumentId(value.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn display_and_parse_agree() {
        let r = ImageRef::new("attention_is_all_you_need", "01_table.png").unwrap();
        assert_eq!(r.to_string(), "attention_is_all_you_need*01_table.png");
        assert_eq!(ImageRef::parse(&r.to_string()).unwrap(), r);
    }

    #[rstest]
    #[case("no-separator.png")]
    #[case("a*b*c.png")]
    #[case("*00_fig.png")]
    #[case("doc*")]
    #[case("../etc*passwd")]
    #[case("doc*../../secret.png")]
    fn malformed_references_are_rejected(#[case] reference: &str) {
        assert!(matches!(ImageRef::parse(reference), Err(PaperError::InvalidDocumentId(_))));
    }
}
