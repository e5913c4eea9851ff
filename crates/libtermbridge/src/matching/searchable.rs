use itertools::Itertools;

use crate::model::{HasText, SEARCHABLE_FIELDS};

const PLACEHOLDER: &str = "-";

/// Concatenate every usable descriptive value of a record, in field priority order.
///
/// List-valued fields are flattened, and values that are blank or only hold
/// the `-` placeholder are skipped.
pub fn build_searchable_text<T: HasText + ?Sized>(record: &T) -> String {
  SEARCHABLE_FIELDS
    .iter()
    .flat_map(|field| record.field(*field))
    .map(|value| value.trim())
    .filter(|value| !value.is_empty() && *value != PLACEHOLDER)
    .join(" ")
}
