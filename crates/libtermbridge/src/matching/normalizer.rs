use std::sync::LazyLock;

use regex::Regex;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").expect("invalid non-word pattern"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace pattern"));

/// Lowercase, replace punctuation with spaces and collapse whitespace.
pub fn normalize(text: Option<&str>) -> String {
  let Some(text) = text else {
    return String::new();
  };

  let lower = text.to_lowercase();
  let stripped = NON_WORD.replace_all(&lower, " ");

  WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
  use super::normalize;

  #[test]
  fn normalize_missing() {
    assert_eq!(normalize(None), "");
    assert_eq!(normalize(Some("")), "");
    assert_eq!(normalize(Some("  ,;  ")), "");
  }

  #[test]
  fn normalize_punctuation() {
    assert_eq!(normalize(Some("Gastro-intestinal disorders")), "gastro intestinal disorders");
    assert_eq!(normalize(Some("Head, brain, nerve  disorders.")), "head brain nerve disorders");
    assert_eq!(normalize(Some("  Vāta\tdoṣa (imbalance) ")), "vāta doṣa imbalance");
  }

  #[test]
  fn normalize_keeps_word_characters() {
    assert_eq!(normalize(Some("snake_case 42")), "snake_case 42");
  }
}
