use std::{fmt, str::FromStr};

use bon::bon;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::TermBridgeError;

pub const NAMASTE_SYSTEM: &str = "https://ayush.gov.in/fhir/CodeSystem/namaste";
pub const ICD11_SYSTEM: &str = "http://id.who.int/icd/release/11/mms";

const EMPTY: [String; 0] = [];

/// Descriptive fields a code record can carry, in the order they are
/// concatenated into searchable text.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextField {
  Display,
  Title,
  NameEnglish,
  Description,
  Definition,
  LongDefinition,
  NativeTerm,
  ShortDefinition,
  /// NAMASTE long definition, which ranks after the short one.
  SourceLongDefinition,
  Synonyms,
  Inclusions,
}

pub const SEARCHABLE_FIELDS: &[TextField] = &[
  TextField::Display,
  TextField::Title,
  TextField::NameEnglish,
  TextField::Description,
  TextField::Definition,
  TextField::LongDefinition,
  TextField::NativeTerm,
  TextField::ShortDefinition,
  TextField::SourceLongDefinition,
  TextField::Synonyms,
  TextField::Inclusions,
];

pub trait HasText {
  fn code(&self) -> &str;
  fn display(&self) -> Option<&str>;
  fn field(&self, field: TextField) -> &[String];
}

/// A NAMASTE term record.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct SourceCode {
  pub code: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub display: Option<String>,
  #[serde(default, alias = "nameEnglish", skip_serializing_if = "Option::is_none")]
  pub name_english: Option<String>,
  #[serde(default, alias = "namcTerm", skip_serializing_if = "Option::is_none")]
  pub namc_term: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, alias = "shortDefinition", skip_serializing_if = "Option::is_none")]
  pub short_definition: Option<String>,
  #[serde(default, alias = "longDefinition", skip_serializing_if = "Option::is_none")]
  pub long_definition: Option<String>,
  #[serde(default, alias = "systemName", skip_serializing_if = "Option::is_none")]
  pub system_name: Option<String>,
}

impl HasText for SourceCode {
  fn code(&self) -> &str {
    &self.code
  }

  fn display(&self) -> Option<&str> {
    self.display.as_deref().or(self.name_english.as_deref()).or(self.namc_term.as_deref())
  }

  fn field(&self, field: TextField) -> &[String] {
    match field {
      TextField::Display => self.display.as_slice(),
      TextField::NameEnglish => self.name_english.as_slice(),
      TextField::Description => self.description.as_slice(),
      TextField::NativeTerm => self.namc_term.as_slice(),
      TextField::ShortDefinition => self.short_definition.as_slice(),
      TextField::SourceLongDefinition => self.long_definition.as_slice(),
      TextField::Title | TextField::Definition | TextField::LongDefinition | TextField::Synonyms | TextField::Inclusions => &EMPTY,
    }
  }
}

#[bon]
impl SourceCode {
  #[builder]
  pub fn builder(
    #[builder(start_fn)] code: &str,
    display: Option<&str>,
    name_english: Option<&str>,
    namc_term: Option<&str>,
    description: Option<&str>,
    short_definition: Option<&str>,
    long_definition: Option<&str>,
    system_name: Option<&str>,
  ) -> SourceCode {
    SourceCode {
      code: code.to_string(),
      display: display.map(ToString::to_string),
      name_english: name_english.map(ToString::to_string),
      namc_term: namc_term.map(ToString::to_string),
      description: description.map(ToString::to_string),
      short_definition: short_definition.map(ToString::to_string),
      long_definition: long_definition.map(ToString::to_string),
      system_name: system_name.map(ToString::to_string),
    }
  }
}

/// An ICD-11 entry.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct TargetCode {
  pub code: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub display: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub definition: Option<String>,
  #[serde(default, alias = "longDefinition", skip_serializing_if = "Option::is_none")]
  pub long_definition: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub synonyms: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub inclusions: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub chapter: Option<String>,
}

impl HasText for TargetCode {
  fn code(&self) -> &str {
    &self.code
  }

  fn display(&self) -> Option<&str> {
    self.title.as_deref().or(self.display.as_deref())
  }

  fn field(&self, field: TextField) -> &[String] {
    match field {
      TextField::Display => self.display.as_slice(),
      TextField::Title => self.title.as_slice(),
      TextField::Definition => self.definition.as_slice(),
      TextField::LongDefinition => self.long_definition.as_slice(),
      TextField::Synonyms => &self.synonyms,
      TextField::Inclusions => &self.inclusions,
      TextField::NameEnglish | TextField::Description | TextField::NativeTerm | TextField::ShortDefinition | TextField::SourceLongDefinition => &EMPTY,
    }
  }
}

#[bon]
impl TargetCode {
  #[builder]
  pub fn builder(
    #[builder(start_fn)] code: &str,
    title: Option<&str>,
    display: Option<&str>,
    definition: Option<&str>,
    long_definition: Option<&str>,
    synonyms: Option<&[&str]>,
    inclusions: Option<&[&str]>,
    chapter: Option<&str>,
  ) -> TargetCode {
    TargetCode {
      code: code.to_string(),
      title: title.map(ToString::to_string),
      display: display.map(ToString::to_string),
      definition: definition.map(ToString::to_string),
      long_definition: long_definition.map(ToString::to_string),
      synonyms: synonyms.unwrap_or_default().iter().map(ToString::to_string).collect(),
      inclusions: inclusions.unwrap_or_default().iter().map(ToString::to_string).collect(),
      chapter: chapter.map(ToString::to_string),
    }
  }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
  High,
  Medium,
  Low,
}

impl ConfidenceTier {
  pub fn as_str(&self) -> &'static str {
    match self {
      ConfidenceTier::High => "high",
      ConfidenceTier::Medium => "medium",
      ConfidenceTier::Low => "low",
    }
  }

  pub fn equivalence(&self) -> Equivalence {
    match self {
      ConfidenceTier::High => Equivalence::Equivalent,
      ConfidenceTier::Medium => Equivalence::RelatedTo,
      ConfidenceTier::Low => Equivalence::Inexact,
    }
  }
}

impl fmt::Display for ConfidenceTier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ConfidenceTier {
  type Err = TermBridgeError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "high" => Ok(ConfidenceTier::High),
      "medium" => Ok(ConfidenceTier::Medium),
      "low" => Ok(ConfidenceTier::Low),
      other => Err(TermBridgeError::OtherError(anyhow::anyhow!("unknown confidence tier: {other}"))),
    }
  }
}

/// Subset of the FHIR R4 ConceptMapEquivalence value set.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Equivalence {
  Equivalent,
  RelatedTo,
  Inexact,
}

impl Equivalence {
  pub fn as_str(&self) -> &'static str {
    match self {
      Equivalence::Equivalent => "equivalent",
      Equivalence::RelatedTo => "relatedto",
      Equivalence::Inexact => "inexact",
    }
  }
}

impl FromStr for Equivalence {
  type Err = TermBridgeError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "equivalent" => Ok(Equivalence::Equivalent),
      "relatedto" => Ok(Equivalence::RelatedTo),
      "inexact" => Ok(Equivalence::Inexact),
      other => Err(TermBridgeError::OtherError(anyhow::anyhow!("unknown equivalence: {other}"))),
    }
  }
}

/// Composite similarity and the four sub-scores it was computed from, all in [0, 1].
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct SimilarityResult {
  pub score: f64,
  pub ratio: f64,
  pub partial_ratio: f64,
  pub token_sort_ratio: f64,
  pub token_set_ratio: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Mapping {
  pub source_code: String,
  pub target_code: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub target_display: Option<String>,
  pub score: f64,
  pub confidence: ConfidenceTier,
  pub equivalence: Equivalence,
  pub details: SimilarityResult,
  pub source_text: String,
  pub target_text: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct StoredMapping {
  pub id: i64,
  #[serde(flatten)]
  pub mapping: Mapping,
  pub created_at: Timestamp,
  pub updated_at: Timestamp,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MappingFilter {
  pub source_code: Option<String>,
  pub target_code: Option<String>,
  pub confidence: Option<ConfidenceTier>,
  pub min_score: Option<f64>,
  pub limit: Option<usize>,
  pub offset: Option<usize>,
}

impl MappingFilter {
  pub(crate) fn matches(&self, mapping: &Mapping) -> bool {
    self.source_code.as_ref().is_none_or(|code| code == &mapping.source_code)
      && self.target_code.as_ref().is_none_or(|code| code == &mapping.target_code)
      && self.confidence.is_none_or(|tier| tier == mapping.confidence)
      && self.min_score.is_none_or(|min| mapping.score >= min)
  }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub enum CodeSystem {
  #[serde(rename = "namaste")]
  Namaste,
  #[serde(rename = "icd11")]
  Icd11,
}

impl CodeSystem {
  pub fn id(&self) -> &'static str {
    match self {
      CodeSystem::Namaste => "namaste",
      CodeSystem::Icd11 => "icd11",
    }
  }

  pub fn uri(&self) -> &'static str {
    match self {
      CodeSystem::Namaste => NAMASTE_SYSTEM,
      CodeSystem::Icd11 => ICD11_SYSTEM,
    }
  }

  pub fn title(&self) -> &'static str {
    match self {
      CodeSystem::Namaste => "NAMASTE",
      CodeSystem::Icd11 => "ICD-11 MMS",
    }
  }
}

impl FromStr for CodeSystem {
  type Err = TermBridgeError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "namaste" | NAMASTE_SYSTEM => Ok(CodeSystem::Namaste),
      "icd11" | "icd-11" | ICD11_SYSTEM => Ok(CodeSystem::Icd11),
      other => Err(TermBridgeError::InvalidCode(format!("unknown code system: {other}"))),
    }
  }
}

/// A resolved code from either terminology.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum CodeEntry {
  Source(SourceCode),
  Target(TargetCode),
}

impl CodeEntry {
  pub fn system(&self) -> CodeSystem {
    match self {
      CodeEntry::Source(_) => CodeSystem::Namaste,
      CodeEntry::Target(_) => CodeSystem::Icd11,
    }
  }

  pub fn as_text(&self) -> &dyn HasText {
    match self {
      CodeEntry::Source(code) => code,
      CodeEntry::Target(code) => code,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn source_code_fields() {
    let code = SourceCode::builder("AAA-1").display("Jwara").short_definition("Fever").build();

    assert_eq!(code.field(TextField::Display), ["Jwara"]);
    assert_eq!(code.field(TextField::ShortDefinition), ["Fever"]);
    assert!(code.field(TextField::Synonyms).is_empty());
    assert_eq!(code.display(), Some("Jwara"));
  }

  #[test]
  fn source_code_display_fallback() {
    let code = SourceCode::builder("AAA-1").namc_term("jvaraH").build();

    assert_eq!(code.display(), Some("jvaraH"));
  }

  #[test]
  fn target_code_deserialize_aliases() {
    let code: TargetCode = serde_json::from_str(r#"{"code": "MG26", "title": "Fever", "longDefinition": "Elevated temperature", "synonyms": ["pyrexia"]}"#).unwrap();

    assert_eq!(code.long_definition.as_deref(), Some("Elevated temperature"));
    assert_eq!(code.field(TextField::Synonyms), ["pyrexia"]);
    assert_eq!(code.display(), Some("Fever"));
  }

  #[test]
  fn tier_equivalence() {
    assert_eq!(ConfidenceTier::High.equivalence(), Equivalence::Equivalent);
    assert_eq!(ConfidenceTier::Medium.equivalence(), Equivalence::RelatedTo);
    assert_eq!(ConfidenceTier::Low.equivalence(), Equivalence::Inexact);
    assert_eq!("medium".parse::<ConfidenceTier>().unwrap(), ConfidenceTier::Medium);
    assert!("other".parse::<ConfidenceTier>().is_err());
  }

  #[test]
  fn code_system_from_str() {
    assert!(matches!("namaste".parse(), Ok(CodeSystem::Namaste)));
    assert!(matches!(ICD11_SYSTEM.parse(), Ok(CodeSystem::Icd11)));
    assert!(matches!("icd-11".parse(), Ok(CodeSystem::Icd11)));
    assert!(matches!("snomed".parse::<CodeSystem>(), Err(TermBridgeError::InvalidCode(_))));
  }
}
