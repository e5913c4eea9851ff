use itertools::Itertools;
use libtermbridge::prelude::*;
use serde_json::{Value, json};

pub const CONCEPT_MAP_ID: &str = "namaste-to-icd11";
pub const CONCEPT_MAP_URL: &str = "https://ayush.gov.in/fhir/ConceptMap/namaste-to-icd11";
pub const SCORE_EXTENSION: &str = "https://ayush.gov.in/fhir/StructureDefinition/mapping-score";

const DEFINITION_FIELDS: &[TextField] = &[TextField::Definition, TextField::Description, TextField::ShortDefinition, TextField::LongDefinition, TextField::SourceLongDefinition];
const DESIGNATION_FIELDS: &[(TextField, &str)] = &[(TextField::NameEnglish, "english"), (TextField::NativeTerm, "native"), (TextField::Synonyms, "synonym")];

fn first_value<'a>(entry: &'a dyn HasText, fields: &[TextField]) -> Option<&'a str> {
  fields
    .iter()
    .flat_map(|field| entry.field(*field))
    .map(|value| value.trim())
    .find(|value| !value.is_empty() && *value != "-")
}

fn designations(entry: &dyn HasText) -> Vec<(&'static str, &str)> {
  DESIGNATION_FIELDS
    .iter()
    .flat_map(|(field, kind)| entry.field(*field).iter().map(move |value| (*kind, value.trim())))
    .filter(|(_, value)| !value.is_empty() && *value != "-" && Some(*value) != entry.display())
    .collect()
}

pub fn capability_statement(version: &str) -> Value {
  json!({
    "resourceType": "CapabilityStatement",
    "status": "active",
    "date": jiff::Timestamp::now().strftime("%Y-%m-%d").to_string(),
    "kind": "instance",
    "software": { "name": "termbridge", "version": version },
    "fhirVersion": "4.0.1",
    "format": ["json"],
    "rest": [{
      "mode": "server",
      "resource": [
        {
          "type": "CodeSystem",
          "interaction": [{ "code": "read" }],
          "operation": [{ "name": "lookup", "definition": "http://hl7.org/fhir/OperationDefinition/CodeSystem-lookup" }],
        },
        {
          "type": "ConceptMap",
          "interaction": [{ "code": "read" }],
          "operation": [{ "name": "translate", "definition": "http://hl7.org/fhir/OperationDefinition/ConceptMap-translate" }],
        },
      ],
    }],
  })
}

pub fn code_system(system: CodeSystem, entries: &[CodeEntry]) -> Value {
  let concepts = entries
    .iter()
    .map(|entry| {
      let text = entry.as_text();
      let mut concept = json!({ "code": text.code() });

      if let Some(display) = text.display() {
        concept["display"] = json!(display);
      }
      if let Some(definition) = first_value(text, DEFINITION_FIELDS) {
        concept["definition"] = json!(definition);
      }

      concept
    })
    .collect::<Vec<_>>();

  json!({
    "resourceType": "CodeSystem",
    "id": system.id(),
    "url": system.uri(),
    "name": system.id(),
    "title": system.title(),
    "status": "active",
    "content": "complete",
    "count": concepts.len(),
    "concept": concepts,
  })
}

pub fn lookup(entry: &CodeEntry) -> Value {
  let text = entry.as_text();
  let mut parameters = vec![json!({ "name": "name", "valueString": entry.system().title() })];

  if let Some(display) = text.display() {
    parameters.push(json!({ "name": "display", "valueString": display }));
  }
  if let Some(definition) = first_value(text, DEFINITION_FIELDS) {
    parameters.push(json!({ "name": "definition", "valueString": definition }));
  }

  for (kind, value) in designations(text) {
    parameters.push(json!({
      "name": "designation",
      "part": [
        { "name": "use", "valueCoding": { "code": kind } },
        { "name": "value", "valueString": value },
      ],
    }));
  }

  json!({ "resourceType": "Parameters", "parameter": parameters })
}

pub fn translate(translation: &Translation) -> Value {
  let mut parameters = vec![json!({ "name": "result", "valueBoolean": !translation.mappings.is_empty() })];

  if translation.mappings.is_empty() {
    parameters.push(json!({ "name": "message", "valueString": format!("no mapping found for code {}", translation.code) }));
  }

  for stored in &translation.mappings {
    let mapping = &stored.mapping;

    let coding = match translation.system {
      CodeSystem::Namaste => {
        let mut coding = json!({ "system": ICD11_SYSTEM, "code": mapping.target_code });

        if let Some(display) = &mapping.target_display {
          coding["display"] = json!(display);
        }

        coding
      }

      CodeSystem::Icd11 => json!({ "system": NAMASTE_SYSTEM, "code": mapping.source_code }),
    };

    parameters.push(json!({
      "name": "match",
      "extension": [{ "url": SCORE_EXTENSION, "valueDecimal": mapping.score }],
      "part": [
        { "name": "equivalence", "valueCode": mapping.equivalence.as_str() },
        { "name": "concept", "valueCoding": coding },
        { "name": "source", "valueUri": CONCEPT_MAP_URL },
      ],
    }));
  }

  json!({ "resourceType": "Parameters", "parameter": parameters })
}

/// ConceptMap holding every stored mapping, one element per NAMASTE code.
pub fn concept_map(mappings: &[StoredMapping]) -> Value {
  let elements = mappings
    .iter()
    .sorted_by(|lhs, rhs| lhs.mapping.source_code.cmp(&rhs.mapping.source_code).then_with(|| rhs.mapping.score.total_cmp(&lhs.mapping.score)))
    .chunk_by(|stored| stored.mapping.source_code.as_str())
    .into_iter()
    .map(|(code, group)| {
      let targets = group
        .map(|stored| {
          let mut target = json!({
            "code": stored.mapping.target_code,
            "equivalence": stored.mapping.equivalence.as_str(),
            "comment": format!("{} confidence, score {:.4}", stored.mapping.confidence, stored.mapping.score),
          });

          if let Some(display) = &stored.mapping.target_display {
            target["display"] = json!(display);
          }

          target
        })
        .collect::<Vec<_>>();

      json!({ "code": code, "target": targets })
    })
    .collect::<Vec<_>>();

  json!({
    "resourceType": "ConceptMap",
    "id": CONCEPT_MAP_ID,
    "url": CONCEPT_MAP_URL,
    "name": "NamasteToIcd11",
    "title": "NAMASTE to ICD-11 MMS",
    "status": "draft",
    "sourceUri": NAMASTE_SYSTEM,
    "targetUri": ICD11_SYSTEM,
    "group": [{
      "source": NAMASTE_SYSTEM,
      "target": ICD11_SYSTEM,
      "element": elements,
    }],
  })
}
