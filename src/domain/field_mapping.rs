use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{ConfigurationError, EnrichmentResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputKey {
    FirstName,
    LastName,
    Email,
    Title,
    Business,
    Domain,
}

impl OutputKey {
    pub const ALL: [OutputKey; 6] = [
        OutputKey::FirstName,
        OutputKey::LastName,
        OutputKey::Email,
        OutputKey::Title,
        OutputKey::Business,
        OutputKey::Domain,
    ];

    pub fn attribute(&self) -> &'static str {
        match self {
            OutputKey::FirstName => "First Name",
            OutputKey::LastName => "Last Name",
            OutputKey::Email => "Email Address",
            OutputKey::Title => "Title",
            OutputKey::Business => "Business",
            OutputKey::Domain => "Domain",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKey::FirstName => "firstName",
            OutputKey::LastName => "lastName",
            OutputKey::Email => "email",
            OutputKey::Title => "title",
            OutputKey::Business => "business",
            OutputKey::Domain => "domain",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderMatch {
    pub values: BTreeMap<OutputKey, String>,
}

impl ProviderMatch {
    pub fn get(&self, key: OutputKey) -> &str {
        self.values.get(&key).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping(BTreeMap<OutputKey, String>);

impl FieldMapping {
    pub fn new(entries: impl IntoIterator<Item = (OutputKey, String)>) -> Self {
        FieldMapping(entries.into_iter().collect())
    }

    pub fn get(&self, key: OutputKey) -> Option<&str> {
        self.0
            .get(&key)
            .map(String::as_str)
            .filter(|id| !id.trim().is_empty())
    }

    pub fn field_ids(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }

    pub fn missing_keys(&self) -> Vec<OutputKey> {
        OutputKey::ALL
            .into_iter()
            .filter(|key| self.get(*key).is_none())
            .collect()
    }

    pub fn validate(
        &self,
        source_field: &str,
        table_fields: &HashSet<String>,
    ) -> Result<(), ConfigurationError> {
        let missing = self.missing_keys();
        if !missing.is_empty() {
            return Err(ConfigurationError::Missing(
                missing.iter().map(|k| k.as_str().to_string()).collect(),
            ));
        }

        let mut seen = HashSet::new();
        for field_id in self.field_ids() {
            if !seen.insert(field_id) {
                return Err(ConfigurationError::DuplicateField(field_id.to_string()));
            }
            if field_id == source_field {
                return Err(ConfigurationError::OverwritesSource(field_id.to_string()));
            }
            if !table_fields.contains(field_id) {
                return Err(ConfigurationError::UnknownField(field_id.to_string()));
            }
        }

        Ok(())
    }

    pub fn apply(&self, record_id: &str, provider_match: &ProviderMatch) -> EnrichmentResult {
        let fields = OutputKey::ALL
            .into_iter()
            .filter_map(|key| {
                self.get(key)
                    .map(|field_id| (field_id.to_string(), provider_match.get(key).to_string()))
            })
            .collect();

        EnrichmentResult {
            record_id: record_id.to_string(),
            fields,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_mapping() -> FieldMapping {
    FieldMapping::new([
        (OutputKey::FirstName, "fldA".to_string()),
        (OutputKey::Email, "fldB".to_string()),
        (OutputKey::LastName, "fldC".to_string()),
        (OutputKey::Title, "fldD".to_string()),
        (OutputKey::Business, "fldE".to_string()),
        (OutputKey::Domain, "fldF".to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{test_mapping, FieldMapping, OutputKey, ProviderMatch};
    use crate::domain::ConfigurationError;

    fn table_fields() -> HashSet<String> {
        ["fldSrc", "fldA", "fldB", "fldC", "fldD", "fldE", "fldF"]
            .iter()
            .map(|f| f.to_string())
            .collect()
    }

    #[test]
    fn mapping_deserializes_from_stored_json() {
        let mapping: FieldMapping = serde_json::from_str(
            r#"{"firstName":"fldA","email":"fldB","lastName":"fldC",
                "title":"fldD","business":"fldE","domain":"fldF"}"#,
        )
        .unwrap();

        assert_eq!(mapping, test_mapping());
    }

    #[test]
    fn complete_mapping_is_valid() {
        assert!(test_mapping().validate("fldSrc", &table_fields()).is_ok());
    }

    #[test]
    fn missing_keys_are_listed() {
        let mapping = FieldMapping::new([
            (OutputKey::Email, "fldB".to_string()),
            (OutputKey::Title, " ".to_string()),
        ]);

        match mapping.validate("fldSrc", &table_fields()) {
            Err(ConfigurationError::Missing(keys)) => assert_eq!(
                keys,
                vec!["firstName", "lastName", "title", "business", "domain"]
            ),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn duplicate_destination_is_rejected() {
        let mut mapping = test_mapping();
        mapping.0.insert(OutputKey::Domain, "fldA".to_string());

        assert!(matches!(
            mapping.validate("fldSrc", &table_fields()),
            Err(ConfigurationError::DuplicateField(f)) if f == "fldA"
        ));
    }

    #[test]
    fn unknown_or_source_field_is_rejected() {
        let mut mapping = test_mapping();
        mapping.0.insert(OutputKey::Domain, "fldGone".to_string());
        assert!(matches!(
            mapping.validate("fldSrc", &table_fields()),
            Err(ConfigurationError::UnknownField(_))
        ));

        let mut mapping = test_mapping();
        mapping.0.insert(OutputKey::Domain, "fldSrc".to_string());
        assert!(matches!(
            mapping.validate("fldSrc", &table_fields()),
            Err(ConfigurationError::OverwritesSource(_))
        ));
    }

    #[test]
    fn apply_maps_every_output_to_its_field() {
        let provider_match = ProviderMatch {
            values: [
                (OutputKey::FirstName, "Jo".to_string()),
                (OutputKey::Email, "jo@x.com".to_string()),
            ]
            .into_iter()
            .collect(),
        };

        let result = test_mapping().apply("r1", &provider_match);

        assert_eq!(result.record_id, "r1");
        assert_eq!(result.fields.len(), 6);
        assert_eq!(result.fields["fldA"], "Jo");
        assert_eq!(result.fields["fldB"], "jo@x.com");
        assert_eq!(result.fields["fldF"], "");
    }
}
