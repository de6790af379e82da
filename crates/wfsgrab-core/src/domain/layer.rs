use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Namespaced feature type name as advertised by the upstream feed
/// (`workspace:name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LayerName(String);

impl LayerName {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyLayerName);
        }

        for (index, ch) in trimmed.chars().enumerate() {
            if ch.is_whitespace() || ch.is_control() || matches!(ch, '&' | '?' | '#') {
                return Err(ValidationError::LayerNameInvalidChar { ch, index });
            }
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name without the namespace prefix.
    pub fn local_name(&self) -> &str {
        wfsgrab_store::local_layer_name(&self.0)
    }
}

impl Display for LayerName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for LayerName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for LayerName {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<LayerName> for String {
    fn from(value: LayerName) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_trims_namespaced_name() {
        let layer = LayerName::parse("  govmap:parcels ").expect("layer should parse");
        assert_eq!(layer.as_str(), "govmap:parcels");
        assert_eq!(layer.local_name(), "parcels");
    }

    #[test]
    fn rejects_empty_name() {
        let err = LayerName::parse("   ").expect_err("must fail");
        assert_eq!(err, ValidationError::EmptyLayerName);
    }

    #[test]
    fn rejects_query_breaking_characters() {
        let err = LayerName::parse("ns:roads&count=1").expect_err("must fail");
        assert!(matches!(
            err,
            ValidationError::LayerNameInvalidChar { ch: '&', .. }
        ));

        let err = LayerName::parse("ns:two words").expect_err("must fail");
        assert!(matches!(
            err,
            ValidationError::LayerNameInvalidChar { ch: ' ', index: 6 }
        ));
    }
}
