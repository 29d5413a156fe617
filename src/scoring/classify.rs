//! Status, severity, and the qualitative quality bands.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Whether a metric sits inside its tolerance/range, or on which side it
/// misses. Ceiling (invert) metrics can only ever be `Above`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Below,
    Above,
}

/// How far outside tolerance a non-OK metric sits, classified from the
/// deviation ratio `n = distance / tolerance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn from_ratio(n: f64) -> Self {
        if n <= 1.0 {
            Severity::Mild
        } else if n <= 2.0 {
            Severity::Moderate
        } else {
            Severity::Severe
        }
    }
}

/// Qualitative quality band for the aggregate percentage. Band boundaries
/// are inclusive on the lower side: 55 is already Intermediário.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Classification {
    Basico,
    Intermediario,
    Avancado,
    ReferenciaMundial,
}

impl Classification {
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= 85.0 {
            Classification::ReferenciaMundial
        } else if pct >= 70.0 {
            Classification::Avancado
        } else if pct >= 55.0 {
            Classification::Intermediario
        } else {
            Classification::Basico
        }
    }

    /// User-facing label, kept verbatim from the genre reference datasets.
    pub fn label(self) -> &'static str {
        match self {
            Classification::Basico => "Básico",
            Classification::Intermediario => "Intermediário",
            Classification::Avancado => "Avançado",
            Classification::ReferenciaMundial => "Referência Mundial",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Classification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Classification {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "Básico" => Ok(Classification::Basico),
            "Intermediário" => Ok(Classification::Intermediario),
            "Avançado" => Ok(Classification::Avancado),
            "Referência Mundial" => Ok(Classification::ReferenciaMundial),
            other => Err(serde::de::Error::custom(format!(
                "unknown classification label: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_boundaries() {
        let table = [
            (0.0, Classification::Basico),
            (54.9, Classification::Basico),
            (55.0, Classification::Intermediario),
            (69.9, Classification::Intermediario),
            (70.0, Classification::Avancado),
            (84.9, Classification::Avancado),
            (85.0, Classification::ReferenciaMundial),
            (100.0, Classification::ReferenciaMundial),
        ];
        for (pct, expected) in table {
            assert_eq!(
                Classification::from_percentage(pct),
                expected,
                "at {pct}%"
            );
        }
    }

    #[test]
    fn test_severity_from_ratio() {
        assert_eq!(Severity::from_ratio(0.3), Severity::Mild);
        assert_eq!(Severity::from_ratio(1.0), Severity::Mild);
        assert_eq!(Severity::from_ratio(1.5), Severity::Moderate);
        assert_eq!(Severity::from_ratio(2.0), Severity::Moderate);
        assert_eq!(Severity::from_ratio(2.01), Severity::Severe);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Classification::Basico.label(), "Básico");
        assert_eq!(
            Classification::ReferenciaMundial.to_string(),
            "Referência Mundial"
        );
    }

    #[test]
    fn test_classification_serde_uses_labels() {
        let json = serde_json::to_string(&Classification::Avancado).unwrap();
        assert_eq!(json, "\"Avançado\"");
        let back: Classification = serde_json::from_str("\"Básico\"").unwrap();
        assert_eq!(back, Classification::Basico);
    }
}
