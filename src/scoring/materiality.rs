use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outsourcing materiality of a supplier relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Materiality {
    #[serde(rename = "non-material", alias = "non_material")]
    NonMaterial,
    #[serde(rename = "material")]
    Material,
    #[serde(rename = "critical")]
    Critical,
}

impl Materiality {
    /// Material and critical relationships escalate findings.
    pub fn is_material(&self) -> bool {
        matches!(self, Materiality::Material | Materiality::Critical)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Materiality::NonMaterial => "Non-Material",
            Materiality::Material => "Material",
            Materiality::Critical => "Critical / Material",
        }
    }
}

impl FromStr for Materiality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "non-material" | "nonmaterial" => Ok(Materiality::NonMaterial),
            "material" => Ok(Materiality::Material),
            "critical" => Ok(Materiality::Critical),
            other => Err(format!(
                "unknown materiality '{}' (expected non-material, material or critical)",
                other
            )),
        }
    }
}

impl fmt::Display for Materiality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        assert_eq!("non-material".parse(), Ok(Materiality::NonMaterial));
        assert_eq!("Non_Material".parse(), Ok(Materiality::NonMaterial));
        assert_eq!("MATERIAL".parse(), Ok(Materiality::Material));
        assert_eq!(" critical ".parse(), Ok(Materiality::Critical));
        assert!("strategic".parse::<Materiality>().is_err());
    }

    #[test]
    fn test_is_material() {
        assert!(!Materiality::NonMaterial.is_material());
        assert!(Materiality::Material.is_material());
        assert!(Materiality::Critical.is_material());
    }

    #[test]
    fn test_serde_names() {
        let parsed: Materiality = serde_json::from_str("\"non-material\"").unwrap();
        assert_eq!(parsed, Materiality::NonMaterial);
        let parsed: Materiality = serde_json::from_str("\"non_material\"").unwrap();
        assert_eq!(parsed, Materiality::NonMaterial);
        assert_eq!(serde_json::to_string(&Materiality::Critical).unwrap(), "\"critical\"");
    }
}
