use std::collections::HashMap;
use std::fmt;

use crate::error::{PipelineError, Result};

const BUILTIN_NAMES: &str = include_str!("first_names.csv");

/// Gender value stored in the cleaned employee table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Other,
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a first name in the lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameClass {
    Male,
    MostlyMale,
    Female,
    MostlyFemale,
    /// Used for both genders about equally.
    Androgynous,
}

impl NameClass {
    fn parse(code: &str) -> Option<Self> {
        match code.trim() {
            "male" => Some(Self::Male),
            "mostly_male" => Some(Self::MostlyMale),
            "female" => Some(Self::Female),
            "mostly_female" => Some(Self::MostlyFemale),
            "andy" => Some(Self::Androgynous),
            _ => None,
        }
    }

    fn gender(self) -> Gender {
        match self {
            Self::Male | Self::MostlyMale => Gender::Male,
            Self::Female | Self::MostlyFemale => Gender::Female,
            Self::Androgynous => Gender::Other,
        }
    }
}

/// First-name → gender lookup.
///
/// Built once per run and handed to the employee cleaner; the table is never
/// mutated after construction. Lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct GenderDetector {
    names: HashMap<String, NameClass>,
}

impl GenderDetector {
    /// Detector backed by the bundled first-name table.
    pub fn builtin() -> Result<Self> {
        Self::from_csv_str(BUILTIN_NAMES)
    }

    /// Parse a `name,gender` table. The header line is optional; blank lines
    /// are ignored. Later duplicates do not override earlier entries.
    pub fn from_csv_str(table: &str) -> Result<Self> {
        let mut names = HashMap::new();
        for (lineno, line) in table.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || (lineno == 0 && line.eq_ignore_ascii_case("name,gender")) {
                continue;
            }
            let (name, code) = line.split_once(',').ok_or_else(|| {
                PipelineError::InvalidData(format!("name table line {}: '{line}'", lineno + 1))
            })?;
            let class = NameClass::parse(code).ok_or_else(|| {
                PipelineError::InvalidData(format!(
                    "name table line {}: unknown gender code '{code}'",
                    lineno + 1
                ))
            })?;
            names.entry(name.trim().to_lowercase()).or_insert(class);
        }
        Ok(Self { names })
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, NameClass)>,
        S: AsRef<str>,
    {
        let mut names = HashMap::new();
        for (name, class) in entries {
            names.entry(name.as_ref().trim().to_lowercase()).or_insert(class);
        }
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Infer gender from the first whitespace-separated token of `full_name`.
    pub fn infer(&self, full_name: &str) -> Gender {
        let Some(first) = full_name.split_whitespace().next() else {
            return Gender::Unknown;
        };
        self.names
            .get(&first.to_lowercase())
            .map(|class| class.gender())
            .unwrap_or(Gender::Unknown)
    }

    /// The stored gender is always replaced by the inferred one when they
    /// disagree. Returns the value to keep and whether it changed.
    pub fn correct(&self, full_name: &str, current: Option<&str>) -> (Gender, bool) {
        let inferred = self.infer(full_name);
        (inferred, current != Some(inferred.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_loads() {
        let detector = GenderDetector::builtin().unwrap();
        assert!(detector.len() > 2500);
        assert_eq!(detector.infer("John Doe"), Gender::Male);
        assert_eq!(detector.infer("MARY Jane Smith"), Gender::Female);
        assert_eq!(detector.infer("Alex Brown"), Gender::Other);
        assert_eq!(detector.infer("Zyxwv Brown"), Gender::Unknown);
        assert_eq!(detector.infer("   "), Gender::Unknown);
    }

    #[test]
    fn builtin_table_covers_common_names_across_languages() {
        let detector = GenderDetector::builtin().unwrap();
        for name in ["Luisa", "Giulia", "Francesca", "Lucía", "Ingrid", "Priya", "Fatima", "Olga"] {
            assert_eq!(detector.infer(name), Gender::Female, "{name}");
        }
        for name in ["José", "Jorge", "Matteo", "Sven", "Aarav", "Mohammed", "Ivan", "Kwame"] {
            assert_eq!(detector.infer(name), Gender::Male, "{name}");
        }
    }

    #[test]
    fn mostly_classes_collapse() {
        let detector = GenderDetector::from_entries([
            ("Kim", NameClass::MostlyFemale),
            ("Sam", NameClass::MostlyMale),
        ]);
        assert_eq!(detector.infer("kim lee"), Gender::Female);
        assert_eq!(detector.infer("Sam Stone"), Gender::Male);
    }

    #[test]
    fn correct_always_prefers_inferred() {
        let detector = GenderDetector::builtin().unwrap();
        assert_eq!(detector.correct("Mary Major", Some("Male")), (Gender::Female, true));
        assert_eq!(detector.correct("Mary Major", Some("Female")), (Gender::Female, false));
        assert_eq!(detector.correct("Qqq Major", Some("Female")), (Gender::Unknown, true));
        assert_eq!(detector.correct("John Major", None), (Gender::Male, true));
    }

    #[test]
    fn bad_table_lines_are_rejected() {
        assert!(GenderDetector::from_csv_str("name,gender\nbob").is_err());
        assert!(GenderDetector::from_csv_str("bob,robot").is_err());
    }

    #[test]
    fn independent_detectors_do_not_share_state() {
        let a = GenderDetector::from_entries([("Robin", NameClass::Male)]);
        let b = GenderDetector::from_entries([("Robin", NameClass::Female)]);
        assert_eq!(a.infer("Robin"), Gender::Male);
        assert_eq!(b.infer("Robin"), Gender::Female);
    }
}
