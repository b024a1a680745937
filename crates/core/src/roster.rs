//! Lecturer roster entries.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// A lecturer (*dosen*) as returned by the user listing. Read-only for the
/// lifetime of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lecturer {
    pub id: DbId,
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(default)]
    pub nidn: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "no_hp", default)]
    pub phone: Option<String>,
    #[serde(rename = "prodi", default)]
    pub study_program: Option<String>,
}

impl Lecturer {
    /// Case-insensitive substring match on name or NIDN. A blank query
    /// matches everyone.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle)
            || self
                .nidn
                .as_deref()
                .is_some_and(|nidn| nidn.to_lowercase().contains(&needle))
    }
}

/// Roster rows matching `query`, in roster order.
pub fn search<'a>(roster: &'a [Lecturer], query: &str) -> Vec<&'a Lecturer> {
    roster.iter().filter(|l| l.matches_query(query)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lecturer(name: &str, nidn: Option<&str>) -> Lecturer {
        Lecturer {
            id: 1,
            name: name.to_string(),
            nidn: nidn.map(str::to_string),
            email: None,
            phone: None,
            study_program: None,
        }
    }

    #[test]
    fn matches_name_and_nidn() {
        let l = lecturer("Siti Rahmawati", Some("0412098801"));
        assert!(l.matches_query("rahma"));
        assert!(l.matches_query("SITI"));
        assert!(l.matches_query("04120"));
        assert!(l.matches_query("   "));
        assert!(!l.matches_query("budi"));
    }

    #[test]
    fn missing_nidn_only_matches_name() {
        let l = lecturer("Budi", None);
        assert!(!l.matches_query("0412"));
    }

    #[test]
    fn deserializes_wire_names() {
        let l: Lecturer = serde_json::from_value(serde_json::json!({
            "id": 7,
            "nama": "Andi",
            "nidn": "123",
            "no_hp": "0812",
            "prodi": "Informatika"
        }))
        .unwrap();
        assert_eq!(l.name, "Andi");
        assert_eq!(l.phone.as_deref(), Some("0812"));
        assert_eq!(l.study_program.as_deref(), Some("Informatika"));
        assert_eq!(l.email, None);
    }
}
