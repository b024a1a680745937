//! Organizational units (*unit kerja*) that own slices of the catalog.
//!
//! This is the single lookup table for unit slugs and display labels. The
//! backend speaks slugs; people type labels, so [`UnitKerja::parse`]
//! accepts either.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKerja {
    Akademik,
    Kemahasiswaan,
    Sdm,
    Keuangan,
    Kerjasama,
    Penelitian,
    PenjaminanMutu,
}

/// `(unit, slug, label)` rows. Order is the report column order.
const UNIT_TABLE: &[(UnitKerja, &str, &str)] = &[
    (UnitKerja::Akademik, "akademik", "Akademik"),
    (UnitKerja::Kemahasiswaan, "kemahasiswaan", "Kemahasiswaan"),
    (UnitKerja::Sdm, "sdm", "Sumber Daya Manusia"),
    (UnitKerja::Keuangan, "keuangan", "Keuangan"),
    (UnitKerja::Kerjasama, "kerjasama", "Kerjasama"),
    (UnitKerja::Penelitian, "penelitian", "Penelitian dan Pengabdian"),
    (UnitKerja::PenjaminanMutu, "penjaminan_mutu", "Penjaminan Mutu"),
];

impl UnitKerja {
    /// Every unit, in report order.
    pub const ALL: [UnitKerja; 7] = [
        UnitKerja::Akademik,
        UnitKerja::Kemahasiswaan,
        UnitKerja::Sdm,
        UnitKerja::Keuangan,
        UnitKerja::Kerjasama,
        UnitKerja::Penelitian,
        UnitKerja::PenjaminanMutu,
    ];

    fn row(self) -> &'static (UnitKerja, &'static str, &'static str) {
        UNIT_TABLE
            .iter()
            .find(|(unit, _, _)| *unit == self)
            .unwrap_or(&UNIT_TABLE[0])
    }

    /// Wire value used in query strings and request bodies.
    pub fn slug(self) -> &'static str {
        self.row().1
    }

    /// Human-readable name for headers and exports.
    pub fn label(self) -> &'static str {
        self.row().2
    }

    /// Parse a slug or a display label, ignoring case and surrounding
    /// whitespace. `"SDM"` and `"Penjaminan Mutu"` both resolve.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let needle = input.trim();
        UNIT_TABLE
            .iter()
            .find(|(_, slug, label)| {
                slug.eq_ignore_ascii_case(needle) || label.eq_ignore_ascii_case(needle)
            })
            .map(|(unit, _, _)| *unit)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown unit kerja '{needle}'. Must be one of: {}",
                    UNIT_TABLE
                        .iter()
                        .map(|(_, slug, _)| *slug)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

impl fmt::Display for UnitKerja {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for UnitKerja {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_every_unit() {
        for unit in UnitKerja::ALL {
            assert!(UNIT_TABLE.iter().any(|(u, _, _)| *u == unit));
        }
        assert_eq!(UNIT_TABLE.len(), UnitKerja::ALL.len());
    }

    #[test]
    fn parse_accepts_slug_and_label() {
        assert_eq!(UnitKerja::parse("sdm").unwrap(), UnitKerja::Sdm);
        assert_eq!(
            UnitKerja::parse("  sumber daya manusia ").unwrap(),
            UnitKerja::Sdm
        );
        assert_eq!(
            UnitKerja::parse("PENJAMINAN_MUTU").unwrap(),
            UnitKerja::PenjaminanMutu
        );
    }

    #[test]
    fn parse_rejects_unknown() {
        let msg = UnitKerja::parse("perpustakaan").unwrap_err().to_string();
        assert!(msg.contains("perpustakaan"));
        assert!(msg.contains("akademik"));
    }

    #[test]
    fn serde_uses_slug() {
        let json = serde_json::to_string(&UnitKerja::PenjaminanMutu).unwrap();
        assert_eq!(json, "\"penjaminan_mutu\"");
        for unit in UnitKerja::ALL {
            let json = serde_json::to_value(unit).unwrap();
            assert_eq!(json, unit.slug());
        }
    }
}
