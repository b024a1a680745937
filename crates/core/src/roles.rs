//! Well-known user roles and their mapping onto units.
//!
//! Coordinator roles are one per [`UnitKerja`]; the role string on the
//! wire is `koordinator_<unit slug>`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;
use crate::units::UnitKerja;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_DOSEN: &str = "dosen";
const COORDINATOR_PREFIX: &str = "koordinator_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Dosen,
    Koordinator(UnitKerja),
}

impl Role {
    /// Parse a wire role string, e.g. `"dosen"` or `"koordinator_sdm"`.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let value = input.trim().to_ascii_lowercase();
        match value.as_str() {
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_DOSEN => Ok(Role::Dosen),
            other => other
                .strip_prefix(COORDINATOR_PREFIX)
                .and_then(|slug| UnitKerja::parse(slug).ok())
                .map(Role::Koordinator)
                .ok_or_else(|| CoreError::Validation(format!("Unknown role '{input}'"))),
        }
    }

    pub fn as_wire(&self) -> String {
        match self {
            Role::Admin => ROLE_ADMIN.to_string(),
            Role::Dosen => ROLE_DOSEN.to_string(),
            Role::Koordinator(unit) => format!("{COORDINATOR_PREFIX}{}", unit.slug()),
        }
    }

    /// The unit a coordinator works for. Admins and lecturers have none.
    pub fn unit(&self) -> Option<UnitKerja> {
        match self {
            Role::Koordinator(unit) => Some(*unit),
            _ => None,
        }
    }

    /// Whether this role may edit evidence and scores for `unit`.
    pub fn can_manage(&self, unit: UnitKerja) -> bool {
        match self {
            Role::Admin => true,
            Role::Dosen => false,
            Role::Koordinator(own) => *own == unit,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_wire())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_wire())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Role::parse(&raw).map_err(serde::de::Error::custom)
    }
}
