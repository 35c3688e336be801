//! Event kind enum as the single source of truth for kind strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::ValidationError;

/// The kinds of usage the store records.
///
/// Each kind has its own record shape, its own bucket files and its own
/// section inside a bucket document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    File,
    Command,
    Perspective,
    Part,
    Launch,
    Session,
}

impl Kind {
    /// Every kind, in the order sections appear in a document.
    pub const ALL: [Self; 6] = [
        Self::File,
        Self::Command,
        Self::Perspective,
        Self::Part,
        Self::Launch,
        Self::Session,
    ];

    /// String form used in file names, JSON and the CLI.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Command => "command",
            Self::Perspective => "perspective",
            Self::Part => "part",
            Self::Launch => "launch",
            Self::Session => "session",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Kind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" | "files" => Ok(Self::File),
            "command" | "commands" => Ok(Self::Command),
            "perspective" | "perspectives" => Ok(Self::Perspective),
            "part" | "parts" => Ok(Self::Part),
            "launch" | "launches" => Ok(Self::Launch),
            "session" | "sessions" => Ok(Self::Session),
            _ => Err(ValidationError::UnknownKind {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for Kind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Kind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_all_variants() {
        for kind in Kind::ALL {
            let s = kind.to_string();
            let parsed: Kind = s.parse().expect("should parse");
            assert_eq!(parsed, kind, "roundtrip failed for {kind:?}");
        }
    }

    #[test]
    fn plural_aliases_parse() {
        assert_eq!("files".parse::<Kind>().unwrap(), Kind::File);
        assert_eq!("launches".parse::<Kind>().unwrap(), Kind::Launch);
    }

    #[test]
    fn unknown_kind_errors() {
        let err = "task".parse::<Kind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown event kind: task");
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Kind::Perspective).unwrap();
        assert_eq!(json, "\"perspective\"");
        let parsed: Kind = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Kind::Perspective);
    }
}
