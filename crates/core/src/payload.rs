use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QrError, Result};
use crate::table::ParticipantRow;

pub const COL_UNIQUE_ID: &str = "unique id";
pub const COL_UUID: &str = "uuid";
pub const COL_NAME: &str = "name";
pub const COL_TEAM: &str = "team name";

/// Which payload shape a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// `{"id": ...}` from the `Unique ID` column.
    #[default]
    IdOnly,
    /// `{"uuid": ..., "name": ..., "team": ...}`.
    Full,
}

impl Variant {
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Variant::IdOnly => &[COL_UNIQUE_ID],
            Variant::Full => &[COL_UUID, COL_NAME, COL_TEAM],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::IdOnly => "id",
            Variant::Full => "full",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = QrError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "id" | "id-only" | "id_only" => Ok(Variant::IdOnly),
            "full" => Ok(Variant::Full),
            other => Err(QrError::InvalidOption {
                name: "variant",
                value: other.to_string(),
            }),
        }
    }
}

/// Content of one QR code. Field order here is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Participant {
        uuid: String,
        name: String,
        team: String,
    },
    Id {
        id: String,
    },
}

impl Payload {
    /// Short human label for console output.
    pub fn label(&self) -> String {
        match self {
            Payload::Id { id } => format!("ID: {id}"),
            Payload::Participant { name, team, .. } if team.is_empty() => name.clone(),
            Payload::Participant { name, team, .. } => format!("{name} ({team})"),
        }
    }
}

/// Builds the payload for `row`, or `None` when the row has nothing to
/// encode (empty id, or empty uuid/name for the full variant).
pub fn build_payload(row: &ParticipantRow, variant: Variant) -> Result<Option<Payload>> {
    match variant {
        Variant::IdOnly => {
            let id = field(row, COL_UNIQUE_ID)?;
            if id.is_empty() {
                return Ok(None);
            }
            Ok(Some(Payload::Id { id }))
        }
        Variant::Full => {
            let uuid = field(row, COL_UUID)?;
            let name = field(row, COL_NAME)?;
            let team = field(row, COL_TEAM)?;
            if uuid.is_empty() || name.is_empty() {
                return Ok(None);
            }
            Ok(Some(Payload::Participant { uuid, name, team }))
        }
    }
}

fn field(row: &ParticipantRow, column: &str) -> Result<String> {
    row.get(column)
        .map(|value| value.trim().to_string())
        .ok_or_else(|| QrError::MissingField(column.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn row(pairs: &[(&str, &str)]) -> ParticipantRow {
        let fields = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<IndexMap<_, _>>();
        ParticipantRow { line: 2, fields }
    }

    #[test]
    fn id_variant_builds_single_key_payload() {
        let payload = build_payload(&row(&[("unique id", " T-042 ")]), Variant::IdOnly)
            .unwrap()
            .unwrap();
        assert_eq!(payload, Payload::Id { id: "T-042".into() });
        assert_eq!(serde_json::to_string(&payload).unwrap(), r#"{"id":"T-042"}"#);
    }

    #[test]
    fn id_variant_skips_empty_id() {
        let payload = build_payload(&row(&[("unique id", "   ")]), Variant::IdOnly).unwrap();
        assert!(payload.is_none());
    }

    #[test]
    fn full_variant_keeps_key_order_and_string_values() {
        let payload = build_payload(
            &row(&[("team name", "42"), ("name", "Jane Doe"), ("uuid", "0007")]),
            Variant::Full,
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"uuid":"0007","name":"Jane Doe","team":"42"}"#
        );
    }

    #[test]
    fn full_variant_allows_empty_team_but_not_empty_name() {
        let with_team = build_payload(
            &row(&[("uuid", "u1"), ("name", "Ada"), ("team name", "")]),
            Variant::Full,
        )
        .unwrap();
        assert!(matches!(with_team, Some(Payload::Participant { ref team, .. }) if team.is_empty()));

        let nameless = build_payload(
            &row(&[("uuid", "u1"), ("name", " "), ("team name", "Red")]),
            Variant::Full,
        )
        .unwrap();
        assert!(nameless.is_none());

        let no_uuid = build_payload(
            &row(&[("uuid", ""), ("name", "Ada"), ("team name", "Red")]),
            Variant::Full,
        )
        .unwrap();
        assert!(no_uuid.is_none());
    }

    #[test]
    fn absent_column_is_an_error() {
        let err = build_payload(&row(&[("uuid", "u1")]), Variant::Full).unwrap_err();
        assert!(matches!(err, QrError::MissingField(ref c) if c == "name"));
    }

    #[test]
    fn payload_json_roundtrips_to_same_shape() {
        let payload = Payload::Participant {
            uuid: "u".into(),
            name: "n".into(),
            team: "t".into(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        let back: Payload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
        let id: Payload = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert_eq!(id, Payload::Id { id: "x".into() });
    }

    #[test]
    fn variant_parses_aliases() {
        assert_eq!("ID".parse::<Variant>().unwrap(), Variant::IdOnly);
        assert_eq!("full".parse::<Variant>().unwrap(), Variant::Full);
        assert!("name".parse::<Variant>().is_err());
        assert_eq!(Variant::Full.required_columns(), &["uuid", "name", "team name"]);
    }
}
