use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::digest::{Digest, PrevHash};
use crate::identity::{ChainKey, RecordId};
use crate::temporal::Timestamp;

/// Caller-supplied semantic fields of a ledger record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub survey_number: String,
    pub property_number: String,
    pub owner_id: String,
    pub land_type: String,
    pub action: Action,
    /// Free-form description. May be empty.
    #[serde(default)]
    pub details: String,
}

impl RecordFields {
    /// Names of the text fields that must be non-blank.
    pub const REQUIRED: [&'static str; 4] =
        ["survey_number", "property_number", "owner_id", "land_type"];

    /// The first required field that is empty or whitespace, if any.
    pub fn first_blank_field(&self) -> Option<&'static str> {
        let values = [
            &self.survey_number,
            &self.property_number,
            &self.owner_id,
            &self.land_type,
        ];
        Self::REQUIRED
            .into_iter()
            .zip(values)
            .find(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
    }
}

/// An immutable, hash-linked ledger record.
///
/// Created exactly once by the chain builder and never mutated afterwards.
/// `hash` covers every other field, `prev_hash` included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub id: RecordId,
    pub survey_number: String,
    pub property_number: String,
    pub owner_id: String,
    pub land_type: String,
    pub action: Action,
    pub details: String,
    pub timestamp: Timestamp,
    pub prev_hash: PrevHash,
    pub hash: Digest,
}

impl LedgerRecord {
    /// Assemble a record from its parts. The caller is responsible for `hash`.
    pub fn from_parts(
        id: RecordId,
        fields: RecordFields,
        timestamp: Timestamp,
        prev_hash: PrevHash,
        hash: Digest,
    ) -> Self {
        Self {
            id,
            survey_number: fields.survey_number,
            property_number: fields.property_number,
            owner_id: fields.owner_id,
            land_type: fields.land_type,
            action: fields.action,
            details: fields.details,
            timestamp,
            prev_hash,
            hash,
        }
    }

    /// The semantic fields of this record.
    pub fn fields(&self) -> RecordFields {
        RecordFields {
            survey_number: self.survey_number.clone(),
            property_number: self.property_number.clone(),
            owner_id: self.owner_id.clone(),
            land_type: self.land_type.clone(),
            action: self.action,
            details: self.details.clone(),
        }
    }

    /// Whether this record belongs to the chain identified by `key`.
    pub fn belongs_to(&self, key: &ChainKey) -> bool {
        self.property_number.trim() == key.as_str()
    }

    /// Chain order: timestamp ascending, ties broken by id.
    pub fn chain_order(a: &Self, b: &Self) -> std::cmp::Ordering {
        a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> RecordFields {
        RecordFields {
            survey_number: "SV-12".into(),
            property_number: "PR-001".into(),
            owner_id: "OWN-7".into(),
            land_type: "agricultural".into(),
            action: Action::AwardDeclared,
            details: "award no. 4411".into(),
        }
    }

    fn record(ts: i64) -> LedgerRecord {
        LedgerRecord::from_parts(
            RecordId::generate(),
            fields(),
            Timestamp::from_millis(ts),
            PrevHash::Genesis,
            Digest::from_hash([0; 32]),
        )
    }

    #[test]
    fn complete_fields_have_no_blank() {
        assert_eq!(fields().first_blank_field(), None);
    }

    #[test]
    fn blank_field_is_reported_in_order() {
        let mut f = fields();
        f.land_type = "  ".into();
        f.owner_id = String::new();
        assert_eq!(f.first_blank_field(), Some("owner_id"));
    }

    #[test]
    fn empty_details_are_allowed() {
        let mut f = fields();
        f.details.clear();
        assert_eq!(f.first_blank_field(), None);
    }

    #[test]
    fn fields_roundtrip_through_record() {
        let r = record(5);
        assert_eq!(r.fields(), fields());
    }

    #[test]
    fn belongs_to_matches_property_number() {
        let r = record(1);
        assert!(r.belongs_to(&ChainKey::new("PR-001").unwrap()));
        assert!(!r.belongs_to(&ChainKey::new("PR-002").unwrap()));
    }

    #[test]
    fn chain_order_uses_timestamp_then_id() {
        let a = record(1);
        let b = record(2);
        assert_eq!(LedgerRecord::chain_order(&a, &b), std::cmp::Ordering::Less);

        let mut c = record(1);
        let mut d = record(1);
        if c.id > d.id {
            std::mem::swap(&mut c, &mut d);
        }
        assert_eq!(LedgerRecord::chain_order(&c, &d), std::cmp::Ordering::Less);
    }

    #[test]
    fn json_uses_wire_field_names() {
        let r = record(9);
        let value = serde_json::to_value(&r).unwrap();
        for key in [
            "id",
            "survey_number",
            "property_number",
            "owner_id",
            "land_type",
            "action",
            "details",
            "timestamp",
            "prev_hash",
            "hash",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["prev_hash"], "genesis");
    }
}
