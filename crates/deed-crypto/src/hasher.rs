use deed_types::{Digest, LedgerRecord, PrevHash, RecordFields, RecordId, Timestamp};

/// Domain-separated BLAKE3 record hasher.
///
/// The hasher carries a domain tag that is prepended to every computation, so
/// the same bytes hashed under a different tag never collide with a record
/// digest.
///
/// Canonical encoding, in fixed order:
///
/// ```text
/// <domain> ":"
/// id, survey_number, property_number, owner_id, land_type, action, details
///     each as [u64 LE byte length][UTF-8 bytes]
/// timestamp as [8 bytes big-endian i64]
/// prev_hash as [u64 LE byte length]["genesis" | 64 lowercase hex chars]
/// ```
///
/// Every variable-length field is length-prefixed, so two different field
/// tuples can never encode to the same byte string.
pub struct RecordHasher {
    domain: &'static str,
}

impl RecordHasher {
    /// Hasher for ledger records.
    pub const RECORD: Self = Self {
        domain: "deed-record-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }

    /// Digest of a record that is about to be appended.
    pub fn digest(
        &self,
        id: &RecordId,
        fields: &RecordFields,
        timestamp: Timestamp,
        prev_hash: &PrevHash,
    ) -> Digest {
        let bytes = self.encode(&Parts {
            id: &id.to_canonical(),
            survey_number: &fields.survey_number,
            property_number: &fields.property_number,
            owner_id: &fields.owner_id,
            land_type: &fields.land_type,
            action: fields.action.as_str(),
            details: &fields.details,
            timestamp,
            prev_hash: &prev_hash.as_text(),
        });
        Digest::from_hash(*blake3::hash(&bytes).as_bytes())
    }

    /// Recompute the digest of a stored record from its own fields and
    /// its stored `prev_hash`.
    pub fn digest_record(&self, record: &LedgerRecord) -> Digest {
        let bytes = self.canonical_bytes(record);
        Digest::from_hash(*blake3::hash(&bytes).as_bytes())
    }

    /// Whether the record's stored digest matches a recomputation.
    pub fn verify(&self, record: &LedgerRecord) -> bool {
        self.digest_record(record) == record.hash
    }

    /// The exact byte string that is hashed for `record`.
    pub fn canonical_bytes(&self, record: &LedgerRecord) -> Vec<u8> {
        self.encode(&Parts {
            id: &record.id.to_canonical(),
            survey_number: &record.survey_number,
            property_number: &record.property_number,
            owner_id: &record.owner_id,
            land_type: &record.land_type,
            action: record.action.as_str(),
            details: &record.details,
            timestamp: record.timestamp,
            prev_hash: &record.prev_hash.as_text(),
        })
    }

    fn encode(&self, parts: &Parts<'_>) -> Vec<u8> {
        let mut out = Vec::with_capacity(256);
        out.extend_from_slice(self.domain.as_bytes());
        out.push(b':');
        for text in [
            parts.id,
            parts.survey_number,
            parts.property_number,
            parts.owner_id,
            parts.land_type,
            parts.action,
            parts.details,
        ] {
            put_field(&mut out, text);
        }
        out.extend_from_slice(&parts.timestamp.to_be_bytes());
        put_field(&mut out, parts.prev_hash);
        out
    }
}

struct Parts<'a> {
    id: &'a str,
    survey_number: &'a str,
    property_number: &'a str,
    owner_id: &'a str,
    land_type: &'a str,
    action: &'a str,
    details: &'a str,
    timestamp: Timestamp,
    prev_hash: &'a str,
}

fn put_field(out: &mut Vec<u8>, text: &str) {
    out.extend_from_slice(&(text.len() as u64).to_le_bytes());
    out.extend_from_slice(text.as_bytes());
}
