use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the team pays the registration fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Online,
    #[default]
    Offline,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Online => "online",
            PaymentMethod::Offline => "offline",
        }
    }

    /// Label shown in the payment mode selector.
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Online => "Online Mode",
            PaymentMethod::Offline => "Offline Mode",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            PaymentMethod::Online => PaymentMethod::Offline,
            PaymentMethod::Offline => PaymentMethod::Online,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "online" => Ok(PaymentMethod::Online),
            "offline" => Ok(PaymentMethod::Offline),
            other => Err(format!(
                "unknown payment method '{other}' (expected 'online' or 'offline')"
            )),
        }
    }
}

/// Identifiers of every editable field, in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldId {
    TeamName,
    Name1,
    Name2,
    College,
    Department,
    Email,
    Phone1,
    Phone2,
    TransactionId,
    PaymentMethod,
}

impl FieldId {
    pub const ALL: [FieldId; 10] = [
        FieldId::TeamName,
        FieldId::Name1,
        FieldId::Name2,
        FieldId::College,
        FieldId::Department,
        FieldId::Email,
        FieldId::Phone1,
        FieldId::Phone2,
        FieldId::TransactionId,
        FieldId::PaymentMethod,
    ];

    /// Wire / message identifier (camelCase, as stored in the document).
    pub fn key(self) -> &'static str {
        match self {
            FieldId::TeamName => "teamName",
            FieldId::Name1 => "name1",
            FieldId::Name2 => "name2",
            FieldId::College => "college",
            FieldId::Department => "department",
            FieldId::Email => "email",
            FieldId::Phone1 => "phone1",
            FieldId::Phone2 => "phone2",
            FieldId::TransactionId => "transactionId",
            FieldId::PaymentMethod => "paymentMethod",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FieldId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldId::ALL
            .into_iter()
            .find(|id| id.key() == s)
            .ok_or_else(|| format!("unknown field '{s}'"))
    }
}

/// Complete snapshot of the form. Replaced as a whole on every edit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationRecord {
    pub team_name: String,
    pub name1: String,
    pub name2: String,
    pub college: String,
    pub department: String,
    pub email: String,
    pub phone1: String,
    pub phone2: String,
    pub transaction_id: String,
    pub payment_method: PaymentMethod,
}

impl RegistrationRecord {
    /// Text value of a field. The payment method is returned as its wire string.
    pub fn get(&self, field: FieldId) -> &str {
        match field {
            FieldId::TeamName => &self.team_name,
            FieldId::Name1 => &self.name1,
            FieldId::Name2 => &self.name2,
            FieldId::College => &self.college,
            FieldId::Department => &self.department,
            FieldId::Email => &self.email,
            FieldId::Phone1 => &self.phone1,
            FieldId::Phone2 => &self.phone2,
            FieldId::TransactionId => &self.transaction_id,
            FieldId::PaymentMethod => self.payment_method.as_str(),
        }
    }

    /// Return a new snapshot with `field` replaced by `value`.
    pub fn with_field(&self, field: FieldId, value: &str) -> Result<Self, String> {
        let mut next = self.clone();
        match field {
            FieldId::TeamName => next.team_name = value.to_string(),
            FieldId::Name1 => next.name1 = value.to_string(),
            FieldId::Name2 => next.name2 = value.to_string(),
            FieldId::College => next.college = value.to_string(),
            FieldId::Department => next.department = value.to_string(),
            FieldId::Email => next.email = value.to_string(),
            FieldId::Phone1 => next.phone1 = value.to_string(),
            FieldId::Phone2 => next.phone2 = value.to_string(),
            FieldId::TransactionId => next.transaction_id = value.to_string(),
            FieldId::PaymentMethod => next.payment_method = value.parse()?,
        }
        Ok(next)
    }
}

/// The document written to the store: the record plus the submit timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRegistration {
    #[serde(flatten)]
    pub record: RegistrationRecord,
    pub timestamp: String,
}

impl StoredRegistration {
    /// Flat (key, value) view of every stored attribute, in declared order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        let mut out: Vec<(&'static str, &str)> = FieldId::ALL
            .into_iter()
            .map(|id| (id.key(), self.record.get(id)))
            .collect();
        out.push(("timestamp", self.timestamp.as_str()));
        out
    }
}

/// Reference to a document created by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Full resource name as reported by the store.
    pub name: String,
}

impl DocumentRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Last path segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Which feedback banner the form shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitStatus {
    #[default]
    Idle,
    Success,
    Error,
}

/// Printed by the non-interactive mode after a submission attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub status: SubmitStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored: Option<StoredRegistration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_is_offline_and_empty() {
        let r = RegistrationRecord::default();
        assert_eq!(r.payment_method, PaymentMethod::Offline);
        for id in FieldId::ALL {
            if id != FieldId::PaymentMethod {
                assert!(r.get(id).is_empty(), "{id} should start empty");
            }
        }
    }

    #[test]
    fn with_field_replaces_only_the_named_field() {
        let r = RegistrationRecord::default();
        let next = r.with_field(FieldId::Email, "a@b.co").unwrap();
        assert_eq!(next.email, "a@b.co");
        assert_eq!(r.email, "");
        assert_eq!(next.team_name, r.team_name);
    }

    #[test]
    fn with_field_rejects_unknown_payment_method() {
        let r = RegistrationRecord::default();
        assert!(r.with_field(FieldId::PaymentMethod, "crypto").is_err());
        let online = r.with_field(FieldId::PaymentMethod, "online").unwrap();
        assert_eq!(online.payment_method, PaymentMethod::Online);
    }

    #[test]
    fn field_ids_parse_from_their_keys() {
        for id in FieldId::ALL {
            assert_eq!(id.key().parse::<FieldId>().unwrap(), id);
        }
        assert!("teamname".parse::<FieldId>().is_err());
    }

    #[test]
    fn stored_registration_serializes_flat_camel_case() {
        let stored = StoredRegistration {
            record: RegistrationRecord {
                team_name: "Rustaceans".into(),
                transaction_id: "tx-1".into(),
                payment_method: PaymentMethod::Online,
                ..Default::default()
            },
            timestamp: "2025-02-01T10:00:00.000Z".into(),
        };
        let v = serde_json::to_value(&stored).unwrap();
        assert_eq!(v["teamName"], "Rustaceans");
        assert_eq!(v["transactionId"], "tx-1");
        assert_eq!(v["paymentMethod"], "online");
        assert_eq!(v["timestamp"], "2025-02-01T10:00:00.000Z");
    }

    #[test]
    fn document_id_is_last_path_segment() {
        let d = DocumentRef::new("projects/p/databases/(default)/documents/registrations/abc123");
        assert_eq!(d.id(), "abc123");
        assert_eq!(DocumentRef::new("plain").id(), "plain");
    }
}
