//! Field schema for the registration form.
//!
//! One ordered table drives both the TUI (labels, placeholders, visibility)
//! and validation (which fields are required for a given payment method).

use crate::model::{FieldId, PaymentMethod};

/// Input widget kind for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Choice,
}

/// When a field must be filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Always,
    Optional,
    /// Required (and shown) only for online payments.
    WhenOnline,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub id: FieldId,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub kind: FieldKind,
    pub requirement: Requirement,
}

impl FieldSpec {
    pub fn is_required(&self, payment: PaymentMethod) -> bool {
        match self.requirement {
            Requirement::Always => true,
            Requirement::Optional => false,
            Requirement::WhenOnline => payment == PaymentMethod::Online,
        }
    }

    pub fn is_visible(&self, payment: PaymentMethod) -> bool {
        match self.requirement {
            Requirement::WhenOnline => payment == PaymentMethod::Online,
            _ => true,
        }
    }
}

/// Text inputs in declared order. The payment selector is rendered separately
/// above them, so it sits last here.
pub static FIELDS: [FieldSpec; 10] = [
    FieldSpec {
        id: FieldId::TeamName,
        label: "Team Name",
        placeholder: "Enter your Team Name",
        kind: FieldKind::Text,
        requirement: Requirement::Always,
    },
    FieldSpec {
        id: FieldId::Name1,
        label: "Name 1",
        placeholder: "Enter 1st Participant Name",
        kind: FieldKind::Text,
        requirement: Requirement::Always,
    },
    FieldSpec {
        id: FieldId::Name2,
        label: "Name 2",
        placeholder: "Enter 2nd Participant Name",
        kind: FieldKind::Text,
        requirement: Requirement::Always,
    },
    FieldSpec {
        id: FieldId::College,
        label: "College Name",
        placeholder: "Enter College Name",
        kind: FieldKind::Text,
        requirement: Requirement::Optional,
    },
    FieldSpec {
        id: FieldId::Department,
        label: "Department",
        placeholder: "Enter Department",
        kind: FieldKind::Text,
        requirement: Requirement::Always,
    },
    FieldSpec {
        id: FieldId::Email,
        label: "Email",
        placeholder: "Enter your Email",
        kind: FieldKind::Email,
        requirement: Requirement::Always,
    },
    FieldSpec {
        id: FieldId::Phone1,
        label: "Phone No",
        placeholder: "Enter Phone No 1",
        kind: FieldKind::Phone,
        requirement: Requirement::Always,
    },
    FieldSpec {
        id: FieldId::Phone2,
        label: "Phone No",
        placeholder: "Enter Phone No 2",
        kind: FieldKind::Phone,
        requirement: Requirement::Always,
    },
    FieldSpec {
        id: FieldId::TransactionId,
        label: "Transaction Hash",
        placeholder: "Enter transaction hash",
        kind: FieldKind::Text,
        requirement: Requirement::WhenOnline,
    },
    FieldSpec {
        id: FieldId::PaymentMethod,
        label: "Payment Mode",
        placeholder: "",
        kind: FieldKind::Choice,
        requirement: Requirement::Always,
    },
];

pub fn spec(id: FieldId) -> &'static FieldSpec {
    // FIELDS holds every FieldId exactly once, in discriminant order.
    &FIELDS[id as usize]
}

/// Fields whose text must be non-empty after trimming, in declared order.
/// The payment selector always holds a value and is not part of this set.
pub fn required_fields(payment: PaymentMethod) -> Vec<FieldId> {
    FIELDS
        .iter()
        .filter(|f| f.kind != FieldKind::Choice && f.is_required(payment))
        .map(|f| f.id)
        .collect()
}

/// Fields to render, in focus order: payment selector first, then text inputs.
pub fn visible_fields(payment: PaymentMethod) -> Vec<&'static FieldSpec> {
    let mut out = vec![spec(FieldId::PaymentMethod)];
    out.extend(
        FIELDS
            .iter()
            .filter(|f| f.kind != FieldKind::Choice && f.is_visible(payment)),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_follows_field_id_order() {
        let ids: Vec<FieldId> = FIELDS.iter().map(|f| f.id).collect();
        assert_eq!(ids, FieldId::ALL.to_vec());
        for id in FieldId::ALL {
            assert_eq!(spec(id).id, id);
        }
    }

    #[test]
    fn offline_requires_seven_fields() {
        assert_eq!(
            required_fields(PaymentMethod::Offline),
            vec![
                FieldId::TeamName,
                FieldId::Name1,
                FieldId::Name2,
                FieldId::Department,
                FieldId::Email,
                FieldId::Phone1,
                FieldId::Phone2,
            ]
        );
    }

    #[test]
    fn online_adds_transaction_id_last() {
        let req = required_fields(PaymentMethod::Online);
        assert_eq!(req.len(), 8);
        assert_eq!(req.last(), Some(&FieldId::TransactionId));
    }

    #[test]
    fn transaction_field_only_visible_online() {
        let offline: Vec<FieldId> = visible_fields(PaymentMethod::Offline)
            .iter()
            .map(|f| f.id)
            .collect();
        assert!(!offline.contains(&FieldId::TransactionId));
        assert_eq!(offline.first(), Some(&FieldId::PaymentMethod));

        let online: Vec<FieldId> = visible_fields(PaymentMethod::Online)
            .iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(online.last(), Some(&FieldId::TransactionId));
        assert!(online.contains(&FieldId::College));
    }
}
