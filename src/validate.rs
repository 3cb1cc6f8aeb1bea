use crate::error::ValidationError;
use crate::model::{FieldId, RegistrationRecord};
use crate::schema;
use regex::Regex;
use std::sync::OnceLock;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid"))
}

/// Basic `local@domain.tld` shape check. No whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    email_re().is_match(email)
}

/// Required fields that are empty after trimming, in declared order.
pub fn missing_fields(record: &RegistrationRecord) -> Vec<FieldId> {
    schema::required_fields(record.payment_method)
        .into_iter()
        .filter(|id| record.get(*id).trim().is_empty())
        .collect()
}

/// Check a snapshot before it is written. Missing fields are reported first.
pub fn validate(record: &RegistrationRecord) -> Result<(), ValidationError> {
    let missing = missing_fields(record);
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }
    if !is_valid_email(&record.email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn filled_record() -> RegistrationRecord {
    RegistrationRecord {
        team_name: "Null Pointers".into(),
        name1: "Asha".into(),
        name2: "Ravi".into(),
        college: String::new(),
        department: "CSE".into(),
        email: "asha@example.com".into(),
        phone1: "9000000001".into(),
        phone2: "9000000002".into(),
        transaction_id: String::new(),
        payment_method: crate::model::PaymentMethod::Offline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaymentMethod;

    #[test]
    fn every_subset_of_empty_required_fields_is_reported_in_order() {
        let required = schema::required_fields(PaymentMethod::Offline);
        for mask in 1u32..(1 << required.len()) {
            let mut record = filled_record();
            let mut expected = Vec::new();
            for (i, id) in required.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    // whitespace-only counts as empty
                    record = record.with_field(*id, "  ").unwrap();
                    expected.push(*id);
                }
            }
            assert_eq!(
                validate(&record),
                Err(ValidationError::MissingFields(expected))
            );
        }
    }

    #[test]
    fn bad_email_shapes_are_rejected() {
        for email in [
            "plainaddress",
            "no-at.example.com",
            "user@nodot",
            "user@domain.",
            "@domain.com",
            "user @domain.com",
            "user@domain .com",
        ] {
            let record = RegistrationRecord {
                email: email.into(),
                ..filled_record()
            };
            assert_eq!(
                validate(&record),
                Err(ValidationError::InvalidEmail),
                "{email:?} should be rejected"
            );
        }
    }

    #[test]
    fn good_email_shapes_pass() {
        for email in ["a@b.c", "first.last@uni.ac.in", "x+y@sub.domain.org"] {
            assert!(is_valid_email(email), "{email:?} should pass");
        }
    }

    #[test]
    fn offline_does_not_require_transaction_id() {
        let record = filled_record();
        assert!(record.transaction_id.is_empty());
        assert_eq!(validate(&record), Ok(()));
    }

    #[test]
    fn online_requires_transaction_id() {
        let record = RegistrationRecord {
            payment_method: PaymentMethod::Online,
            ..filled_record()
        };
        assert_eq!(
            validate(&record),
            Err(ValidationError::MissingFields(vec![FieldId::TransactionId]))
        );

        let paid = RegistrationRecord {
            transaction_id: "0xabc".into(),
            ..record
        };
        assert_eq!(validate(&paid), Ok(()));
    }

    #[test]
    fn missing_fields_win_over_bad_email() {
        let record = RegistrationRecord {
            team_name: String::new(),
            email: "nope".into(),
            ..filled_record()
        };
        assert_eq!(
            validate(&record),
            Err(ValidationError::MissingFields(vec![FieldId::TeamName]))
        );
    }

    #[test]
    fn college_is_optional() {
        let record = RegistrationRecord {
            college: "   ".into(),
            ..filled_record()
        };
        assert_eq!(validate(&record), Ok(()));
    }
}
