//! The live, unsaved report draft.

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::report::{ProblemType, Report, ReportFields, DEFAULT_PHONE_CODE};

/// A named text field of the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Booking reference.
    BookingNo,
    /// Traveler name.
    Name,
    /// Phone number.
    Phone,
    /// Dialing code.
    PhoneCode,
    /// Email address.
    Email,
    /// Country name.
    Country,
    /// Country code.
    CountryCode,
    /// Hotel name.
    HotelName,
    /// Agent name.
    AgentName,
    /// Start of stay.
    StayFrom,
    /// End of stay.
    StayTo,
    /// Complaint category.
    ProblemType,
    /// Free-text report.
    ReportText,
}

impl Field {
    /// Every field, in form order.
    pub const ALL: [Self; 13] = [
        Self::BookingNo,
        Self::Name,
        Self::Phone,
        Self::PhoneCode,
        Self::Email,
        Self::Country,
        Self::CountryCode,
        Self::HotelName,
        Self::AgentName,
        Self::StayFrom,
        Self::StayTo,
        Self::ProblemType,
        Self::ReportText,
    ];

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::BookingNo => "Booking No",
            Self::Name => "Name",
            Self::Phone => "Phone",
            Self::PhoneCode => "Phone Code",
            Self::Email => "Email",
            Self::Country => "Country",
            Self::CountryCode => "Country Code",
            Self::HotelName => "Hotel Name",
            Self::AgentName => "Agent Name",
            Self::StayFrom => "Stay From",
            Self::StayTo => "Stay To",
            Self::ProblemType => "Problem Type",
            Self::ReportText => "Report",
        }
    }

    /// The persisted (camelCase) key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::BookingNo => "bookingNo",
            Self::Name => "name",
            Self::Phone => "phone",
            Self::PhoneCode => "phoneCode",
            Self::Email => "email",
            Self::Country => "country",
            Self::CountryCode => "countryCode",
            Self::HotelName => "hotelName",
            Self::AgentName => "agentName",
            Self::StayFrom => "stayFrom",
            Self::StayTo => "stayTo",
            Self::ProblemType => "problemType",
            Self::ReportText => "reportText",
        }
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.key() == s)
            .ok_or_else(|| format!("unknown field '{s}'"))
    }
}

/// The in-progress report.
///
/// Field writes are never validated; [`Draft::validate`] runs when the draft
/// is saved or exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    fields: ReportFields,
    default_phone_code: String,
}

impl Default for Draft {
    fn default() -> Self {
        Self::new(DEFAULT_PHONE_CODE)
    }
}

impl Draft {
    /// Create an empty draft whose phone code starts at `default_phone_code`.
    #[must_use]
    pub fn new(default_phone_code: impl Into<String>) -> Self {
        let default_phone_code = default_phone_code.into();
        Self {
            fields: ReportFields {
                phone_code: default_phone_code.clone(),
                ..ReportFields::default()
            },
            default_phone_code,
        }
    }

    /// The current field values.
    #[must_use]
    pub fn fields(&self) -> &ReportFields {
        &self.fields
    }

    /// Replace one field, leaving the others untouched.
    ///
    /// An unrecognized problem type clears the category.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        let f = &mut self.fields;
        match field {
            Field::BookingNo => f.booking_no = value,
            Field::Name => f.name = value,
            Field::Phone => f.phone = value,
            Field::PhoneCode => f.phone_code = value,
            Field::Email => f.email = value,
            Field::Country => f.country = value,
            Field::CountryCode => f.country_code = value,
            Field::HotelName => f.hotel_name = value,
            Field::AgentName => f.agent_name = value,
            Field::StayFrom => f.stay_from = value,
            Field::StayTo => f.stay_to = value,
            Field::ProblemType => f.problem_type = value.parse().unwrap_or_default(),
            Field::ReportText => f.report_text = value,
        }
    }

    /// Read one field as text.
    #[must_use]
    pub fn get(&self, field: Field) -> &str {
        let f = &self.fields;
        match field {
            Field::BookingNo => &f.booking_no,
            Field::Name => &f.name,
            Field::Phone => &f.phone,
            Field::PhoneCode => &f.phone_code,
            Field::Email => &f.email,
            Field::Country => &f.country,
            Field::CountryCode => &f.country_code,
            Field::HotelName => &f.hotel_name,
            Field::AgentName => &f.agent_name,
            Field::StayFrom => &f.stay_from,
            Field::StayTo => &f.stay_to,
            Field::ProblemType => f.problem_type.label(),
            Field::ReportText => &f.report_text,
        }
    }

    /// Set the complaint category directly.
    pub fn set_problem_type(&mut self, problem_type: ProblemType) {
        self.fields.problem_type = problem_type;
    }

    /// Restore every field to its empty default.
    pub fn reset(&mut self) {
        self.fields = ReportFields {
            phone_code: self.default_phone_code.clone(),
            ..ReportFields::default()
        };
    }

    /// Overwrite the draft with a saved report's text fields.
    pub fn load_report(&mut self, report: &Report) {
        self.fields = report.fields.clone();
    }

    /// Check the fields required to save or export.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] for the first empty required field.
    pub fn validate(&self) -> Result<()> {
        for field in [Field::BookingNo, Field::Name] {
            if self.get(field).trim().is_empty() {
                return Err(Error::MissingField {
                    field: field.label(),
                });
            }
        }
        Ok(())
    }

    /// Check whether every field is at its default.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        *self == Self::new(self.default_phone_code.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_draft_defaults() {
        let draft = Draft::default();
        assert_eq!(draft.fields().phone_code, DEFAULT_PHONE_CODE);
        assert_eq!(draft.fields().booking_no, "");
        assert_eq!(draft.fields().problem_type, ProblemType::Unspecified);
        assert!(draft.is_pristine());
    }

    #[test]
    fn test_set_field_preserves_others() {
        let mut draft = Draft::default();
        draft.set_field(Field::BookingNo, "B100");
        draft.set_field(Field::Name, "Jane Doe");
        draft.set_field(Field::BookingNo, "B101");

        assert_eq!(draft.get(Field::BookingNo), "B101");
        assert_eq!(draft.get(Field::Name), "Jane Doe");
        assert_eq!(draft.get(Field::PhoneCode), DEFAULT_PHONE_CODE);
        assert!(!draft.is_pristine());
    }

    #[test]
    fn test_every_field_round_trips_through_get() {
        let mut draft = Draft::default();
        for field in Field::ALL {
            let value = if field == Field::ProblemType {
                "Service".to_string()
            } else {
                format!("value-{}", field.key())
            };
            draft.set_field(field, value.clone());
            assert_eq!(draft.get(field), value);
        }
    }

    #[test]
    fn test_set_problem_type_parses_label() {
        let mut draft = Draft::default();
        draft.set_field(Field::ProblemType, "Payment");
        assert_eq!(draft.fields().problem_type, ProblemType::Payment);

        draft.set_field(Field::ProblemType, "nonsense");
        assert_eq!(draft.fields().problem_type, ProblemType::Unspecified);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut draft = Draft::new("+44");
        draft.set_field(Field::BookingNo, "B1");
        draft.set_field(Field::PhoneCode, "+1");
        draft.set_field(Field::ReportText, "Cold shower");
        draft.reset();

        assert!(draft.is_pristine());
        assert_eq!(draft.get(Field::PhoneCode), "+44");
        assert_eq!(draft.get(Field::ReportText), "");
    }

    #[test]
    fn test_validate_requires_booking_no_and_name() {
        let mut draft = Draft::default();
        let err = draft.validate().unwrap_err();
        assert_eq!(err.to_string(), "Booking No is required");

        draft.set_field(Field::BookingNo, "B100");
        let err = draft.validate().unwrap_err();
        assert_eq!(err.to_string(), "Name is required");

        draft.set_field(Field::Name, "   ");
        assert!(draft.validate().unwrap_err().is_validation_error());

        draft.set_field(Field::Name, "Jane Doe");
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_field_from_key() {
        assert_eq!("hotelName".parse::<Field>(), Ok(Field::HotelName));
        assert!("hotel".parse::<Field>().is_err());
        for field in Field::ALL {
            assert_eq!(field.key().parse::<Field>(), Ok(field));
        }
    }

    #[test]
    fn test_load_report_copies_text_fields() {
        let fields = ReportFields {
            booking_no: "B9".to_string(),
            name: "Kim".to_string(),
            stay_to: "2025-06-01".to_string(),
            ..ReportFields::default()
        };
        let report = Report {
            id: 1,
            created_at: String::new(),
            fields: fields.clone(),
            traveler_signature: None,
            agent_signature: None,
        };

        let mut draft = Draft::default();
        draft.set_field(Field::Email, "stale@example.com");
        draft.load_report(&report);
        assert_eq!(draft.fields(), &fields);
    }
}
