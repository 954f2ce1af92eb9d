//! Core report types.
//!
//! A [`Report`] is the only persisted entity: the text fields of a complaint
//! plus the two signature snapshots taken when it was saved. Reports are
//! never edited after creation.

use std::str::FromStr;

use chrono::{DateTime, Local, TimeZone};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::signature::SignatureImage;

/// Dialing codes offered for the phone number.
pub const DIALING_CODES: &[&str] = &[
    "+1", "+7", "+20", "+27", "+30", "+31", "+32", "+33", "+34", "+36", "+39", "+40", "+41",
    "+43", "+44", "+45", "+46", "+47", "+48", "+49", "+52", "+55", "+61", "+81", "+82", "+86",
    "+90", "+91", "+351", "+353", "+357", "+359", "+971", "+972",
];

/// Dialing code a fresh draft starts with unless configured otherwise.
pub const DEFAULT_PHONE_CODE: &str = "+30";

/// Display format of `createdAt`, e.g. `3/14/2025, 9:05:07 AM`.
const CREATED_AT_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Check whether `code` is one of the known dialing codes.
#[must_use]
pub fn is_dialing_code(code: &str) -> bool {
    DIALING_CODES.contains(&code)
}

/// Category of the traveler's complaint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
pub enum ProblemType {
    /// No category chosen.
    #[default]
    #[serde(rename = "")]
    #[value(skip)]
    Unspecified,
    /// Problem with the booking itself.
    #[serde(rename = "Booking Issue")]
    BookingIssue,
    /// Problem with the room or property.
    Accommodation,
    /// Problem with staff or services.
    Service,
    /// Billing or payment problem.
    Payment,
    /// Anything else.
    Other,
}

impl ProblemType {
    /// All selectable categories, in menu order.
    pub const ALL: [Self; 5] = [
        Self::BookingIssue,
        Self::Accommodation,
        Self::Service,
        Self::Payment,
        Self::Other,
    ];

    /// The label used in storage, CSV and PDF output.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Unspecified => "",
            Self::BookingIssue => "Booking Issue",
            Self::Accommodation => "Accommodation",
            Self::Service => "Service",
            Self::Payment => "Payment",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for ProblemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProblemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::Unspecified);
        }
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|p| p.label()).collect();
                format!("unknown problem type '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// The text fields shared by the draft and saved reports.
///
/// Optional fields are empty strings when not filled in, matching how the
/// persisted JSON has always looked.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportFields {
    /// Booking reference (required).
    pub booking_no: String,
    /// Traveler name (required).
    pub name: String,
    /// Phone number without dialing code.
    pub phone: String,
    /// Dialing code, one of [`DIALING_CODES`].
    pub phone_code: String,
    /// Contact email.
    pub email: String,
    /// Country name.
    pub country: String,
    /// ISO country code.
    pub country_code: String,
    /// Hotel the traveler stayed at.
    pub hotel_name: String,
    /// Handling agent.
    pub agent_name: String,
    /// Start of stay (`YYYY-MM-DD`).
    pub stay_from: String,
    /// End of stay (`YYYY-MM-DD`).
    pub stay_to: String,
    /// Complaint category.
    pub problem_type: ProblemType,
    /// Free-text description of the problem.
    pub report_text: String,
}

impl ReportFields {
    /// Phone number with its dialing code, or empty when no number was given.
    #[must_use]
    pub fn full_phone(&self) -> String {
        if self.phone.trim().is_empty() {
            String::new()
        } else if self.phone_code.is_empty() {
            self.phone.clone()
        } else {
            format!("{} {}", self.phone_code, self.phone)
        }
    }
}

/// A saved complaint report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Unique id: creation time in epoch milliseconds.
    pub id: i64,

    /// Creation time formatted for display.
    pub created_at: String,

    /// The report's text fields.
    #[serde(flatten)]
    pub fields: ReportFields,

    /// Traveler signature snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traveler_signature: Option<SignatureImage>,

    /// Agent signature snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_signature: Option<SignatureImage>,
}

impl Report {
    /// Create a report stamped with the given creation time.
    ///
    /// `newest_id` is the largest id already in the store; the new id is
    /// bumped past it so ids stay unique and increasing even when two saves
    /// land in the same millisecond.
    #[must_use]
    pub fn new<Tz: TimeZone>(
        fields: ReportFields,
        traveler_signature: Option<SignatureImage>,
        agent_signature: Option<SignatureImage>,
        created: &DateTime<Tz>,
        newest_id: Option<i64>,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            id: next_id(created.timestamp_millis(), newest_id),
            created_at: created.format(CREATED_AT_FORMAT).to_string(),
            fields,
            traveler_signature,
            agent_signature,
        }
    }

    /// Create a report stamped with the current local time.
    #[must_use]
    pub fn now(
        fields: ReportFields,
        traveler_signature: Option<SignatureImage>,
        agent_signature: Option<SignatureImage>,
        newest_id: Option<i64>,
    ) -> Self {
        Self::new(
            fields,
            traveler_signature,
            agent_signature,
            &Local::now(),
            newest_id,
        )
    }
}

/// Pick an id for a report created at `now_ms`.
#[must_use]
pub fn next_id(now_ms: i64, newest_id: Option<i64>) -> i64 {
    match newest_id {
        Some(newest) if newest >= now_ms => newest + 1,
        _ => now_ms,
    }
}
