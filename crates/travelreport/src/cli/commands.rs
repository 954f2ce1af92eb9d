//! CLI command definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::builder::PossibleValuesParser;
use clap::{Args, Subcommand, ValueEnum};

use crate::error::{Error, Result};
use crate::form::{Draft, Field};
use crate::report::{ProblemType, DIALING_CODES};
use crate::signature::SignaturePads;

/// Draft fields and signatures given on the command line.
#[derive(Debug, Default, Args)]
pub struct DraftArgs {
    /// Booking reference (required to save or export)
    #[arg(short, long)]
    pub booking_no: Option<String>,

    /// Traveler name (required to save or export)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Dialing code for the phone number
    #[arg(long, value_parser = PossibleValuesParser::new(DIALING_CODES.iter().copied()))]
    pub phone_code: Option<String>,

    /// Email address
    #[arg(long)]
    pub email: Option<String>,

    /// Country
    #[arg(long)]
    pub country: Option<String>,

    /// Country code
    #[arg(long)]
    pub country_code: Option<String>,

    /// Hotel name
    #[arg(long)]
    pub hotel: Option<String>,

    /// Handling agent
    #[arg(short, long)]
    pub agent: Option<String>,

    /// First day of the stay (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub stay_from: Option<String>,

    /// Last day of the stay (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub stay_to: Option<String>,

    /// Type of problem
    #[arg(short = 't', long, value_enum)]
    pub problem_type: Option<ProblemType>,

    /// Report text
    #[arg(short, long, conflicts_with = "report_file")]
    pub report: Option<String>,

    /// Read the report text from a file
    #[arg(long, value_name = "FILE")]
    pub report_file: Option<PathBuf>,

    /// Traveler signature (PNG file or data URL)
    #[arg(long, value_name = "PNG")]
    pub traveler_signature: Option<String>,

    /// Agent signature (PNG file or data URL)
    #[arg(long, value_name = "PNG")]
    pub agent_signature: Option<String>,
}

impl DraftArgs {
    /// Write the given fields into `draft` and load the signature pads.
    ///
    /// # Errors
    ///
    /// Returns an error if the report file or a signature cannot be read.
    pub fn apply(&self, draft: &mut Draft, pads: &mut SignaturePads) -> Result<()> {
        let text_fields = [
            (Field::BookingNo, &self.booking_no),
            (Field::Name, &self.name),
            (Field::Phone, &self.phone),
            (Field::PhoneCode, &self.phone_code),
            (Field::Email, &self.email),
            (Field::Country, &self.country),
            (Field::CountryCode, &self.country_code),
            (Field::HotelName, &self.hotel),
            (Field::AgentName, &self.agent),
            (Field::StayFrom, &self.stay_from),
            (Field::StayTo, &self.stay_to),
            (Field::ReportText, &self.report),
        ];
        for (field, value) in text_fields {
            if let Some(value) = value {
                draft.set_field(field, value.clone());
            }
        }

        if let Some(path) = &self.report_file {
            let text = std::fs::read_to_string(path).map_err(|source| Error::FileRead {
                path: path.clone(),
                source,
            })?;
            draft.set_field(Field::ReportText, text);
        }
        if let Some(problem_type) = self.problem_type {
            draft.set_problem_type(problem_type);
        }

        if let Some(source) = &self.traveler_signature {
            pads.traveler.load_source(source)?;
        }
        if let Some(source) = &self.agent_signature {
            pads.agent.load_source(source)?;
        }
        Ok(())
    }
}

fn parse_date(value: &str) -> std::result::Result<String, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

/// Export commands.
#[derive(Debug, Subcommand)]
pub enum ExportCommand {
    /// Export a saved report, or the draft given by the field options, as PDF
    Pdf {
        /// Id of a saved report to export
        #[arg(long)]
        id: Option<i64>,

        /// Draft to export when no id is given
        #[command(flatten)]
        draft: DraftArgs,
    },

    /// Export every saved report as CSV
    Csv,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// View command arguments.
#[derive(Debug, Args)]
pub struct ViewCommand {
    /// Report id
    pub id: i64,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Report id
    pub id: i64,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::sample_signature_png;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-07-01"), Ok("2025-07-01".to_string()));
        assert!(parse_date("01/07/2025").is_err());
        assert!(parse_date("2025-02-30").is_err());
    }

    #[test]
    fn test_apply_sets_only_given_fields() {
        let mut draft = Draft::default();
        draft.set_field(Field::Email, "keep@example.com");
        let mut pads = SignaturePads::default();

        let args = DraftArgs {
            booking_no: Some("B100".to_string()),
            name: Some("Jane Doe".to_string()),
            problem_type: Some(ProblemType::Payment),
            report: Some("Room not ready".to_string()),
            ..DraftArgs::default()
        };
        args.apply(&mut draft, &mut pads).unwrap();

        assert_eq!(draft.get(Field::BookingNo), "B100");
        assert_eq!(draft.get(Field::Email), "keep@example.com");
        assert_eq!(draft.fields().problem_type, ProblemType::Payment);
        assert_eq!(draft.get(Field::ReportText), "Room not ready");
        assert!(pads.traveler.is_blank());
    }

    #[test]
    fn test_apply_reads_report_file_and_signatures() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("report.txt");
        std::fs::write(&report_path, "Noisy room\nNo hot water").unwrap();
        let sig_path = dir.path().join("sig.png");
        std::fs::write(&sig_path, sample_signature_png()).unwrap();

        let args = DraftArgs {
            report_file: Some(report_path),
            traveler_signature: Some(sig_path.to_string_lossy().into_owned()),
            ..DraftArgs::default()
        };
        let mut draft = Draft::default();
        let mut pads = SignaturePads::default();
        args.apply(&mut draft, &mut pads).unwrap();

        assert_eq!(draft.get(Field::ReportText), "Noisy room\nNo hot water");
        assert!(!pads.traveler.is_blank());
        assert!(pads.agent.is_blank());
    }

    #[test]
    fn test_apply_bad_signature_fails() {
        let args = DraftArgs {
            agent_signature: Some("/nonexistent.png".to_string()),
            ..DraftArgs::default()
        };
        let err = args
            .apply(&mut Draft::default(), &mut SignaturePads::default())
            .unwrap_err();
        assert!(matches!(err, Error::Signature { .. }));
    }
}
