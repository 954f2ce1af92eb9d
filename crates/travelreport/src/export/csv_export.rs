//! CSV export of the whole store.

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::{Error, Result};
use crate::report::Report;

/// Column headers, in output order.
pub const CSV_COLUMNS: [&str; 15] = [
    "ID",
    "Created At",
    "Booking No",
    "Name",
    "Phone Code",
    "Phone",
    "Email",
    "Country",
    "Country Code",
    "Hotel Name",
    "Agent Name",
    "Stay From",
    "Stay To",
    "Problem Type",
    "Report",
];

fn row(report: &Report) -> [String; 15] {
    let f = &report.fields;
    [
        report.id.to_string(),
        report.created_at.clone(),
        f.booking_no.clone(),
        f.name.clone(),
        f.phone_code.clone(),
        f.phone.clone(),
        f.email.clone(),
        f.country.clone(),
        f.country_code.clone(),
        f.hotel_name.clone(),
        f.agent_name.clone(),
        f.stay_from.clone(),
        f.stay_to.clone(),
        f.problem_type.label().to_string(),
        f.report_text.clone(),
    ]
}

/// Render every report as CSV: a header row, then one row per report, all
/// fields double-quoted.
///
/// # Errors
///
/// Returns [`Error::NothingToExport`] for an empty list.
pub fn render_store_csv(reports: &[Report]) -> Result<Vec<u8>> {
    if reports.is_empty() {
        return Err(Error::NothingToExport);
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_COLUMNS)?;
    for report in reports {
        writer.write_record(row(report))?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::internal(format!("flushing CSV buffer: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ProblemType, ReportFields};

    fn report(id: i64, text: &str) -> Report {
        Report {
            id,
            created_at: "2/3/2025, 4:05:06 PM".to_string(),
            fields: ReportFields {
                booking_no: format!("B{id}"),
                name: "Jane Doe".to_string(),
                phone_code: "+30".to_string(),
                problem_type: ProblemType::BookingIssue,
                report_text: text.to_string(),
                ..ReportFields::default()
            },
            traveler_signature: None,
            agent_signature: None,
        }
    }

    #[test]
    fn test_empty_store_is_rejected() {
        let err = render_store_csv(&[]).unwrap_err();
        assert!(err.is_empty_export());
    }

    #[test]
    fn test_header_and_rows_all_quoted() {
        let bytes = render_store_csv(&[report(2, "Late"), report(1, "Dirty")]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("\"ID\",\"Created At\",\"Booking No\""));
        assert!(lines[1].starts_with("\"2\",\"2/3/2025, 4:05:06 PM\",\"B2\",\"Jane Doe\",\"+30\""));
        assert!(lines[1].ends_with("\"Booking Issue\",\"Late\""));
        assert!(!text.contains('\r'));
    }

    #[test]
    fn test_row_count_matches_store_size() {
        let reports: Vec<Report> = (1..=5)
            .map(|id| report(id, "Line one\nLine \"two\""))
            .collect();
        let bytes = render_store_csv(&reports).unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(bytes.as_slice());
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

        assert_eq!(records.len(), reports.len() + 1);
        assert_eq!(records[0].len(), CSV_COLUMNS.len());
        assert_eq!(&records[1][14], "Line one\nLine \"two\"");
    }
}
