//! PDF rendering of a single report.
//!
//! Rendering happens in two steps. [`plan_report`] lays the report out as a
//! list of positioned elements per page (coordinates in millimetres from the
//! top-left corner); [`render_plan`] turns that plan into PDF bytes.

use std::collections::BTreeSet;

use printpdf::image_crate::{DynamicImage, GenericImageView, Rgb, RgbImage};
use printpdf::{
    Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point,
};
use tracing::{debug, warn};

use super::fonts::{TextMetrics, BOLD_TTF, REGULAR_TTF};
use crate::error::{Error, Result};
use crate::report::{Report, ReportFields};
use crate::signature::{SignatureImage, SignatureRole};

const IMAGE_DPI: f32 = 300.0;

const TITLE: &str = "Travel Agent Report";
const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 11.0;
const FOOTER_SIZE: f32 = 9.0;

const FIELD_LINE_MM: f32 = 7.0;
const BODY_LINE_MM: f32 = 6.0;
const COLUMN_GAP_MM: f32 = 5.0;
const SIGNATURE_WIDTH_MM: f32 = 80.0;
const SIGNATURE_HEIGHT_MM: f32 = 40.0;

/// Page size, margins and the space required before the signature block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Page width.
    pub width_mm: f32,
    /// Page height.
    pub height_mm: f32,
    /// Left, right, top and bottom margin.
    pub margin_mm: f32,
    /// Start a new page for the signatures when less than this much
    /// vertical space remains.
    pub break_threshold_mm: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        // A4
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 15.0,
            break_threshold_mm: 70.0,
        }
    }
}

impl PageGeometry {
    fn content_width(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm
    }

    fn right_edge(&self) -> f32 {
        self.width_mm - self.margin_mm
    }

    fn right_column(&self) -> f32 {
        self.width_mm / 2.0 + 5.0
    }

    fn bottom_limit(&self) -> f32 {
        // Leave room for the footer.
        self.height_mm - self.margin_mm - 5.0
    }
}

/// One positioned drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A line of text; `y` is the baseline.
    Text {
        /// Left edge.
        x: f32,
        /// Baseline, from the top of the page.
        y: f32,
        /// Font size in points.
        size: f32,
        /// Bold face.
        bold: bool,
        /// Content.
        text: String,
    },
    /// A horizontal rule.
    Rule {
        /// Start.
        x1: f32,
        /// End.
        x2: f32,
        /// Height from the top of the page.
        y: f32,
    },
    /// A signature fitted into a box; `y` is the top edge.
    Signature {
        /// Whose signature.
        role: SignatureRole,
        /// Left edge.
        x: f32,
        /// Top edge.
        y: f32,
        /// Box width.
        width: f32,
        /// Box height.
        height: f32,
    },
}

/// Elements of one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagePlan {
    /// Drawing instructions in paint order.
    pub elements: Vec<Element>,
}

impl PagePlan {
    /// All text on the page, one entry per text element.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                Element::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A fully laid out document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPlan {
    /// Pages in order.
    pub pages: Vec<PagePlan>,
}

impl DocumentPlan {
    /// Characters anywhere in the document that the report fonts lack.
    #[must_use]
    pub fn missing_chars(&self, metrics: &TextMetrics) -> BTreeSet<char> {
        self.pages
            .iter()
            .flat_map(|page| &page.elements)
            .filter_map(|e| match e {
                Element::Text { bold, text, .. } => Some(metrics.missing_chars(text, *bold)),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

/// What gets printed: the text fields, signatures and, for saved reports,
/// id and creation time.
#[derive(Debug, Clone, Copy)]
pub struct PdfSource<'a> {
    /// Text fields.
    pub fields: &'a ReportFields,
    /// Traveler signature, if signed.
    pub traveler_signature: Option<&'a SignatureImage>,
    /// Agent signature, if signed.
    pub agent_signature: Option<&'a SignatureImage>,
    /// Id of a saved report.
    pub report_id: Option<i64>,
    /// Creation time of a saved report.
    pub created_at: Option<&'a str>,
}

impl<'a> PdfSource<'a> {
    /// Source for a saved report.
    #[must_use]
    pub fn from_report(report: &'a Report) -> Self {
        Self {
            fields: &report.fields,
            traveler_signature: report.traveler_signature.as_ref(),
            agent_signature: report.agent_signature.as_ref(),
            report_id: Some(report.id),
            created_at: Some(&report.created_at),
        }
    }

    /// Source for an unsaved draft.
    #[must_use]
    pub fn from_draft(
        fields: &'a ReportFields,
        traveler_signature: Option<&'a SignatureImage>,
        agent_signature: Option<&'a SignatureImage>,
    ) -> Self {
        Self {
            fields,
            traveler_signature,
            agent_signature,
            report_id: None,
            created_at: None,
        }
    }

    fn signature(&self, role: SignatureRole) -> Option<&'a SignatureImage> {
        match role {
            SignatureRole::Traveler => self.traveler_signature,
            SignatureRole::Agent => self.agent_signature,
        }
    }
}

struct Cursor {
    geometry: PageGeometry,
    pages: Vec<PagePlan>,
    y: f32,
}

impl Cursor {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![PagePlan::default()],
            y: geometry.margin_mm,
        }
    }

    fn push(&mut self, element: Element) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn text(&mut self, x: f32, y: f32, size: f32, bold: bool, text: impl Into<String>) {
        self.push(Element::Text {
            x,
            y,
            size,
            bold,
            text: text.into(),
        });
    }

    fn new_page(&mut self) {
        self.pages.push(PagePlan::default());
        self.y = self.geometry.margin_mm + 5.0;
    }

    fn remaining(&self) -> f32 {
        self.geometry.height_mm - self.y
    }
}

/// Lay out one report.
///
/// `generated_at` is printed in the footer of every page. Field values and
/// the report body are wrapped to the width of their column as measured by
/// `metrics`.
#[must_use]
pub fn plan_report(
    source: &PdfSource<'_>,
    geometry: PageGeometry,
    generated_at: &str,
    metrics: &TextMetrics,
) -> DocumentPlan {
    let mut cur = Cursor::new(geometry);
    let left = geometry.margin_mm;
    let right = geometry.right_column();
    let f = source.fields;

    // Header
    cur.y += 7.0;
    cur.text(left, cur.y, TITLE_SIZE, true, TITLE);
    cur.y += 5.0;
    cur.push(Element::Rule {
        x1: left,
        x2: geometry.right_edge(),
        y: cur.y,
    });
    cur.y += 10.0;

    // Two-column field block
    let country = match (f.country.as_str(), f.country_code.as_str()) {
        (c, "") => c.to_string(),
        ("", code) => code.to_string(),
        (c, code) => format!("{c} ({code})"),
    };
    let left_rows = [
        ("Booking No", f.booking_no.clone()),
        ("Name", f.name.clone()),
        ("Phone", f.full_phone()),
        ("Email", f.email.clone()),
        ("Country", country),
        ("Hotel", f.hotel_name.clone()),
        ("Problem Type", f.problem_type.label().to_string()),
    ];
    let mut right_rows = vec![
        ("Stay From", f.stay_from.clone()),
        ("Stay To", f.stay_to.clone()),
        ("Agent Name", f.agent_name.clone()),
    ];
    if let Some(created_at) = source.created_at {
        right_rows.push(("Created", created_at.to_string()));
    }

    let columns = [
        (left, right - left - COLUMN_GAP_MM, &left_rows[..]),
        (right, geometry.right_edge() - right, &right_rows[..]),
    ];
    for row in 0..left_rows.len().max(right_rows.len()) {
        let wrapped: Vec<(f32, Vec<String>)> = columns
            .iter()
            .map(|(x, width, rows)| {
                let lines = rows.get(row).map_or_else(Vec::new, |(label, value)| {
                    metrics.wrap(&format!("{label}: {value}"), *width, BODY_SIZE, false)
                });
                (*x, lines)
            })
            .collect();
        let line_count = wrapped.iter().map(|(_, l)| l.len()).max().unwrap_or(1).max(1);
        #[allow(clippy::cast_precision_loss)]
        let height = (line_count - 1) as f32 * BODY_LINE_MM + FIELD_LINE_MM;
        if cur.y + height > geometry.bottom_limit() {
            cur.new_page();
        }
        for (x, lines) in wrapped {
            for (i, line) in lines.into_iter().enumerate() {
                #[allow(clippy::cast_precision_loss)]
                let y = cur.y + i as f32 * BODY_LINE_MM;
                cur.text(x, y, BODY_SIZE, false, line);
            }
        }
        cur.y += height;
    }
    cur.y += 3.0;

    // Report body
    cur.text(left, cur.y, HEADING_SIZE, true, "Report");
    cur.y += 7.0;
    for line in metrics.wrap(&f.report_text, geometry.content_width(), BODY_SIZE, false) {
        if cur.y > geometry.bottom_limit() {
            cur.new_page();
        }
        cur.text(left, cur.y, BODY_SIZE, false, line);
        cur.y += BODY_LINE_MM;
    }
    cur.y += 6.0;

    // Signatures
    if cur.remaining() < geometry.break_threshold_mm {
        debug!(
            "Signature block moved to page {} ({:.1}mm left)",
            cur.pages.len() + 1,
            cur.remaining()
        );
        cur.new_page();
    }
    cur.text(left, cur.y, HEADING_SIZE, true, "Signatures");
    cur.y += 4.0;
    let box_top = cur.y;
    for (role, x) in [(SignatureRole::Traveler, left), (SignatureRole::Agent, right)] {
        if source.signature(role).is_some() {
            cur.push(Element::Signature {
                role,
                x,
                y: box_top,
                width: SIGNATURE_WIDTH_MM,
                height: SIGNATURE_HEIGHT_MM,
            });
        } else {
            cur.text(
                x,
                box_top + SIGNATURE_HEIGHT_MM / 2.0,
                BODY_SIZE,
                false,
                "(not signed)",
            );
        }
        cur.push(Element::Rule {
            x1: x,
            x2: x + SIGNATURE_WIDTH_MM,
            y: box_top + SIGNATURE_HEIGHT_MM + 1.0,
        });
        cur.text(
            x,
            box_top + SIGNATURE_HEIGHT_MM + 6.0,
            BODY_SIZE,
            false,
            role.caption(),
        );
    }

    // Footer on every page
    let footer_y = geometry.height_mm - geometry.margin_mm + 5.0;
    let generated = format!("Generated: {generated_at}");
    let id_text = source.report_id.map(|id| format!("Report ID: {id}"));
    for page in &mut cur.pages {
        page.elements.push(Element::Text {
            x: left,
            y: footer_y,
            size: FOOTER_SIZE,
            bold: false,
            text: generated.clone(),
        });
        if let Some(id_text) = &id_text {
            page.elements.push(Element::Text {
                x: right,
                y: footer_y,
                size: FOOTER_SIZE,
                bold: false,
                text: id_text.clone(),
            });
        }
    }

    let plan = DocumentPlan { pages: cur.pages };
    let missing = plan.missing_chars(metrics);
    if !missing.is_empty() {
        warn!(
            "Report text has characters the PDF font cannot draw; they are left out: {}",
            missing.into_iter().collect::<String>()
        );
    }
    plan
}

fn pdf_err(err: impl std::fmt::Display) -> Error {
    Error::pdf(err.to_string())
}

/// Flatten transparency onto white paper.
fn flatten_on_white(image: &DynamicImage) -> DynamicImage {
    let rgba = image.to_rgba8();
    let flat = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = u16::from(a);
        let blend = |c: u8| -> u8 {
            let v = (u16::from(c) * a + 255 * (255 - a)) / 255;
            u8::try_from(v).unwrap_or(u8::MAX)
        };
        Rgb([blend(r), blend(g), blend(b)])
    });
    DynamicImage::ImageRgb8(flat)
}

fn draw_signature(
    layer: &PdfLayerReference,
    geometry: &PageGeometry,
    signature: &SignatureImage,
    (x, y, width, height): (f32, f32, f32, f32),
) -> Result<()> {
    let decoded = flatten_on_white(&signature.decode()?);
    let (px_w, px_h) = decoded.dimensions();
    if px_w == 0 || px_h == 0 {
        return Ok(());
    }

    #[allow(clippy::cast_precision_loss)]
    let (natural_w, natural_h) = (
        px_w as f32 / IMAGE_DPI * 25.4,
        px_h as f32 / IMAGE_DPI * 25.4,
    );
    let scale = (width / natural_w).min(height / natural_h);
    let drawn_h = natural_h * scale;

    Image::from_dynamic_image(&decoded).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(geometry.height_mm - y - drawn_h)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
    Ok(())
}

fn draw_page(
    layer: &PdfLayerReference,
    page: &PagePlan,
    geometry: &PageGeometry,
    source: &PdfSource<'_>,
    fonts: &(IndirectFontRef, IndirectFontRef),
) -> Result<()> {
    let flip = |y: f32| Mm(geometry.height_mm - y);
    for element in &page.elements {
        match element {
            Element::Text {
                x,
                y,
                size,
                bold,
                text,
            } => {
                let font = if *bold { &fonts.1 } else { &fonts.0 };
                layer.use_text(text.clone(), *size, Mm(*x), flip(*y), font);
            }
            Element::Rule { x1, x2, y } => {
                layer.set_outline_thickness(0.5);
                layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(*x1), flip(*y)), false),
                        (Point::new(Mm(*x2), flip(*y)), false),
                    ],
                    is_closed: false,
                });
            }
            Element::Signature {
                role,
                x,
                y,
                width,
                height,
            } => {
                if let Some(signature) = source.signature(*role) {
                    draw_signature(layer, geometry, signature, (*x, *y, *width, *height))?;
                }
            }
        }
    }
    Ok(())
}

/// Render a laid-out document to PDF bytes.
///
/// # Errors
///
/// Returns an error if a signature cannot be decoded or the document cannot
/// be serialized.
pub fn render_plan(
    plan: &DocumentPlan,
    geometry: PageGeometry,
    source: &PdfSource<'_>,
) -> Result<Vec<u8>> {
    let (width, height) = (Mm(geometry.width_mm), Mm(geometry.height_mm));
    let (doc, first_page, first_layer) = PdfDocument::new(TITLE, width, height, "Layer 1");
    let regular = doc.add_external_font(REGULAR_TTF).map_err(pdf_err)?;
    let bold = doc.add_external_font(BOLD_TTF).map_err(pdf_err)?;
    let fonts = (regular, bold);

    for (index, page) in plan.pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(width, height, "Layer 1")
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);
        draw_page(&layer, page, &geometry, source, &fonts)?;
    }

    doc.save_to_bytes().map_err(pdf_err)
}

/// Lay out and render one report.
///
/// # Errors
///
/// Returns an error if rendering fails.
pub fn render_report_pdf(
    source: &PdfSource<'_>,
    geometry: PageGeometry,
    generated_at: &str,
) -> Result<Vec<u8>> {
    let metrics = TextMetrics::load()?;
    let plan = plan_report(source, geometry, generated_at, &metrics);
    debug!("Rendering report PDF with {} page(s)", plan.pages.len());
    render_plan(&plan, geometry, source)
}
