//! Plain-text renderer for sealed Pact agreements.
//!
//! Turns a [`DocumentProjection`] into a paginated, fixed-width text document
//! with a "Page X of Y" footer on every page and form feeds between pages.
//! Pure and synchronous; the renderer never sees anything but the frozen
//! projection.
//!
//! # Quick start
//!
//! ```no_run
//! use pact_core::document::{DocumentProjection, DocumentRenderer};
//! use pact_document::TextRenderer;
//!
//! # fn demo(projection: &DocumentProjection) -> pact_core::Result<()> {
//! let document = TextRenderer::default().render(projection)?;
//! println!("{} pages, {} bytes", document.pages, document.body.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
mod layout;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
pub use error::{Error, Result};
use pact_core::{
  agreement::PartyRole,
  directory::ListingKind,
  document::{Document, DocumentProjection, DocumentRenderer, PartySummary},
};

use crate::layout::{Sheet, paginate};

/// Smallest page that still fits a footer and some body text.
pub const MIN_PAGE_LINES: usize = 10;
/// Narrowest page that still fits a signature hash on two lines.
pub const MIN_PAGE_WIDTH: usize = 40;

pub const DEFAULT_PAGE_LINES: usize = 54;
pub const DEFAULT_PAGE_WIDTH: usize = 78;

const MEDIA_TYPE: &str = "text/plain; charset=utf-8";
/// Blank separator plus the footer line.
const FOOTER_LINES: usize = 2;
const PAGE_BREAK: char = '\u{000C}';

// ─── Renderer ────────────────────────────────────────────────────────────────

/// Fixed-width text renderer.
#[derive(Debug, Clone, Copy)]
pub struct TextRenderer {
  page_lines: usize,
  page_width: usize,
}

impl Default for TextRenderer {
  fn default() -> Self {
    Self { page_lines: DEFAULT_PAGE_LINES, page_width: DEFAULT_PAGE_WIDTH }
  }
}

impl TextRenderer {
  /// A renderer producing pages of `page_lines` lines, `page_width`
  /// columns each.
  pub fn new(page_lines: usize, page_width: usize) -> Result<Self> {
    if page_lines < MIN_PAGE_LINES {
      return Err(Error::PageTooShort(page_lines));
    }
    if page_width < MIN_PAGE_WIDTH {
      return Err(Error::PageTooNarrow(page_width));
    }
    Ok(Self { page_lines, page_width })
  }

  /// Render `projection` into its page texts, without footers.
  fn body(&self, projection: &DocumentProjection) -> Vec<String> {
    let mut sheet = Sheet::new(self.page_width);
    let terms = Terms::for_kind(projection.listing.kind);

    // Title block
    sheet.centered(terms.title);
    sheet.centered(&format!("Agreement {}", projection.agreement_id));
    sheet.blank();

    // Listing
    sheet.heading(terms.listing_heading);
    sheet.field("Title", &projection.listing.title);
    sheet.field("Location", &projection.listing.location);
    sheet.field(
      "Rate",
      &format!("{} per {}", format_price(projection.listing.price), terms.period),
    );
    sheet.field(
      "Period",
      &format_period(projection.start_date, projection.end_date),
    );
    sheet.field("Governing law", &projection.country_code);

    // Parties
    sheet.heading("Parties");
    party(&mut sheet, terms.role_label(PartyRole::Host), &projection.host);
    party(&mut sheet, terms.role_label(PartyRole::Guest), &projection.guest);

    // Terms
    sheet.heading("Preamble");
    sheet.paragraph(&projection.preamble, 0);

    for (n, clause) in projection.clauses.iter().enumerate() {
      sheet.heading(&format!("{}. {}", n + 1, clause.title));
      sheet.paragraph(&clause.content, 0);
    }

    // Signatures
    sheet.heading("Signatures");
    for signature in &projection.signatures {
      let role = projection
        .signer_role(signature.user_id)
        .map(|r| terms.role_label(r))
        .unwrap_or("Signatory");
      sheet.field(role, &signature.name);
      sheet.field("  Signed at", &format_timestamp(signature.signed_at));
      sheet.field("  IP address", &signature.ip_address);
      sheet.blank();
    }

    // Integrity
    sheet.heading("Integrity");
    sheet.paragraph(
      "The parties' consent and the text above are protected by the SHA-256 \
       digest below. Any change to the terms or signatures produces a \
       different digest.",
      0,
    );
    sheet.blank();
    sheet.field("SHA-256", &projection.hash);
    sheet.field("Finalized", &format_timestamp(projection.finalized_at));

    let body_lines = self.page_lines - FOOTER_LINES;
    let pages = paginate(sheet.into_lines(), body_lines);
    let total = pages.len();

    pages
      .into_iter()
      .enumerate()
      .map(|(i, mut lines)| {
        lines.resize(body_lines, String::new());
        lines.push(String::new());
        let footer = format!("Page {} of {total}", i + 1);
        let pad = self.page_width.saturating_sub(footer.len()) / 2;
        lines.push(format!("{}{footer}", " ".repeat(pad)));
        lines.join("\n")
      })
      .collect()
  }
}

impl DocumentRenderer for TextRenderer {
  fn render(&self, projection: &DocumentProjection) -> pact_core::Result<Document> {
    let pages = self.body(projection);
    let page_count = pages.len();
    let text = pages.join(&format!("\n{PAGE_BREAK}"));

    Ok(Document {
      media_type: MEDIA_TYPE,
      file_name:  format!("agreement-{}.txt", projection.agreement_id),
      pages:      page_count,
      body:       Bytes::from(text + "\n"),
    })
  }
}

// ─── Wording ─────────────────────────────────────────────────────────────────

/// Labels that differ between stay and job agreements.
struct Terms {
  title:           &'static str,
  listing_heading: &'static str,
  period:          &'static str,
  host:            &'static str,
  guest:           &'static str,
}

impl Terms {
  fn for_kind(kind: ListingKind) -> Self {
    match kind {
      ListingKind::Stay => Self {
        title:           "STAY AGREEMENT",
        listing_heading: "Accommodation",
        period:          "month",
        host:            "Host",
        guest:           "Guest",
      },
      ListingKind::Job => Self {
        title:           "SEASONAL WORK AGREEMENT",
        listing_heading: "Position",
        period:          "week",
        host:            "Employer",
        guest:           "Worker",
      },
    }
  }

  fn role_label(&self, role: PartyRole) -> &'static str {
    match role {
      PartyRole::Host => self.host,
      PartyRole::Guest => self.guest,
    }
  }
}

fn party(sheet: &mut Sheet, label: &str, p: &PartySummary) {
  sheet.field(label, &format!("{} <{}>", p.name, p.email));
}

fn format_price(price: f64) -> String {
  if price.fract() == 0.0 {
    format!("{price:.0}")
  } else {
    format!("{price:.2}")
  }
}

fn format_date(d: NaiveDate) -> String { d.format("%-d %B %Y").to_string() }

fn format_period(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
  match (start, end) {
    (Some(s), Some(e)) => format!("{} to {}", format_date(s), format_date(e)),
    (Some(s), None) => format!("from {}, open-ended", format_date(s)),
    (None, Some(e)) => format!("until {}", format_date(e)),
    (None, None) => "not fixed".to_owned(),
  }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
  ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
