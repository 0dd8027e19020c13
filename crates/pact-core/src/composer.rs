//! Clause composer: the default preamble and clause list for a new agreement.
//!
//! Pure template fill. The same listing and party names always produce the
//! same text.

use serde::Serialize;

use crate::{
  Error, Result,
  agreement::Clause,
  directory::{Listing, ListingKind},
};

/// The generated opening text and ordered clauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Composition {
  pub preamble: String,
  pub clauses:  Vec<Clause>,
}

/// Display names of the two parties, as they should appear in the text.
#[derive(Debug, Clone, Copy)]
pub struct PartyNames<'a> {
  pub host:  &'a str,
  pub guest: &'a str,
}

/// Compose the default agreement text for `listing`.
pub fn compose(listing: &Listing, parties: PartyNames<'_>) -> Result<Composition> {
  if parties.host.trim().is_empty() || parties.guest.trim().is_empty() {
    return Err(Error::Validation("party names must not be empty".into()));
  }
  if !listing.price.is_finite() || listing.price < 0.0 {
    return Err(Error::Validation(format!(
      "listing price must be a non-negative amount, got {}",
      listing.price
    )));
  }

  let (preamble, sections) = match listing.kind {
    ListingKind::Stay => stay_text(listing, parties),
    ListingKind::Job => job_text(listing, parties),
  };

  let clauses = sections
    .into_iter()
    .zip(1u32..)
    .map(|((title, content), order)| Clause {
      title: title.to_owned(),
      content,
      order,
    })
    .collect();

  Ok(Composition { preamble, clauses })
}

fn format_price(price: f64) -> String {
  if price.fract() == 0.0 {
    format!("{price:.0}")
  } else {
    format!("{price:.2}")
  }
}

fn description_note(listing: &Listing) -> String {
  let description = listing.description.trim();
  if description.is_empty() {
    String::new()
  } else {
    format!(" The listing describes it as follows: {description}")
  }
}

type Sections = Vec<(&'static str, String)>;

fn shared_closing(sections: &mut Sections, listing: &Listing, a: &str, b: &str) {
  sections.push((
    "Cross-Cultural Considerations",
    format!(
      "The {a} and the {b} acknowledge that they may come from different \
       countries, languages and customs. Both agree to communicate openly, to \
       ask when an expectation is unclear, and to treat differences in habits, \
       diet, religion and working style with patience and respect."
    ),
  ));
  sections.push((
    "Termination",
    format!(
      "Either party may end this Agreement early by giving the other at least \
       seven (7) days' written notice through the platform. Serious breaches, \
       including unsafe conduct or failure to pay, allow immediate termination. \
       Amounts already paid for the period after termination will be refunded \
       pro rata, unless the {a} and the {b} agree otherwise in writing."
    ),
  ));
  sections.push((
    "Dispute Resolution",
    "The parties will first try to resolve any disagreement directly and in \
     good faith. If that fails within fourteen (14) days, either party may \
     flag this Agreement as disputed on the platform so that the matter can \
     be mediated before any formal proceedings are started."
      .to_owned(),
  ));
  sections.push((
    "Governing Law",
    format!(
      "This Agreement is governed by the laws applicable in {}. It is a \
       template provided for convenience and does not replace independent \
       legal advice. Where a term conflicts with mandatory local law, the \
       local law prevails and the remaining terms stay in effect.",
      listing.location.trim()
    ),
  ));
}

fn stay_text(listing: &Listing, parties: PartyNames<'_>) -> (String, Sections) {
  let price = format_price(listing.price);
  let location = listing.location.trim();
  let preamble = format!(
    "This Stay Agreement (the \"Agreement\") is made between {host} (the \
     \"Host\") and {guest} (the \"Guest\") for accommodation at \"{title}\" in \
     {location}. Both parties enter into it voluntarily and in good faith, and \
     confirm that they have read and understood every clause below.",
    host = parties.host.trim(),
    guest = parties.guest.trim(),
    title = listing.title.trim(),
  );

  let mut sections: Sections = vec![
    (
      "Duration, Location and Rate",
      format!(
        "The Host provides the Guest with accommodation at \"{}\" in \
         {location} for the dates recorded in this Agreement, at a rate of \
         {price} per month.{}",
        listing.title.trim(),
        description_note(listing)
      ),
    ),
    (
      "Payment Terms",
      format!(
        "The Guest pays {price} per month in advance, no later than the first \
         day of each period of stay. Payments are made through the platform or \
         another method both parties confirm in writing. Any security deposit \
         is returned within fourteen (14) days after departure, less the cost \
         of documented damage."
      ),
    ),
    (
      "House Rules and Responsibilities",
      "The Guest keeps the accommodation clean and tidy, respects quiet hours \
       and neighbours, and reports any damage or maintenance need promptly. \
       The Host keeps the accommodation safe and habitable and gives \
       reasonable notice before entering the Guest's private space."
        .to_owned(),
    ),
    (
      "Utilities and Inclusions",
      "Unless stated otherwise in the listing, the rate includes water, \
       electricity, heating and internet access. Furnishings, linen and \
       kitchen equipment present at arrival remain the Host's property and \
       are to be left in the same condition, apart from normal wear."
        .to_owned(),
    ),
  ];
  shared_closing(&mut sections, listing, "Host", "Guest");
  (preamble, sections)
}

fn job_text(listing: &Listing, parties: PartyNames<'_>) -> (String, Sections) {
  let price = format_price(listing.price);
  let location = listing.location.trim();
  let preamble = format!(
    "This Seasonal Work Agreement (the \"Agreement\") is made between {host} \
     (the \"Employer\") and {guest} (the \"Worker\") for the position \
     \"{title}\" in {location}. Both parties enter into it voluntarily and in \
     good faith, and confirm that they have read and understood every clause \
     below.",
    host = parties.host.trim(),
    guest = parties.guest.trim(),
    title = listing.title.trim(),
  );

  let mut sections: Sections = vec![
    (
      "Position, Location and Rate",
      format!(
        "The Employer engages the Worker for the position \"{}\" in \
         {location} for the dates recorded in this Agreement, at a rate of \
         {price} per week.{}",
        listing.title.trim(),
        description_note(listing)
      ),
    ),
    (
      "Payment Terms",
      format!(
        "The Employer pays the Worker {price} per week, no later than seven \
         (7) days after the end of each working week, by bank transfer or \
         another method both parties confirm in writing. Deductions are only \
         permitted where required by law or agreed in writing beforehand."
      ),
    ),
    (
      "Duties and Responsibilities",
      "The Worker carries out the duties described in the listing with due \
       care and follows reasonable instructions. The Employer explains the \
       tasks clearly, provides the tools and training the work requires, and \
       does not assign duties outside the agreed scope without consent."
        .to_owned(),
    ),
    (
      "Compensation and Working Hours",
      "Working hours, rest days and any accommodation or meals provided as \
       part of the compensation are as described in the listing. Overtime is \
       only worked by mutual agreement and is compensated at the rate both \
       parties confirm in writing."
        .to_owned(),
    ),
    (
      "Workplace Safety",
      "The Employer provides a safe workplace, any necessary protective \
       equipment, and information about emergency procedures. The Worker \
       follows safety instructions and reports accidents, injuries and \
       hazards immediately."
        .to_owned(),
    ),
  ];
  shared_closing(&mut sections, listing, "Employer", "Worker");
  (preamble, sections)
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  fn listing(kind: ListingKind) -> Listing {
    Listing {
      id: Uuid::from_u128(7),
      kind,
      title: "Cabin near the lake".into(),
      location: "Queenstown, Otago".into(),
      price: 650.0,
      description: "Two rooms, shared kitchen.".into(),
      user_id: Uuid::from_u128(1),
    }
  }

  const NAMES: PartyNames<'static> = PartyNames { host: "Aroha", guest: "Lukas" };

  #[test]
  fn stay_covers_all_required_sections() {
    let c = compose(&listing(ListingKind::Stay), NAMES).unwrap();
    let titles: Vec<&str> = c.clauses.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, [
      "Duration, Location and Rate",
      "Payment Terms",
      "House Rules and Responsibilities",
      "Utilities and Inclusions",
      "Cross-Cultural Considerations",
      "Termination",
      "Dispute Resolution",
      "Governing Law",
    ]);
    assert!(c.preamble.contains("Aroha"));
    assert!(c.preamble.contains("Lukas"));
    assert!(c.clauses[0].content.contains("650 per month"));
  }

  #[test]
  fn job_covers_duties_compensation_and_safety() {
    let c = compose(&listing(ListingKind::Job), NAMES).unwrap();
    let titles: Vec<&str> = c.clauses.iter().map(|c| c.title.as_str()).collect();
    assert!(titles.contains(&"Duties and Responsibilities"));
    assert!(titles.contains(&"Compensation and Working Hours"));
    assert!(titles.contains(&"Workplace Safety"));
    assert!(!titles.contains(&"Utilities and Inclusions"));
    assert_eq!(titles.last(), Some(&"Governing Law"));
  }

  #[test]
  fn orders_are_unique_and_sequential() {
    let c = compose(&listing(ListingKind::Job), NAMES).unwrap();
    let orders: Vec<u32> = c.clauses.iter().map(|c| c.order).collect();
    assert_eq!(orders, (1..=c.clauses.len() as u32).collect::<Vec<_>>());
  }

  #[test]
  fn composition_is_deterministic() {
    let l = listing(ListingKind::Stay);
    assert_eq!(compose(&l, NAMES).unwrap(), compose(&l, NAMES).unwrap());
  }

  #[test]
  fn fractional_prices_keep_cents() {
    let mut l = listing(ListingKind::Job);
    l.price = 412.5;
    let c = compose(&l, NAMES).unwrap();
    assert!(c.clauses[0].content.contains("412.50 per week"));
  }

  #[test]
  fn rejects_empty_party_name() {
    let err = compose(&listing(ListingKind::Stay), PartyNames {
      host:  " ",
      guest: "Lukas",
    })
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }
}
