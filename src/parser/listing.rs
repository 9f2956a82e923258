use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::Selector;
use tracing::{info, warn};

use super::classify::{classify_card_tags, strip_logo_suffix};
use super::dom::{css, Document, Node};
use crate::error::ExtractError;
use crate::records::{BaseRecord, DerivedTags, EntityKind};

static COMPANY_CARD_SEL: LazyLock<Selector> =
    LazyLock::new(|| css("ul#companies-grid li.company-logo"));
static PERSON_CARD_SEL: LazyLock<Selector> =
    LazyLock::new(|| css("ul#person-grid li.person-card"));
static COMPANY_LINK_SEL: LazyLock<Selector> = LazyLock::new(|| css("a.companies"));
static ANY_LINK_SEL: LazyLock<Selector> = LazyLock::new(|| css("a"));
static IMG_SEL: LazyLock<Selector> = LazyLock::new(|| css("img"));
static PERSON_NAME_SEL: LazyLock<Selector> = LazyLock::new(|| css("h4"));
static PERSON_ROLE_SEL: LazyLock<Selector> = LazyLock::new(|| css("p"));

const SLUG_ATTR: &str = "data-slug";

/// Result of walking one listing page.
#[derive(Debug, Default)]
pub struct ListingOutcome {
    pub records: Vec<BaseRecord>,
    pub cards_found: usize,
    /// Cards dropped because they had no usable slug.
    pub skipped: usize,
    pub status_conflicts: usize,
}

/// Walk every card on a listing page, in document order.
pub fn extract_listing(kind: EntityKind, html: &str) -> Result<ListingOutcome, ExtractError> {
    if html.trim().is_empty() {
        return Err(ExtractError::EmptyDocument { kind });
    }

    let doc = Document::parse(html);
    let card_sel = match kind {
        EntityKind::Company => &*COMPANY_CARD_SEL,
        EntityKind::Person => &*PERSON_CARD_SEL,
    };
    let cards = doc.root().find_all(card_sel);
    if cards.is_empty() {
        warn!("No {} cards found on listing page", kind);
    }

    let mut outcome = ListingOutcome {
        cards_found: cards.len(),
        ..Default::default()
    };
    let mut seen = HashSet::new();

    for (i, card) in cards.into_iter().enumerate() {
        let Some(record) = extract_card(kind, card) else {
            warn!("Skipping {} card #{} with no slug", kind, i + 1);
            outcome.skipped += 1;
            continue;
        };

        if let DerivedTags::Company {
            status,
            status_conflict: true,
            ..
        } = &record.derived_tags
        {
            warn!(
                "Card {} carries both active and exited; keeping {}",
                record.slug,
                status.as_str()
            );
            outcome.status_conflicts += 1;
        }
        if !seen.insert(record.slug.clone()) {
            warn!("Duplicate {} slug on listing page: {}", kind, record.slug);
        }

        outcome.records.push(record);
    }

    info!(
        "Listing: {} {} cards, {} kept, {} skipped",
        outcome.cards_found,
        kind,
        outcome.records.len(),
        outcome.skipped
    );
    Ok(outcome)
}

/// One card to a base record; `None` when the card has no slug.
pub fn extract_card(kind: EntityKind, card: Node<'_>) -> Option<BaseRecord> {
    let link = match kind {
        EntityKind::Company => card.find(&COMPANY_LINK_SEL),
        EntityKind::Person => card.find(&ANY_LINK_SEL),
    };
    let slug = link.and_then(|a| a.non_empty_attr(SLUG_ATTR))?.to_string();

    let img = card.find(&IMG_SEL);
    let thumbnail_url = img.and_then(|i| i.non_empty_attr("src")).map(str::to_string);
    let thumbnail_alt_text = img.and_then(|i| i.non_empty_attr("alt")).map(str::to_string);

    let (display_name, list_title) = match kind {
        EntityKind::Company => (thumbnail_alt_text.as_deref().and_then(strip_logo_suffix), None),
        EntityKind::Person => (
            card.find(&PERSON_NAME_SEL).and_then(|h| h.text_non_empty()),
            card.find(&PERSON_ROLE_SEL).and_then(|p| p.text_non_empty()),
        ),
    };

    let classes = card.classes();
    let derived_tags = classify_card_tags(kind, &classes);

    Some(BaseRecord {
        kind,
        slug,
        display_name,
        list_title,
        detail_url: link.and_then(|a| a.non_empty_attr("href")).map(str::to_string),
        thumbnail_url,
        thumbnail_alt_text,
        raw_tags: classes.into_iter().map(str::to_string).collect(),
        derived_tags,
    })
}
