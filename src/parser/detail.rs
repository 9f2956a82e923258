use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::Selector;
use tracing::debug;

use super::classify::{
    bucket_links, card_marker, parse_leadership, route_label, strip_logo_suffix, LabelRoute,
};
use super::dom::{css, Document, Node};
use crate::records::{DetailRecord, EntityKind, Leader, PortfolioRef, SocialLinks};

static PROFILE_SEL: LazyLock<Selector> = LazyLock::new(|| css("div.profile"));
static INFO_SEL: LazyLock<Selector> = LazyLock::new(|| css("section.profile-info"));
static COMPANY_IMAGE_SEL: LazyLock<Selector> =
    LazyLock::new(|| css("section.profile-image.profile-image--company"));
static PERSON_IMAGE_SEL: LazyLock<Selector> = LazyLock::new(|| css("section.profile-image"));
static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| css("h1.profile-title"));
static TITLE_IMG_SEL: LazyLock<Selector> = LazyLock::new(|| css("h1.profile-title img"));
static SUBTITLE_SEL: LazyLock<Selector> = LazyLock::new(|| css("h2.profile-subtitle"));
static LOCATION_SEL: LazyLock<Selector> = LazyLock::new(|| css("small"));
static WEBSITE_SEL: LazyLock<Selector> = LazyLock::new(|| css("a.profile__link"));
static SOCIAL_SEL: LazyLock<Selector> =
    LazyLock::new(|| css("div.social-list.profile-social-list a"));
static IMG_SEL: LazyLock<Selector> = LazyLock::new(|| css("img"));
static MORE_INFO_SEL: LazyLock<Selector> = LazyLock::new(|| css("div.profile-image__info"));
static MORE_INFO_HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| css("h3.profile-more-info-subtitle"));
static MORE_INFO_BLOCK_SEL: LazyLock<Selector> = LazyLock::new(|| css("div.profile-more-info"));
static PORTFOLIO_SECTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| css("section.companies-grid-wrapper"));
static PORTFOLIO_CARD_SEL: LazyLock<Selector> =
    LazyLock::new(|| css("ul#companies-grid li.company-logo"));
static PORTFOLIO_LINK_SEL: LazyLock<Selector> = LazyLock::new(|| css("a.companies"));

/// Extract everything a profile page offers. Missing elements leave their
/// fields empty; this never fails.
pub fn extract_detail(kind: EntityKind, slug: &str, html: &str) -> DetailRecord {
    let doc = Document::parse(html);
    let root = doc.root();
    let profile = root.find(&PROFILE_SEL).unwrap_or_else(|| {
        debug!("{}: no profile container, searching whole page", slug);
        root
    });

    let info = profile.find(&INFO_SEL);
    let image_section = match kind {
        EntityKind::Company => profile.find(&COMPANY_IMAGE_SEL),
        EntityKind::Person => profile.find(&PERSON_IMAGE_SEL),
    };

    let mut record = DetailRecord {
        detail_display_name: info.and_then(|i| display_name(kind, i)),
        description_text: info.and_then(description),
        social_links: info.map(|i| social_links(kind, i)).unwrap_or_default(),
        hero_or_headshot_url: image_section
            .and_then(|s| s.find(&IMG_SEL))
            .and_then(|img| img.non_empty_attr("src"))
            .map(str::to_string),
        ..Default::default()
    };

    match kind {
        EntityKind::Company => {
            record.website_url = info.and_then(|i| website(slug, i));
        }
        EntityKind::Person => {
            record.detail_subtitle = info
                .and_then(|i| i.find(&SUBTITLE_SEL))
                .and_then(|h| h.text_non_empty());
            record.location = info
                .and_then(|i| i.find(&LOCATION_SEL))
                .and_then(|s| s.text_non_empty());
            record.portfolio_refs = portfolio_refs(root);
        }
    }

    if let Some(container) = image_section.and_then(|s| s.find(&MORE_INFO_SEL)) {
        let (blocks, leadership) = info_blocks(kind, slug, container);
        record.info_blocks = blocks;
        record.leadership = leadership;
    }

    record
}

fn display_name(kind: EntityKind, info: Node<'_>) -> Option<String> {
    if kind == EntityKind::Company {
        let from_logo = info
            .find(&TITLE_IMG_SEL)
            .and_then(|img| img.non_empty_attr("alt"))
            .map(str::to_string);
        if from_logo.is_some() {
            return from_logo;
        }
    }
    info.find(&TITLE_SEL).and_then(|h| h.text_non_empty())
}

/// Direct `<p>` children only, joined by a blank line.
fn description(info: Node<'_>) -> Option<String> {
    let paragraphs: Vec<String> = info
        .children_named("p")
        .iter()
        .map(Node::text)
        .filter(|t| !t.is_empty())
        .collect();
    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n\n"))
    }
}

fn website(slug: &str, info: Node<'_>) -> Option<String> {
    let Some(link) = info.find(&WEBSITE_SEL) else {
        debug!("{}: no website link", slug);
        return None;
    };
    let href = link.non_empty_attr("href");
    if href.is_none() {
        debug!("{}: website link present with empty href", slug);
    }
    href.map(str::to_string)
}

fn social_links(kind: EntityKind, info: Node<'_>) -> SocialLinks {
    let anchors = info.find_all(&SOCIAL_SEL);
    let links = bucket_links(
        kind,
        anchors
            .iter()
            .map(|a| (a.attr("href").unwrap_or(""), a.classes())),
    );
    if links.is_empty() && !anchors.is_empty() {
        debug!("{} social anchors, none with an href", anchors.len());
    }
    links
}

/// Walk labeled blocks in document order. A repeated key keeps the later block.
fn info_blocks(
    kind: EntityKind,
    slug: &str,
    container: Node<'_>,
) -> (BTreeMap<String, Option<String>>, Vec<Leader>) {
    let mut blocks = BTreeMap::new();
    let mut leadership = Vec::new();

    for heading in container.find_all(&MORE_INFO_HEADING_SEL) {
        let label = heading.text();
        let Some(block) = heading.next_sibling_matching(&MORE_INFO_BLOCK_SEL, &MORE_INFO_HEADING_SEL)
        else {
            debug!("{}: heading {:?} has no content block", slug, label);
            continue;
        };

        match route_label(kind, &label) {
            LabelRoute::Leadership => leadership = parse_leadership(&block.text_lines()),
            LabelRoute::Info(key) => {
                blocks.insert(key, block.text_non_empty());
            }
        }
    }

    (blocks, leadership)
}

fn portfolio_refs(root: Node<'_>) -> Vec<PortfolioRef> {
    let Some(section) = root.find(&PORTFOLIO_SECTION_SEL) else {
        return Vec::new();
    };
    let marker = card_marker(EntityKind::Company);

    section
        .find_all(&PORTFOLIO_CARD_SEL)
        .into_iter()
        .map(|card| PortfolioRef {
            slug: card
                .find(&PORTFOLIO_LINK_SEL)
                .and_then(|a| a.non_empty_attr("data-slug"))
                .map(str::to_string),
            name: card
                .find(&IMG_SEL)
                .and_then(|img| img.attr("alt"))
                .and_then(strip_logo_suffix),
            tags: card
                .classes()
                .into_iter()
                .filter(|c| *c != marker)
                .map(str::to_string)
                .collect(),
        })
        .collect()
}
