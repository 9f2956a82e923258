//! Pure bucketing rules for class tokens, links, labels and free-text lines.
//!
//! Each classifier is an ordered rule table evaluated top to bottom; the first
//! matching rule decides.

use std::collections::BTreeSet;

use super::dom::normalize_ws;
use crate::records::{CompanyStatus, DerivedTags, EntityKind, Leader, SocialLinks};

pub const COMPANY_CARD_MARKER: &str = "company-logo";
pub const PERSON_CARD_MARKER: &str = "person-card";
const FUND_SUFFIX: &str = "-fund";
const LOGO_SUFFIX: &str = " logo";

pub fn card_marker(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Company => COMPANY_CARD_MARKER,
        EntityKind::Person => PERSON_CARD_MARKER,
    }
}

// ── Card tags ──

const STATUS_TAGS: &[(&str, CompanyStatus)] = &[
    ("active", CompanyStatus::Active),
    ("exited", CompanyStatus::Exited),
];

pub fn classify_card_tags(kind: EntityKind, classes: &[&str]) -> DerivedTags {
    let marker = card_marker(kind);
    match kind {
        EntityKind::Company => {
            let mut status = CompanyStatus::Unknown;
            let mut status_conflict = false;
            let mut fund_tags = BTreeSet::new();
            let mut theme_tags = BTreeSet::new();

            for &c in classes {
                if c == marker {
                    continue;
                }
                if let Some(&(_, s)) = STATUS_TAGS.iter().find(|(tag, _)| *tag == c) {
                    if status != CompanyStatus::Unknown && status != s {
                        status_conflict = true;
                    }
                    status = s;
                } else if c.ends_with(FUND_SUFFIX) {
                    fund_tags.insert(c.to_string());
                } else {
                    theme_tags.insert(c.to_string());
                }
            }

            DerivedTags::Company {
                status,
                status_conflict,
                fund_tags,
                theme_tags,
            }
        }
        EntityKind::Person => DerivedTags::Person {
            card_tags: classes
                .iter()
                .filter(|c| **c != marker)
                .map(|c| c.to_string())
                .collect(),
        },
    }
}

// ── Links ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkClass {
    Twitter,
    Linkedin,
    Email,
    Other,
}

#[derive(Debug, Clone, Copy)]
enum Matcher {
    Class(&'static str),
    /// Case-insensitive substring of the href.
    Domain(&'static str),
    /// Substring of the href that starts the string or follows `.`, `/` or `@`.
    /// For short domains that occur inside unrelated ones (`dropbox.com`).
    BoundedDomain(&'static str),
    SchemePrefix(&'static str),
}

struct LinkRule {
    matcher: Matcher,
    class: LinkClass,
}

// Class markers come first so they win over whatever the href says.
const LINK_RULES: &[LinkRule] = &[
    LinkRule { matcher: Matcher::Class("social-icon__twitter"), class: LinkClass::Twitter },
    LinkRule { matcher: Matcher::Class("social-icon__linkedin"), class: LinkClass::Linkedin },
    LinkRule { matcher: Matcher::Class("social-icon__email"), class: LinkClass::Email },
    LinkRule { matcher: Matcher::Domain("twitter.com"), class: LinkClass::Twitter },
    LinkRule { matcher: Matcher::BoundedDomain("x.com"), class: LinkClass::Twitter },
    LinkRule { matcher: Matcher::Domain("linkedin.com"), class: LinkClass::Linkedin },
    LinkRule { matcher: Matcher::SchemePrefix("mailto:"), class: LinkClass::Email },
];

impl Matcher {
    fn matches(self, href_lower: &str, classes: &[&str]) -> bool {
        match self {
            Matcher::Class(marker) => classes.contains(&marker),
            Matcher::Domain(domain) => href_lower.contains(domain),
            Matcher::BoundedDomain(domain) => href_lower.match_indices(domain).any(|(i, _)| {
                href_lower[..i]
                    .chars()
                    .next_back()
                    .map_or(true, |c| matches!(c, '.' | '/' | '@'))
            }),
            Matcher::SchemePrefix(prefix) => href_lower.starts_with(prefix),
        }
    }
}

/// Classify one anchor. `None` means the href is empty and the link is dropped.
/// Email rules only apply to people; a company `mailto:` link is `Other`.
pub fn classify_link(kind: EntityKind, href: &str, classes: &[&str]) -> Option<LinkClass> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let href_lower = href.to_lowercase();
    let class = LINK_RULES
        .iter()
        .filter(|r| r.class != LinkClass::Email || kind == EntityKind::Person)
        .find(|r| r.matcher.matches(&href_lower, classes))
        .map(|r| r.class)
        .unwrap_or(LinkClass::Other);
    Some(class)
}

/// Bucket `(href, classes)` pairs into social links. A later anchor of the
/// same recognized kind replaces an earlier one.
pub fn bucket_links<'a, I>(kind: EntityKind, anchors: I) -> SocialLinks
where
    I: IntoIterator<Item = (&'a str, Vec<&'a str>)>,
{
    let mut links = SocialLinks::default();
    for (href, classes) in anchors {
        let Some(class) = classify_link(kind, href, &classes) else {
            continue;
        };
        let href = href.trim().to_string();
        match class {
            LinkClass::Twitter => links.twitter = Some(href),
            LinkClass::Linkedin => links.linkedin = Some(href),
            LinkClass::Email => links.email = Some(href),
            LinkClass::Other => links.other.push(href),
        }
    }
    links
}

// ── Labels ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelRoute {
    Leadership,
    Info(String),
}

/// `"Acquired By"` → `"acquired_by"`. `"Status"` becomes `"status_detail"` so it
/// never shadows the listing-level status.
pub fn normalize_label(label: &str) -> String {
    let key = normalize_ws(label).to_lowercase().replace(' ', "_");
    if key == "status" {
        "status_detail".to_string()
    } else {
        key
    }
}

pub fn route_label(kind: EntityKind, label: &str) -> LabelRoute {
    let is_leadership = normalize_ws(label).to_lowercase().starts_with("leadership");
    if is_leadership && kind == EntityKind::Company {
        LabelRoute::Leadership
    } else {
        LabelRoute::Info(normalize_label(label))
    }
}

// ── Leadership ──

/// `"Jane Doe, VP, Ops"` → name `"Jane Doe"`, role `"VP, Ops"`.
/// A line with nothing before the first comma names nobody and yields `None`.
pub fn parse_leader(line: &str) -> Option<Leader> {
    let line = normalize_ws(line);
    let leader = match line.split_once(',') {
        Some((name, role)) => Leader {
            name: name.trim().to_string(),
            role: Some(role.trim().to_string()).filter(|r| !r.is_empty()),
        },
        None => Leader { name: line, role: None },
    };
    Some(leader).filter(|l| !l.name.is_empty())
}

pub fn parse_leadership<S: AsRef<str>>(lines: &[S]) -> Vec<Leader> {
    lines.iter().filter_map(|l| parse_leader(l.as_ref())).collect()
}

// ── Names ──

/// Drop a trailing `" logo"` (any case) from image alt text.
pub fn strip_logo_suffix(alt: &str) -> Option<String> {
    let alt = alt.trim();
    let name = match alt.len().checked_sub(LOGO_SUFFIX.len()) {
        Some(cut)
            if alt.is_char_boundary(cut) && alt[cut..].eq_ignore_ascii_case(LOGO_SUFFIX) =>
        {
            alt[..cut].trim()
        }
        _ => alt,
    };
    Some(name.to_string()).filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company_tags(classes: &[&str]) -> (CompanyStatus, bool, Vec<String>, Vec<String>) {
        match classify_card_tags(EntityKind::Company, classes) {
            DerivedTags::Company {
                status,
                status_conflict,
                fund_tags,
                theme_tags,
            } => (
                status,
                status_conflict,
                fund_tags.into_iter().collect(),
                theme_tags.into_iter().collect(),
            ),
            other => panic!("expected company tags, got {:?}", other),
        }
    }

    #[test]
    fn company_tags_bucketed() {
        let (status, conflict, funds, themes) =
            company_tags(&["company-logo", "active", "growth-fund", "fintech", "seed-fund"]);
        assert_eq!(status, CompanyStatus::Active);
        assert!(!conflict);
        assert_eq!(funds, vec!["growth-fund", "seed-fund"]);
        assert_eq!(themes, vec!["fintech"]);
    }

    #[test]
    fn company_without_status_is_unknown() {
        let (status, conflict, _, themes) = company_tags(&["company-logo", "security"]);
        assert_eq!(status, CompanyStatus::Unknown);
        assert!(!conflict);
        assert_eq!(themes, vec!["security"]);
    }

    #[test]
    fn conflicting_status_later_wins_and_is_flagged() {
        let (status, conflict, _, _) = company_tags(&["active", "company-logo", "exited"]);
        assert_eq!(status, CompanyStatus::Exited);
        assert!(conflict);

        let (status, conflict, _, _) = company_tags(&["active", "active"]);
        assert_eq!(status, CompanyStatus::Active);
        assert!(!conflict);
    }

    #[test]
    fn person_tags_pass_through() {
        let tags = classify_card_tags(EntityKind::Person, &["person-card", "investing", "active"]);
        match tags {
            DerivedTags::Person { card_tags } => {
                assert_eq!(card_tags.into_iter().collect::<Vec<_>>(), vec!["active", "investing"]);
            }
            other => panic!("expected person tags, got {:?}", other),
        }
    }

    #[test]
    fn links_by_domain() {
        let p = EntityKind::Person;
        assert_eq!(classify_link(p, "https://twitter.com/acme", &[]), Some(LinkClass::Twitter));
        assert_eq!(classify_link(p, "https://X.com/acme", &[]), Some(LinkClass::Twitter));
        assert_eq!(
            classify_link(p, "https://www.linkedin.com/in/jane", &[]),
            Some(LinkClass::Linkedin)
        );
        assert_eq!(classify_link(p, "MAILTO:jane@acme.com", &[]), Some(LinkClass::Email));
        assert_eq!(classify_link(p, "https://acme.com", &[]), Some(LinkClass::Other));
    }

    #[test]
    fn domains_match_anywhere_in_href() {
        let p = EntityKind::Person;
        assert_eq!(
            classify_link(p, "https://mobile.twitter.com/acme", &[]),
            Some(LinkClass::Twitter)
        );
        assert_eq!(
            classify_link(p, "https://nitter.net/redirect?to=twitter.com/acme", &[]),
            Some(LinkClass::Twitter)
        );
        assert_eq!(classify_link(p, "https://fxtwitter.com/acme", &[]), Some(LinkClass::Twitter));
        assert_eq!(
            classify_link(p, "https://linkedin.com.au/in/jane", &[]),
            Some(LinkClass::Linkedin)
        );
        assert_eq!(classify_link(p, "x.com/acme", &[]), Some(LinkClass::Twitter));
        assert_eq!(
            classify_link(p, "https://t.co/r?u=https://x.com/acme", &[]),
            Some(LinkClass::Twitter)
        );
    }

    #[test]
    fn short_domain_needs_a_boundary() {
        let p = EntityKind::Person;
        assert_eq!(classify_link(p, "https://dropbox.com/s/1", &[]), Some(LinkClass::Other));
        assert_eq!(classify_link(p, "https://box.com/acme", &[]), Some(LinkClass::Other));
    }

    #[test]
    fn class_marker_beats_href() {
        let p = EntityKind::Person;
        assert_eq!(
            classify_link(p, "https://twitter.com/acme", &["social-icon__linkedin"]),
            Some(LinkClass::Linkedin)
        );
        assert_eq!(
            classify_link(p, "https://acme.com/contact", &["social-icon__email"]),
            Some(LinkClass::Email)
        );
    }

    #[test]
    fn email_only_recognized_for_people() {
        assert_eq!(
            classify_link(EntityKind::Company, "mailto:hi@acme.com", &["social-icon__email"]),
            Some(LinkClass::Other)
        );
    }

    #[test]
    fn empty_href_dropped() {
        assert_eq!(classify_link(EntityKind::Person, "   ", &["social-icon__twitter"]), None);
        let links = bucket_links(
            EntityKind::Person,
            vec![("", vec![]), ("https://acme.com", vec![]), ("  ", vec!["x"])],
        );
        assert_eq!(links.other, vec!["https://acme.com"]);
        assert!(links.twitter.is_none());
    }

    #[test]
    fn each_link_lands_in_one_bucket() {
        let anchors = vec![
            ("https://twitter.com/a", vec![]),
            ("https://linkedin.com/company/a", vec![]),
            ("mailto:a@a.com", vec![]),
            ("https://a.com", vec![]),
            ("https://medium.com/a", vec![]),
        ];
        let links = bucket_links(EntityKind::Person, anchors);
        assert_eq!(links.twitter.as_deref(), Some("https://twitter.com/a"));
        assert_eq!(links.linkedin.as_deref(), Some("https://linkedin.com/company/a"));
        assert_eq!(links.email.as_deref(), Some("mailto:a@a.com"));
        assert_eq!(links.other, vec!["https://a.com", "https://medium.com/a"]);
    }

    #[test]
    fn labels_normalized() {
        assert_eq!(normalize_label("Status"), "status_detail");
        assert_eq!(normalize_label("Acquired By"), "acquired_by");
        assert_eq!(normalize_label("  Region \n Served "), "region_served");
        assert_eq!(normalize_label("Acquired By"), normalize_label("Acquired By"));
    }

    #[test]
    fn leadership_label_diverted_for_companies() {
        assert_eq!(route_label(EntityKind::Company, "Leadership"), LabelRoute::Leadership);
        assert_eq!(route_label(EntityKind::Company, "LEADERSHIP TEAM"), LabelRoute::Leadership);
        assert_eq!(
            route_label(EntityKind::Company, "Region"),
            LabelRoute::Info("region".into())
        );
        assert_eq!(
            route_label(EntityKind::Person, "Leadership"),
            LabelRoute::Info("leadership".into())
        );
    }

    #[test]
    fn leader_split_on_first_comma() {
        assert_eq!(
            parse_leader("Jeff Shiner, CEO"),
            Some(Leader { name: "Jeff Shiner".into(), role: Some("CEO".into()) })
        );
        assert_eq!(
            parse_leader("Jane Doe, VP, Ops"),
            Some(Leader { name: "Jane Doe".into(), role: Some("VP, Ops".into()) })
        );
        assert_eq!(
            parse_leader("Solo Founder"),
            Some(Leader { name: "Solo Founder".into(), role: None })
        );
        assert_eq!(parse_leader("   "), None);
        assert_eq!(parse_leader(", CEO"), None);
    }

    #[test]
    fn leadership_keeps_order() {
        let leaders = parse_leadership(&["B, CTO", "", "A, CEO"]);
        let names: Vec<&str> = leaders.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn logo_suffix_stripped() {
        assert_eq!(strip_logo_suffix("1Password logo").as_deref(), Some("1Password"));
        assert_eq!(strip_logo_suffix("Acme Logo").as_deref(), Some("Acme"));
        assert_eq!(strip_logo_suffix("Acme").as_deref(), Some("Acme"));
        assert_eq!(strip_logo_suffix("Catalogo").as_deref(), Some("Catalogo"));
        assert_eq!(strip_logo_suffix("  "), None);
    }
}
