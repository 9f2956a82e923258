use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Company,
    Person,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Company => "company",
            EntityKind::Person => "person",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyStatus {
    Active,
    Exited,
    Unknown,
}

impl CompanyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CompanyStatus::Active => "active",
            CompanyStatus::Exited => "exited",
            CompanyStatus::Unknown => "unknown",
        }
    }
}

/// Classifier output for a listing card's class tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DerivedTags {
    Company {
        status: CompanyStatus,
        /// Card carried both `active` and `exited`; `status` holds the later one.
        status_conflict: bool,
        fund_tags: BTreeSet<String>,
        theme_tags: BTreeSet<String>,
    },
    Person {
        card_tags: BTreeSet<String>,
    },
}

/// One listing card, as found on the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseRecord {
    pub kind: EntityKind,
    pub slug: String,
    pub display_name: Option<String>,
    /// Role line shown on a person card. Always `None` for companies.
    #[serde(default)]
    pub list_title: Option<String>,
    pub detail_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub thumbnail_alt_text: Option<String>,
    pub raw_tags: Vec<String>,
    pub derived_tags: DerivedTags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub email: Option<String>,
    pub other: Vec<String>,
}

impl SocialLinks {
    pub fn is_empty(&self) -> bool {
        self.twitter.is_none()
            && self.linkedin.is_none()
            && self.email.is_none()
            && self.other.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
    pub name: String,
    pub role: Option<String>,
}

/// A company a person is affiliated with, from the person's profile grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioRef {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub tags: BTreeSet<String>,
}

/// Fields pulled from one entity's profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub detail_display_name: Option<String>,
    pub detail_subtitle: Option<String>,
    pub description_text: Option<String>,
    pub location: Option<String>,
    pub website_url: Option<String>,
    pub hero_or_headshot_url: Option<String>,
    pub social_links: SocialLinks,
    pub info_blocks: BTreeMap<String, Option<String>>,
    pub leadership: Vec<Leader>,
    pub portfolio_refs: Vec<PortfolioRef>,
}

/// A base record folded together with its detail record, if one was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub base: BaseRecord,
    pub has_detail: bool,
    /// Detail name when present, else the listing name.
    pub name: Option<String>,
    /// Detail subtitle when present, else the listing title.
    pub title: Option<String>,
    pub name_mismatch: bool,
    #[serde(flatten)]
    pub detail: DetailRecord,
}

impl EnrichedRecord {
    pub fn slug(&self) -> &str {
        &self.base.slug
    }
}
