use rayon::prelude::*;
use tracing::warn;

use super::detail::extract_detail;
use super::dom::normalize_ws;
use crate::records::{BaseRecord, DetailRecord, EnrichedRecord};
use crate::source::DocumentSource;

/// Fold a detail record into its base record.
///
/// Detail values win over listing values where both exist; anything the detail
/// page leaves empty keeps the listing value. A name disagreement is flagged,
/// not hidden.
pub fn merge(base: BaseRecord, detail: Option<DetailRecord>) -> EnrichedRecord {
    let Some(detail) = detail else {
        return EnrichedRecord {
            has_detail: false,
            name: base.display_name.clone(),
            title: base.list_title.clone(),
            name_mismatch: false,
            detail: DetailRecord::default(),
            base,
        };
    };

    let name_mismatch = match (&base.display_name, &detail.detail_display_name) {
        (Some(listed), Some(detailed)) => normalize_ws(listed) != normalize_ws(detailed),
        _ => false,
    };

    EnrichedRecord {
        has_detail: true,
        name: detail
            .detail_display_name
            .clone()
            .or_else(|| base.display_name.clone()),
        title: detail
            .detail_subtitle
            .clone()
            .or_else(|| base.list_title.clone()),
        name_mismatch,
        detail,
        base,
    }
}

/// Look up, extract and merge the detail page for one base record.
pub fn enrich_one<S: DocumentSource + ?Sized>(base: &BaseRecord, source: &S) -> EnrichedRecord {
    let detail = source
        .detail_document(base.kind, &base.slug)
        .map(|html| extract_detail(base.kind, &base.slug, &html));
    if detail.is_none() {
        warn!("No detail document for {} slug={}", base.kind, base.slug);
    }

    let record = merge(base.clone(), detail);
    if record.name_mismatch {
        warn!(
            "Name mismatch for {}: listing {:?}, detail {:?}",
            base.slug, base.display_name, record.detail.detail_display_name
        );
    }
    record
}

#[derive(Debug, Default)]
pub struct EnrichOutcome {
    pub records: Vec<EnrichedRecord>,
    /// Slugs that had no detail document, in batch order.
    pub missing_detail: Vec<String>,
    pub name_mismatches: usize,
}

impl EnrichOutcome {
    pub fn absorb(&mut self, other: EnrichOutcome) {
        self.records.extend(other.records);
        self.missing_detail.extend(other.missing_detail);
        self.name_mismatches += other.name_mismatches;
    }
}

/// Enrich a batch in parallel. Output order and length match `bases`.
pub fn enrich_batch<S: DocumentSource>(bases: &[BaseRecord], source: &S) -> EnrichOutcome {
    let records: Vec<EnrichedRecord> = bases.par_iter().map(|b| enrich_one(b, source)).collect();

    let missing_detail = records
        .iter()
        .filter(|r| !r.has_detail)
        .map(|r| r.slug().to_string())
        .collect();
    let name_mismatches = records.iter().filter(|r| r.name_mismatch).count();

    EnrichOutcome {
        records,
        missing_detail,
        name_mismatches,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};

    use super::*;
    use crate::parser::listing::extract_listing;
    use crate::records::{CompanyStatus, DerivedTags, EntityKind};

    fn base(slug: &str, name: Option<&str>) -> BaseRecord {
        BaseRecord {
            kind: EntityKind::Company,
            slug: slug.into(),
            display_name: name.map(str::to_string),
            list_title: None,
            detail_url: None,
            thumbnail_url: Some(format!("https://cdn.example.vc/{}.png", slug)),
            thumbnail_alt_text: None,
            raw_tags: vec![],
            derived_tags: DerivedTags::Company {
                status: CompanyStatus::Unknown,
                status_conflict: false,
                fund_tags: BTreeSet::new(),
                theme_tags: BTreeSet::new(),
            },
        }
    }

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
    }

    #[test]
    fn absent_detail_keeps_base_verbatim() {
        let b = base("beta", Some("Beta"));
        let rec = merge(b.clone(), None);
        assert!(!rec.has_detail);
        assert!(!rec.name_mismatch);
        assert_eq!(rec.base, b);
        assert_eq!(rec.name.as_deref(), Some("Beta"));
        assert_eq!(rec.detail, DetailRecord::default());
    }

    #[test]
    fn detail_name_wins_and_mismatch_flagged() {
        let detail = DetailRecord {
            detail_display_name: Some("ACME".into()),
            ..Default::default()
        };
        let rec = merge(base("acme", Some("Acme Inc")), Some(detail));
        assert!(rec.has_detail);
        assert_eq!(rec.name.as_deref(), Some("ACME"));
        assert!(rec.name_mismatch);
        assert_eq!(rec.base.display_name.as_deref(), Some("Acme Inc"));
    }

    #[test]
    fn undefined_detail_fields_leave_base_untouched() {
        let mut b = base("jane", Some("Jane Doe"));
        b.kind = EntityKind::Person;
        b.list_title = Some("Partner".into());
        let rec = merge(b, Some(DetailRecord::default()));
        assert!(rec.has_detail);
        assert_eq!(rec.name.as_deref(), Some("Jane Doe"));
        assert_eq!(rec.title.as_deref(), Some("Partner"));
        assert!(!rec.name_mismatch);
    }

    #[test]
    fn same_name_modulo_whitespace_is_not_a_mismatch() {
        let detail = DetailRecord {
            detail_display_name: Some("Acme  Inc".into()),
            ..Default::default()
        };
        assert!(!merge(base("acme", Some("Acme Inc")), Some(detail)).name_mismatch);
    }

    #[test]
    fn batch_size_is_preserved() {
        let bases: Vec<BaseRecord> = (0..25)
            .map(|i| base(&format!("co-{}", i), Some("Co")))
            .collect();
        let mut docs = HashMap::new();
        for i in (0..25).step_by(3) {
            docs.insert(
                format!("co-{}", i),
                r#"<div class="profile"><section class="profile-info"><h1 class="profile-title">Co</h1></section></div>"#
                    .to_string(),
            );
        }
        let out = enrich_batch(&bases, &docs);
        assert_eq!(out.records.len(), bases.len());
        let slugs: Vec<&str> = out.records.iter().map(|r| r.slug()).collect();
        let expected: Vec<&str> = bases.iter().map(|b| b.slug.as_str()).collect();
        assert_eq!(slugs, expected);
        assert_eq!(out.missing_detail.len(), 25 - docs.len());
        assert_eq!(out.name_mismatches, 0);
    }

    #[test]
    fn empty_batch_gives_empty_output() {
        let docs: HashMap<String, String> = HashMap::new();
        let out = enrich_batch(&[], &docs);
        assert!(out.records.is_empty());
        assert!(out.missing_detail.is_empty());
    }

    #[test]
    fn listing_to_enriched_end_to_end() {
        let listing = r#"<ul id="companies-grid">
            <li class="company-logo active"><a class="companies" data-slug="acme" href="/companies/acme"><img src="a.png" alt="Acme Inc logo"></a></li>
            <li class="company-logo exited"><a class="companies" data-slug="beta" href="/companies/beta"><img src="b.png" alt="Beta logo"></a></li>
        </ul>"#;
        let bases = extract_listing(EntityKind::Company, listing).unwrap().records;

        let mut docs = HashMap::new();
        docs.insert("acme".to_string(), fixture("company_acme.html"));

        let out = enrich_batch(&bases, &docs);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.missing_detail, vec!["beta".to_string()]);

        let acme = &out.records[0];
        assert!(acme.has_detail);
        assert_eq!(acme.name.as_deref(), Some("ACME"));
        assert!(acme.name_mismatch);
        assert!(!acme.detail.leadership.is_empty());

        let beta = &out.records[1];
        assert!(!beta.has_detail);
        assert_eq!(beta.detail, DetailRecord::default());
        assert!(beta.detail.description_text.is_none());
        assert!(beta.detail.social_links.is_empty());
        assert!(beta.detail.info_blocks.is_empty());
    }

    #[test]
    fn partial_outcomes_absorb_in_order() {
        let docs: HashMap<String, String> = HashMap::new();
        let bases = vec![base("a", None), base("b", None), base("c", None)];
        let mut total = EnrichOutcome::default();
        for chunk in bases.chunks(2) {
            total.absorb(enrich_batch(chunk, &docs));
        }
        assert_eq!(total.missing_detail, vec!["a", "b", "c"]);
        assert_eq!(total.records.len(), 3);
    }
}
