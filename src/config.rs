use std::path::PathBuf;

use crate::records::EntityKind;

const RAW_LANDING_DIR: &str = "data_staging/raw_landing";
const BRONZE_DIR: &str = "data_staging/bronze";
pub const DEFAULT_DB_PATH: &str = "data_staging/portfolio.sqlite";

/// Where one entity kind's inputs and outputs live.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub kind: EntityKind,
    pub listing_html: PathBuf,
    pub detail_dir: PathBuf,
    pub base_out: PathBuf,
    pub enriched_out: PathBuf,
    pub db_path: Option<PathBuf>,
}

impl PipelineConfig {
    /// Staging layout defaults for `kind`; any field can be overridden afterwards.
    pub fn defaults(kind: EntityKind) -> Self {
        let (listing, pages, list_json, enriched_json) = match kind {
            EntityKind::Company => (
                "companies.html",
                "company_pages",
                "companies_list.json",
                "companies_enriched.json",
            ),
            EntityKind::Person => (
                "people_list_page.html",
                "person_pages",
                "people_list.json",
                "people_enriched.json",
            ),
        };
        PipelineConfig {
            kind,
            listing_html: PathBuf::from(RAW_LANDING_DIR).join(listing),
            detail_dir: PathBuf::from(RAW_LANDING_DIR).join(pages),
            base_out: PathBuf::from(BRONZE_DIR).join(list_json),
            enriched_out: PathBuf::from(BRONZE_DIR).join(enriched_json),
            db_path: None,
        }
    }
}
