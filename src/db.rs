use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::warn;

use crate::records::{DerivedTags, EnrichedRecord, EntityKind};

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS entities (
            kind            TEXT NOT NULL CHECK(kind IN ('company','person')),
            slug            TEXT NOT NULL,
            name            TEXT,
            list_name       TEXT,
            title           TEXT,
            detail_url      TEXT,
            thumbnail_url   TEXT,
            thumbnail_alt   TEXT,
            status          TEXT CHECK(status IN ('active','exited','unknown')),
            status_conflict BOOLEAN NOT NULL DEFAULT 0,
            fund_tags       TEXT,
            theme_tags      TEXT,
            card_tags       TEXT,
            raw_tags        TEXT NOT NULL,
            has_detail      BOOLEAN NOT NULL,
            name_mismatch   BOOLEAN NOT NULL DEFAULT 0,
            description     TEXT,
            location        TEXT,
            website_url     TEXT,
            image_url       TEXT,
            twitter         TEXT,
            linkedin        TEXT,
            email           TEXT,
            other_links     TEXT NOT NULL,
            info_blocks     TEXT NOT NULL,
            updated_at      TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (kind, slug)
        );
        CREATE INDEX IF NOT EXISTS idx_entities_status ON entities(status);

        CREATE TABLE IF NOT EXISTS leaders (
            id            INTEGER PRIMARY KEY,
            company_slug  TEXT NOT NULL,
            position      INTEGER NOT NULL,
            name          TEXT NOT NULL,
            role          TEXT,
            UNIQUE(company_slug, position)
        );
        CREATE INDEX IF NOT EXISTS idx_leaders_company ON leaders(company_slug);

        CREATE TABLE IF NOT EXISTS portfolio_refs (
            id            INTEGER PRIMARY KEY,
            person_slug   TEXT NOT NULL,
            position      INTEGER NOT NULL,
            company_slug  TEXT,
            name          TEXT,
            tags          TEXT NOT NULL,
            UNIQUE(person_slug, position)
        );
        CREATE INDEX IF NOT EXISTS idx_portfolio_person ON portfolio_refs(person_slug);
        CREATE INDEX IF NOT EXISTS idx_portfolio_company ON portfolio_refs(company_slug);
        ",
    )?;
    Ok(())
}

/// Upsert a batch of enriched records. Nested rows are replaced per entity.
/// Returns the number of distinct entities written; a later record with an
/// already-written `(kind, slug)` replaces the earlier one and is logged.
pub fn save_enriched(conn: &Connection, records: &[EnrichedRecord]) -> Result<usize> {
    let mut written: HashSet<(EntityKind, &str)> = HashSet::new();
    let tx = conn.unchecked_transaction()?;
    {
        let mut e_stmt = tx.prepare(
            "INSERT OR REPLACE INTO entities
             (kind, slug, name, list_name, title, detail_url, thumbnail_url, thumbnail_alt,
              status, status_conflict, fund_tags, theme_tags, card_tags, raw_tags,
              has_detail, name_mismatch, description, location, website_url, image_url,
              twitter, linkedin, email, other_links, info_blocks)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,
                     ?21,?22,?23,?24,?25)",
        )?;
        let mut clear_leaders = tx.prepare("DELETE FROM leaders WHERE company_slug = ?1")?;
        let mut l_stmt = tx.prepare(
            "INSERT INTO leaders (company_slug, position, name, role) VALUES (?1, ?2, ?3, ?4)",
        )?;
        let mut clear_refs = tx.prepare("DELETE FROM portfolio_refs WHERE person_slug = ?1")?;
        let mut p_stmt = tx.prepare(
            "INSERT INTO portfolio_refs (person_slug, position, company_slug, name, tags)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;

        for r in records {
            let b = &r.base;
            let d = &r.detail;
            if !written.insert((b.kind, b.slug.as_str())) {
                warn!("{} {}: duplicate slug in batch, replacing the earlier record", b.kind, b.slug);
            }
            let (status, status_conflict, fund_tags, theme_tags, card_tags) = match &b.derived_tags {
                DerivedTags::Company {
                    status,
                    status_conflict,
                    fund_tags,
                    theme_tags,
                } => (
                    Some(status.as_str()),
                    *status_conflict,
                    Some(serde_json::to_string(fund_tags)?),
                    Some(serde_json::to_string(theme_tags)?),
                    None,
                ),
                DerivedTags::Person { card_tags } => {
                    (None, false, None, None, Some(serde_json::to_string(card_tags)?))
                }
            };

            e_stmt.execute(rusqlite::params![
                b.kind.as_str(),
                b.slug,
                r.name,
                b.display_name,
                r.title,
                b.detail_url,
                b.thumbnail_url,
                b.thumbnail_alt_text,
                status,
                status_conflict,
                fund_tags,
                theme_tags,
                card_tags,
                serde_json::to_string(&b.raw_tags)?,
                r.has_detail,
                r.name_mismatch,
                d.description_text,
                d.location,
                d.website_url,
                d.hero_or_headshot_url,
                d.social_links.twitter,
                d.social_links.linkedin,
                d.social_links.email,
                serde_json::to_string(&d.social_links.other)?,
                serde_json::to_string(&d.info_blocks)?,
            ])?;

            match b.kind {
                EntityKind::Company => {
                    clear_leaders.execute([&b.slug])?;
                    for (i, leader) in d.leadership.iter().enumerate() {
                        l_stmt.execute(rusqlite::params![b.slug, i as i64, leader.name, leader.role])?;
                    }
                }
                EntityKind::Person => {
                    clear_refs.execute([&b.slug])?;
                    for (i, p) in d.portfolio_refs.iter().enumerate() {
                        p_stmt.execute(rusqlite::params![
                            b.slug,
                            i as i64,
                            p.slug,
                            p.name,
                            serde_json::to_string(&p.tags)?,
                        ])?;
                    }
                }
            }
        }
    }
    tx.commit()?;
    Ok(written.len())
}

// ── Stats ──

pub struct KindStats {
    pub kind: String,
    pub total: usize,
    pub with_detail: usize,
    pub missing_detail: usize,
    pub name_mismatches: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Vec<KindStats>> {
    let mut stmt = conn.prepare(
        "SELECT kind, COUNT(*), SUM(has_detail), SUM(name_mismatch)
         FROM entities GROUP BY kind ORDER BY kind",
    )?;
    let rows = stmt
        .query_map([], |row| {
            let total: usize = row.get(1)?;
            let with_detail: usize = row.get(2)?;
            Ok(KindStats {
                kind: row.get(0)?,
                total,
                with_detail,
                missing_detail: total - with_detail,
                name_mismatches: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_leaders(conn: &Connection) -> Result<usize> {
    Ok(conn.query_row("SELECT COUNT(*) FROM leaders", [], |r| r.get(0))?)
}

pub fn count_portfolio_refs(conn: &Connection) -> Result<usize> {
    Ok(conn.query_row("SELECT COUNT(*) FROM portfolio_refs", [], |r| r.get(0))?)
}
