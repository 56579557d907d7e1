//! Name-Based Auto-Mapping
//!
//! Best-effort pass over an aggregator's unmapped item mappings: match the
//! external name against the store menu case-insensitively, preferring an
//! exact name match over substring containment. Only mapping rows are
//! patched, lines already copied into orders are never touched.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use super::EngineResult;
use crate::db::models::MenuItem;
use crate::db::repository::{RepoError, aggregator, item_mapping, menu_item};

#[derive(Debug, Clone, Serialize)]
pub struct AutoMapResult {
    pub mapped_count: usize,
    pub total_unmapped: usize,
}

pub async fn auto_map_by_name(pool: &SqlitePool, aggregator_id: i64) -> EngineResult<AutoMapResult> {
    let agg = aggregator::find_by_id(pool, aggregator_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("aggregator {aggregator_id}")))?;

    let unmapped = item_mapping::find_unmapped(pool, aggregator_id).await?;
    let menu = menu_item::find_all(pool, agg.store_id).await?;

    let mut mapped_count = 0usize;
    let total_unmapped = unmapped.len();
    for mapping in &unmapped {
        if let Some(item) = best_match(&mapping.external_item_name, &menu) {
            item_mapping::set_pos_item(pool, mapping.id, item.id).await?;
            mapped_count += 1;
        }
    }

    info!(
        aggregator_id,
        mapped_count, total_unmapped, "auto-map by name finished"
    );
    Ok(AutoMapResult {
        mapped_count,
        total_unmapped,
    })
}

/// Exact case-insensitive equality wins; otherwise the first item whose
/// name contains, or is contained in, the external name.
fn best_match<'a>(external_name: &str, menu: &'a [MenuItem]) -> Option<&'a MenuItem> {
    let needle = external_name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some(exact) = menu.iter().find(|m| m.name.to_lowercase() == needle) {
        return Some(exact);
    }
    menu.iter().find(|m| {
        let name = m.name.to_lowercase();
        name.contains(&needle) || needle.contains(&name)
    })
}
