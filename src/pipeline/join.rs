//! Inner join of indicator tables and metadata enrichment.

use polars::prelude::*;
use tracing::debug;

use super::{has_column, sort_rows, JoinedTable, LongTable, CATEGORY, ENTITY_ID, ENTITY_NAME, YEAR};
use crate::error::{DashError, DashResult};
use crate::storage::MetadataTable;

/// Natural inner join on `(entity_id, year)`, plus `category` when both sides carry it.
/// Only keys present in every table survive. The left-most table supplies `entity_name`.
pub fn inner_join(tables: &[LongTable]) -> DashResult<JoinedTable> {
    let Some((first, rest)) = tables.split_first() else {
        return Err(DashError::InvalidPage("a page needs at least one indicator".into()));
    };
    let mut indicators = vec![first.indicator().to_string()];
    let mut frame = first.frame().clone();
    for table in rest {
        if indicators.iter().any(|i| i == table.indicator()) {
            return Err(DashError::InvalidPage(format!("indicator '{}' is declared twice", table.indicator())));
        }
        let mut keys = vec![ENTITY_ID, YEAR];
        if has_column(&frame, CATEGORY) && table.has_category() {
            keys.push(CATEGORY);
        }
        let right = table.frame().drop(ENTITY_NAME)?;
        let before = frame.height();
        frame = frame.join(&right, keys.clone(), keys.clone(), JoinType::Inner.into(), None)?;
        debug!(
            target: "healthdash::pipeline",
            "joined '{}' on [{}]: {} -> {} rows",
            table.indicator(), keys.join(", "), before, frame.height()
        );
        indicators.push(table.indicator().to_string());
    }
    Ok(JoinedTable::from_parts(sort_rows(frame)?, indicators, Vec::new()))
}

/// Left join entity metadata on `entity_id`. With `require`, rows missing any metadata
/// attribute are dropped (the income-group page only plots classified countries).
pub fn enrich(joined: &JoinedTable, metadata: &MetadataTable, require: bool) -> DashResult<JoinedTable> {
    let attributes = metadata.attributes();
    if let Some(clash) = attributes.iter().find(|a| joined.has_column(a)) {
        return Err(DashError::InvalidPage(format!("metadata column '{}' is already present", clash)));
    }
    let mut frame = joined.frame().join(
        metadata.frame(),
        [MetadataTable::ID],
        [MetadataTable::ID],
        JoinType::Left.into(),
        None,
    )?;
    if require && !attributes.is_empty() {
        let mut present = col(attributes[0].as_str()).is_not_null();
        for a in &attributes[1..] {
            present = present.and(col(a.as_str()).is_not_null());
        }
        frame = frame.lazy().filter(present).collect()?;
    }
    debug!(
        target: "healthdash::pipeline",
        "enriched with [{}] require={}: {} -> {} rows",
        attributes.join(", "), require, joined.height(), frame.height()
    );
    Ok(JoinedTable::from_parts(sort_rows(frame)?, joined.indicators().to_vec(), attributes))
}
