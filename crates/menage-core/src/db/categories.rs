//! Category operations: CRUD, picker grouping and usage favorites

use rusqlite::params;
use rusqlite::Row;

use super::{column_enum, parse_datetime, Database};
use crate::error::Result;
use crate::models::{Category, TransactionKind};

const CATEGORY_COLUMNS: &str = "id, name, category_type, icon, color, parent_id, group_name, \
     is_active, is_hidden, order_index, created_at";

fn map_category(row: &Row) -> rusqlite::Result<Category> {
    let kind: String = row.get(2)?;
    let created_at: String = row.get(10)?;

    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: column_enum(2, kind)?,
        icon: row.get(3)?,
        color: row.get(4)?,
        parent_id: row.get(5)?,
        group_name: row.get(6)?,
        active: row.get(7)?,
        hidden: row.get(8)?,
        order_index: row.get(9)?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// Add a category
    pub fn add_category(
        &self,
        name: &str,
        kind: TransactionKind,
        group_name: Option<&str>,
        parent_id: Option<i64>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (name, category_type, group_name, parent_id) VALUES (?, ?, ?, ?)",
            params![name, kind.as_str(), group_name, parent_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List active categories, optionally filtered by type. Hidden
    /// categories are included here; they stay valid on old
    /// transactions and only the picker views exclude them.
    pub fn list_categories(&self, kind: Option<TransactionKind>) -> Result<Vec<Category>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {} FROM categories WHERE is_active = 1", CATEGORY_COLUMNS);
        let mut sql_params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(kind) = kind {
            sql.push_str(" AND category_type = ?");
            sql_params.push(Box::new(kind.as_str().to_string()));
        }
        sql.push_str(" ORDER BY name");

        let mut stmt = conn.prepare(&sql)?;
        let categories = stmt
            .query_map(
                rusqlite::params_from_iter(sql_params.iter().map(|p| p.as_ref())),
                map_category,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// Picker view: active, non-hidden categories of one type grouped
    /// by group_name. Categories without a group land in "Autres".
    pub fn list_categories_grouped(
        &self,
        kind: TransactionKind,
    ) -> Result<Vec<(String, Vec<Category>)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories
             WHERE is_active = 1 AND is_hidden = 0 AND category_type = ?
             ORDER BY group_name IS NULL, group_name, order_index, name",
            CATEGORY_COLUMNS
        ))?;

        let categories = stmt
            .query_map(params![kind.as_str()], map_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut groups: Vec<(String, Vec<Category>)> = Vec::new();
        for category in categories {
            let group = category
                .group_name
                .clone()
                .unwrap_or_else(|| "Autres".to_string());
            match groups.iter_mut().find(|(name, _)| *name == group) {
                Some((_, members)) => members.push(category),
                None => groups.push((group, vec![category])),
            }
        }

        Ok(groups)
    }

    /// Most-used categories of one type over the trailing 90 days,
    /// with their usage counts, largest first.
    pub fn favorite_categories(
        &self,
        kind: TransactionKind,
        limit: usize,
    ) -> Result<Vec<(Category, i64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.name, c.category_type, c.icon, c.color, c.parent_id, c.group_name,
                    c.is_active, c.is_hidden, c.order_index, c.created_at, COUNT(t.id) AS uses
             FROM categories c
             JOIN transactions t ON t.category_id = c.id
             WHERE c.is_active = 1 AND c.is_hidden = 0 AND c.category_type = ?
               AND t.date >= date('now', '-90 days')
             GROUP BY c.id
             ORDER BY uses DESC, c.name
             LIMIT ?",
        )?;

        let favorites = stmt
            .query_map(params![kind.as_str(), limit as i64], |row| {
                let category = map_category(row)?;
                let uses: i64 = row.get(11)?;
                Ok((category, uses))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(favorites)
    }
}
