//! Account and household member operations

use rusqlite::params;
use rusqlite::Row;

use super::{column_enum, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Account, AccountKind, Member, MemberKind};

fn map_member(row: &Row) -> rusqlite::Result<Member> {
    let kind: String = row.get(2)?;
    let created_at: String = row.get(5)?;

    Ok(Member {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: column_enum(2, kind)?,
        active: row.get(3)?,
        order_index: row.get(4)?,
        created_at: parse_datetime(&created_at),
    })
}

fn map_account(row: &Row) -> rusqlite::Result<Account> {
    let kind: String = row.get(2)?;
    let created_at: String = row.get(7)?;

    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: column_enum(2, kind)?,
        icon: row.get(3)?,
        color: row.get(4)?,
        active: row.get(5)?,
        order_index: row.get(6)?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// Add a household member
    pub fn add_member(&self, name: &str, kind: MemberKind) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO members (name, member_type) VALUES (?, ?)",
            params![name, kind.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List active members in display order
    pub fn list_members(&self) -> Result<Vec<Member>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, member_type, is_active, order_index, created_at
             FROM members WHERE is_active = 1 ORDER BY order_index, name",
        )?;

        let members = stmt
            .query_map([], map_member)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(members)
    }

    /// Get a member by ID
    pub fn get_member(&self, id: i64) -> Result<Member> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, member_type, is_active, order_index, created_at
             FROM members WHERE id = ?",
            params![id],
            map_member,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::NotFound(format!("Member {} not found", id))
            }
            e => e.into(),
        })
    }

    /// Add a money account
    pub fn add_account(&self, name: &str, kind: AccountKind) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO accounts (name, account_type) VALUES (?, ?)",
            params![name, kind.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List active accounts in display order
    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, account_type, icon, color, is_active, order_index, created_at
             FROM accounts WHERE is_active = 1 ORDER BY order_index, name",
        )?;

        let accounts = stmt
            .query_map([], map_account)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// Get an account by ID
    pub fn get_account(&self, id: i64) -> Result<Account> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, account_type, icon, color, is_active, order_index, created_at
             FROM accounts WHERE id = ?",
            params![id],
            map_account,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::NotFound(format!("Account {} not found", id))
            }
            e => e.into(),
        })
    }
}
