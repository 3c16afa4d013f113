//! Bank aggregator connection operations

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::BankConnection;

fn row_to_connection(row: &Row) -> rusqlite::Result<BankConnection> {
    let created_at_str: String = row.get(3)?;
    let updated_at_str: String = row.get(4)?;

    Ok(BankConnection {
        user_id: row.get(0)?,
        powens_user_id: row.get(1)?,
        access_token: row.get(2)?,
        created_at: parse_datetime(&created_at_str),
        updated_at: parse_datetime(&updated_at_str),
    })
}

impl Database {
    /// Store or replace a user's aggregator credentials
    pub fn upsert_bank_connection(
        &self,
        user_id: &str,
        powens_user_id: i64,
        access_token: &str,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO bank_connections (user_id, powens_user_id, access_token)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                powens_user_id = excluded.powens_user_id,
                access_token = excluded.access_token,
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![user_id, powens_user_id, access_token],
        )?;
        Ok(())
    }

    pub fn get_bank_connection(&self, user_id: &str) -> Result<Option<BankConnection>> {
        let conn = self.conn()?;
        let connection = conn
            .query_row(
                r#"
                SELECT user_id, powens_user_id, access_token, created_at, updated_at
                FROM bank_connections
                WHERE user_id = ?
                "#,
                params![user_id],
                row_to_connection,
            )
            .optional()?;
        Ok(connection)
    }

    /// Every connected user, ordered by user id
    pub fn list_bank_connections(&self) -> Result<Vec<BankConnection>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT user_id, powens_user_id, access_token, created_at, updated_at
            FROM bank_connections
            ORDER BY user_id
            "#,
        )?;

        let connections = stmt
            .query_map([], row_to_connection)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(connections)
    }
}
