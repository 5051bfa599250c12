//! SQLite-backed store.
//!
//! Requests and groups are stored as JSON documents keyed by id. Responses go into
//! an append-only table; the autoincrement `seq` column preserves creation order
//! for history queries. Database access goes through an `r2d2` pool.
use std::time::Duration;

use anyhow::Result;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::rusqlite::{params, OpenFlags, OptionalExtension};
use r2d2_sqlite::SqliteConnectionManager;

use crate::model::{Request, RequestGroup, RequestGroupId, RequestId, Response, ResponseFields};
use crate::store::Store;

/// SQLite-based store implementation
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    /// Opens (or creates) the store at the given database file path.
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE |
                    OpenFlags::SQLITE_OPEN_CREATE |
                    OpenFlags::SQLITE_OPEN_URI
            )
            .with_init(|c| {
                c.busy_timeout(Duration::from_millis(500))?;
                c.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
                c.execute_batch(
                    "CREATE TABLE IF NOT EXISTS requests (
                        id TEXT PRIMARY KEY NOT NULL,
                        doc TEXT NOT NULL,
                        updated_at INTEGER NOT NULL DEFAULT (strftime('%s','now'))
                    );
                    CREATE TABLE IF NOT EXISTS request_groups (
                        id TEXT PRIMARY KEY NOT NULL,
                        doc TEXT NOT NULL,
                        updated_at INTEGER NOT NULL DEFAULT (strftime('%s','now'))
                    );
                    CREATE TABLE IF NOT EXISTS responses (
                        seq INTEGER PRIMARY KEY AUTOINCREMENT,
                        id TEXT NOT NULL UNIQUE,
                        parent_id TEXT NOT NULL,
                        doc TEXT NOT NULL,
                        created_at INTEGER NOT NULL DEFAULT (strftime('%s','now'))
                    );
                    CREATE INDEX IF NOT EXISTS responses_parent ON responses(parent_id);"
                )?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(16)
            .connection_timeout(Duration::from_secs(5))
            .build(manager)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn get_doc(&self, table: &str, id: String) -> Result<Option<String>> {
        let conn = self.conn()?;
        let doc = conn
            .query_row(
                &format!("SELECT doc FROM {table} WHERE id=?1"),
                params![id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(doc)
    }

    fn put_doc(&self, table: &str, id: String, doc: String) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO {table}(id, doc) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE
                 SET doc=excluded.doc, updated_at=strftime('%s','now')"
            ),
            params![id, doc],
        )?;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn request_by_id(&self, id: RequestId) -> Result<Option<Request>> {
        match self.get_doc("requests", id.to_string())? {
            Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            None => Ok(None),
        }
    }

    fn request_group_by_id(&self, id: RequestGroupId) -> Result<Option<RequestGroup>> {
        match self.get_doc("request_groups", id.to_string())? {
            Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            None => Ok(None),
        }
    }

    fn response_create(&self, fields: ResponseFields) -> Result<Response> {
        let response = Response::new(fields);
        let doc = serde_json::to_string(&response)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO responses(id, parent_id, doc) VALUES (?1, ?2, ?3)",
            params![response.id.to_string(), response.parent_id().to_string(), doc],
        )?;
        Ok(response)
    }

    fn responses_for_request(&self, id: RequestId) -> Result<Vec<Response>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT doc FROM responses WHERE parent_id=?1 ORDER BY seq")?;
        let docs = stmt
            .query_map(params![id.to_string()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        docs.iter()
            .map(|doc| serde_json::from_str::<Response>(doc).map_err(anyhow::Error::from))
            .collect()
    }

    fn request_put(&self, request: &Request) -> Result<()> {
        self.put_doc("requests", request.id.to_string(), serde_json::to_string(request)?)
    }

    fn request_group_put(&self, group: &RequestGroup) -> Result<()> {
        self.put_doc("request_groups", group.id.to_string(), serde_json::to_string(group)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Header, Outcome};
    use serde_json::json;

    fn open() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sender.db");
        let store = SqliteStore::new(path.to_str().unwrap()).unwrap();
        (dir, store)
    }

    #[test]
    fn requests_and_groups_round_trip() {
        let (_dir, store) = open();

        let env = json!({ "host": "example.com" }).as_object().cloned().unwrap();
        let group = RequestGroup::new("Default").with_environment(env);
        let mut request = Request::new(group.id, "POST", "{{ host }}/items");
        request.headers.push(Header::new("Accept", "application/json"));

        store.request_group_put(&group).unwrap();
        store.request_put(&request).unwrap();

        assert_eq!(store.request_by_id(request.id).unwrap(), Some(request));
        assert_eq!(store.request_group_by_id(group.id).unwrap(), Some(group));
        assert!(store.request_by_id(RequestId::new()).unwrap().is_none());
    }

    #[test]
    fn responses_keep_creation_order() {
        let (_dir, store) = open();
        let parent = RequestId::new();

        for i in 0..3 {
            store
                .response_create(ResponseFields {
                    parent_id: parent,
                    millis: i,
                    outcome: Outcome::Success {
                        status_code: 200 + i as u16,
                        status_message: "OK".into(),
                        content_type: None,
                        url: "https://example.com/".into(),
                        bytes: 0,
                        body: vec![],
                        headers: vec![],
                    },
                })
                .unwrap();
        }
        store
            .response_create(ResponseFields {
                parent_id: RequestId::new(),
                millis: 0,
                outcome: Outcome::Failure { error: "elsewhere".into() },
            })
            .unwrap();

        let codes: Vec<_> = store
            .responses_for_request(parent)
            .unwrap()
            .iter()
            .map(|r| r.status_code())
            .collect();
        assert_eq!(codes, vec![Some(200), Some(201), Some(202)]);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sender.db");
        let parent = RequestId::new();

        {
            let store = SqliteStore::new(path.to_str().unwrap()).unwrap();
            store
                .response_create(ResponseFields {
                    parent_id: parent,
                    millis: 5,
                    outcome: Outcome::Failure { error: "boom".into() },
                })
                .unwrap();
        }

        let store = SqliteStore::new(path.to_str().unwrap()).unwrap();
        let history = store.responses_for_request(parent).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].error(), Some("boom"));
    }
}
