use anyhow::{anyhow, Result};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use super::*;

impl Database {
    // ============================================================
    // Document operations
    // ============================================================

    /// Documents, most recently updated first.
    pub fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<DocumentWithRelations>> {
        let conn = self.lock()?;
        query_documents(&conn, filter)
    }

    pub fn get_document(&self, id: Uuid) -> Result<Option<DocumentWithRelations>> {
        let conn = self.lock()?;
        let Some(document) = get_document_on(&conn, id)? else {
            return Ok(None);
        };
        let agents = agents_by_id(&conn)?;
        let task_refs = task_refs_by_id(&conn)?;
        with_relations(document, &agents, &task_refs).map(Some)
    }

    /// Create a document and log `document_created` in one transaction.
    pub fn create_document(&self, input: CreateDocumentInput) -> Result<(DocumentWithRelations, Activity)> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let id = Uuid::new_v4();
        let created_at = now();

        tx.execute(
            "INSERT INTO documents (id, title, content, type, task_id, agent_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.title,
                &input.content,
                input.doc_type.as_str(),
                input.task_id.map(|u| u.to_string()),
                input.agent_id.to_string(),
                timestamp(created_at),
                timestamp(created_at),
            ),
        )?;

        let activity = insert_activity(
            &tx,
            kind::DOCUMENT_CREATED,
            input.agent_id,
            input.task_id,
            &format!("Created document: {}", input.title),
            None,
        )?;

        let agents = agents_by_id(&tx)?;
        let task_refs = task_refs_by_id(&tx)?;
        let document = get_document_on(&tx, id)?
            .ok_or_else(|| anyhow!("document {} vanished during creation", id))?;
        let document = with_relations(document, &agents, &task_refs)?;

        tx.commit()?;
        Ok((document, activity))
    }

    /// Partial update. Returns `None` if the document is unknown.
    pub fn update_document(&self, input: UpdateDocumentInput) -> Result<Option<DocumentWithRelations>> {
        let conn = self.lock()?;
        let Some(existing) = get_document_on(&conn, input.id)? else {
            return Ok(None);
        };

        let title = input.title.unwrap_or(existing.title);
        let content = input.content.unwrap_or(existing.content);
        let doc_type = input.doc_type.unwrap_or(existing.doc_type);

        conn.execute(
            "UPDATE documents SET title = ?, content = ?, type = ?, updated_at = ? WHERE id = ?",
            (
                &title,
                &content,
                doc_type.as_str(),
                timestamp(now()),
                input.id.to_string(),
            ),
        )?;

        let agents = agents_by_id(&conn)?;
        let task_refs = task_refs_by_id(&conn)?;
        let document = get_document_on(&conn, input.id)?
            .ok_or_else(|| anyhow!("document {} vanished during update", input.id))?;
        with_relations(document, &agents, &task_refs).map(Some)
    }

    /// Returns `true` if a document was removed.
    pub fn delete_document(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM documents WHERE id = ?", [id.to_string()])?;
        Ok(deleted > 0)
    }
}

pub(super) fn query_documents(conn: &Connection, filter: &DocumentFilter) -> Result<Vec<DocumentWithRelations>> {
    let agents = agents_by_id(conn)?;
    let task_refs = task_refs_by_id(conn)?;

    let mut clauses = Vec::new();
    let mut params: Vec<String> = Vec::new();
    if let Some(task_id) = filter.task_id {
        clauses.push("task_id = ?");
        params.push(task_id.to_string());
    }
    if let Some(agent_id) = filter.agent_id {
        clauses.push("agent_id = ?");
        params.push(agent_id.to_string());
    }
    if let Some(doc_type) = filter.doc_type {
        clauses.push("type = ?");
        params.push(doc_type.as_str().to_string());
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM documents {} ORDER BY updated_at DESC, rowid DESC",
        DOCUMENT_COLUMNS, where_sql
    ))?;
    let documents = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), document_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    documents
        .into_iter()
        .map(|document| with_relations(document, &agents, &task_refs))
        .collect()
}

fn get_document_on(conn: &Connection, id: Uuid) -> Result<Option<Document>> {
    let document = conn
        .query_row(
            &format!("SELECT {} FROM documents WHERE id = ?", DOCUMENT_COLUMNS),
            [id.to_string()],
            document_from_row,
        )
        .optional()?;
    Ok(document)
}

fn with_relations(
    document: Document,
    agents: &HashMap<Uuid, Agent>,
    task_refs: &HashMap<Uuid, TaskRef>,
) -> Result<DocumentWithRelations> {
    let agent = AgentRef::from(lookup(agents, document.agent_id, "author")?);
    let task = document.task_id.and_then(|id| task_refs.get(&id).cloned());
    Ok(DocumentWithRelations {
        document,
        agent,
        task,
    })
}
