// Entity tables share one column layout, so their statements are rendered per
// table. `table` always comes from `EntityFamily::table_name`.

const ENTITY_COLUMNS: &str =
    "id, scope_id, payload, is_synced, last_synced_at, sort_at, expires_at";

pub(super) fn upsert_entity(table: &str) -> String {
    format!(
        r#"
    INSERT INTO {table} ({ENTITY_COLUMNS})
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(id) DO UPDATE SET
        scope_id = excluded.scope_id,
        payload = excluded.payload,
        is_synced = excluded.is_synced,
        last_synced_at = excluded.last_synced_at,
        sort_at = excluded.sort_at,
        expires_at = excluded.expires_at
"#
    )
}

/// Same as `upsert_entity` but leaves locally unsynced rows untouched.
pub(super) fn upsert_entity_if_synced(table: &str) -> String {
    format!(
        r#"
    INSERT INTO {table} ({ENTITY_COLUMNS})
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(id) DO UPDATE SET
        scope_id = excluded.scope_id,
        payload = excluded.payload,
        is_synced = excluded.is_synced,
        last_synced_at = excluded.last_synced_at,
        sort_at = excluded.sort_at,
        expires_at = excluded.expires_at
    WHERE {table}.is_synced = 1
"#
    )
}

pub(super) fn select_entity_by_id(table: &str) -> String {
    format!(
        r#"
    SELECT {ENTITY_COLUMNS}
    FROM {table}
    WHERE id = ?1
"#
    )
}

/// Prefix for filtered listings; the caller appends conditions.
pub(super) fn select_entities(table: &str) -> String {
    format!("SELECT {ENTITY_COLUMNS} FROM {table} WHERE 1 = 1")
}

pub(super) fn delete_entity(table: &str) -> String {
    format!("DELETE FROM {table} WHERE id = ?1")
}

pub(super) fn delete_expired_actions(table: &str) -> String {
    format!(
        r#"
    DELETE FROM pending_actions
    WHERE entity_family = ?1
      AND entity_id IN (
          SELECT id FROM {table}
          WHERE expires_at IS NOT NULL AND expires_at <= ?2
      )
"#
    )
}

pub(super) fn delete_expired_entities(table: &str) -> String {
    format!(
        r#"
    DELETE FROM {table}
    WHERE expires_at IS NOT NULL AND expires_at <= ?1
"#
    )
}

/// Rewrites references to a provisional id inside another table's rows.
pub(super) fn remap_entity_references(table: &str) -> String {
    format!(
        r#"
    UPDATE {table}
    SET scope_id = REPLACE(scope_id, ?1, ?2),
        payload = REPLACE(payload, ?1, ?2)
    WHERE instr(scope_id, ?1) > 0 OR instr(payload, ?1) > 0
"#
    )
}

pub(super) const INSERT_PENDING_ACTION: &str = r#"
    INSERT INTO pending_actions (
        action_type,
        entity_family,
        entity_id,
        idempotency_key,
        payload,
        retry_count,
        max_retries,
        created_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7)
"#;

pub(super) const SELECT_PENDING_ACTION_BY_ID: &str = r#"
    SELECT id, action_type, entity_family, entity_id, idempotency_key, payload,
           retry_count, max_retries, created_at, last_attempt_at, last_error
    FROM pending_actions
    WHERE id = ?1
"#;

pub(super) const SELECT_PENDING_ACTIONS: &str = r#"
    SELECT id, action_type, entity_family, entity_id, idempotency_key, payload,
           retry_count, max_retries, created_at, last_attempt_at, last_error
    FROM pending_actions
    WHERE 1 = 1
"#;

pub(super) const SELECT_RETRIABLE_ACTIONS: &str = r#"
    SELECT id, action_type, entity_family, entity_id, idempotency_key, payload,
           retry_count, max_retries, created_at, last_attempt_at, last_error
    FROM pending_actions
    WHERE retry_count < max_retries
    ORDER BY created_at ASC, id ASC
"#;

pub(super) const SELECT_LIVE_ACTION_FOR_ENTITY: &str = r#"
    SELECT id, action_type, entity_family, entity_id, idempotency_key, payload,
           retry_count, max_retries, created_at, last_attempt_at, last_error
    FROM pending_actions
    WHERE entity_id = ?1
      AND retry_count < max_retries
    ORDER BY created_at ASC, id ASC
    LIMIT 1
"#;

pub(super) const SELECT_OTHER_LIVE_ACTION_FOR_ENTITY: &str = r#"
    SELECT id
    FROM pending_actions
    WHERE entity_id = ?1
      AND id <> ?2
      AND retry_count < max_retries
    LIMIT 1
"#;

/// Live rows sort ahead of terminal ones.
pub(super) const SELECT_ACTION_FOR_ENTITY: &str = r#"
    SELECT id, action_type, entity_family, entity_id, idempotency_key, payload,
           retry_count, max_retries, created_at, last_attempt_at, last_error
    FROM pending_actions
    WHERE entity_id = ?1
    ORDER BY CASE WHEN retry_count < max_retries THEN 0 ELSE 1 END,
             created_at DESC,
             id DESC
    LIMIT 1
"#;

pub(super) const RECORD_ACTION_FAILURE: &str = r#"
    UPDATE pending_actions
    SET retry_count = CASE
            WHEN ?4 THEN max_retries
            ELSE MIN(retry_count + 1, max_retries)
        END,
        last_attempt_at = ?2,
        last_error = ?3
    WHERE id = ?1
"#;

pub(super) const ANNOTATE_ACTION: &str = r#"
    UPDATE pending_actions
    SET last_attempt_at = ?2,
        last_error = ?3
    WHERE id = ?1
"#;

pub(super) const REQUEUE_ACTION: &str = r#"
    UPDATE pending_actions
    SET retry_count = 0,
        last_error = NULL
    WHERE id = ?1
"#;

pub(super) const DELETE_PENDING_ACTION: &str = r#"
    DELETE FROM pending_actions
    WHERE id = ?1
"#;

pub(super) const DELETE_ACTIONS_FOR_ENTITY: &str = r#"
    DELETE FROM pending_actions
    WHERE entity_family = ?1 AND entity_id = ?2
"#;

pub(super) const REMAP_ACTION_REFERENCES: &str = r#"
    UPDATE pending_actions
    SET entity_id = CASE WHEN entity_id = ?1 THEN ?2 ELSE entity_id END,
        payload = REPLACE(payload, ?1, ?2)
    WHERE entity_id = ?1 OR instr(payload, ?1) > 0
"#;

pub(super) const COUNT_OUTBOX: &str = r#"
    SELECT
        COALESCE(SUM(CASE WHEN retry_count < max_retries THEN 1 ELSE 0 END), 0) AS retriable,
        COALESCE(SUM(CASE WHEN retry_count >= max_retries THEN 1 ELSE 0 END), 0) AS terminal
    FROM pending_actions
"#;
