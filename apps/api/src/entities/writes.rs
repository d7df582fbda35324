//! Direct writes against the entity tables. Every public entry point runs in
//! one transaction; the `*_draft` functions take a connection so callers that
//! already hold a transaction (suggestion approval) can reuse them.

use sqlx::{PgConnection, PgPool};
use tracing::info;

use crate::entities::input::{
    BillDraft, EntityDraft, PartyChange, PartyDraft, PoliticianDraft, PromiseDraft,
};
use crate::entities::tags::{clear_tags, sync_tags};
use crate::entities::EntityKind;
use crate::errors::AppError;

pub async fn create_entity(pool: &PgPool, draft: &EntityDraft) -> Result<i64, AppError> {
    let mut tx = pool.begin().await?;
    let id = insert_draft(&mut tx, draft).await?;
    tx.commit().await?;
    info!(kind = draft.kind().as_str(), id, "Created entity");
    Ok(id)
}

pub async fn update_entity(pool: &PgPool, id: i64, draft: &EntityDraft) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    update_draft(&mut tx, id, draft).await?;
    tx.commit().await?;
    info!(kind = draft.kind().as_str(), id, "Updated entity");
    Ok(())
}

/// Deletes the entity with its tag links and vote ledger rows.
pub async fn delete_entity(pool: &PgPool, kind: EntityKind, id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", kind.table()))
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(kind.not_found(id));
    }

    clear_tags(&mut tx, kind, id).await?;
    sqlx::query("DELETE FROM votes WHERE item_type = $1 AND item_id = $2")
        .bind(kind.as_str())
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(kind = kind.as_str(), id, "Deleted entity");
    Ok(())
}

pub async fn insert_draft(conn: &mut PgConnection, draft: &EntityDraft) -> Result<i64, AppError> {
    let id = match draft {
        EntityDraft::Politician(d) => insert_politician(conn, d).await?,
        EntityDraft::Party(d) => insert_party(conn, d).await?,
        EntityDraft::Promise(d) => insert_promise(conn, d).await?,
        EntityDraft::Bill(d) => insert_bill(conn, d).await?,
    };
    write_children(conn, id, draft).await?;
    Ok(id)
}

pub async fn update_draft(
    conn: &mut PgConnection,
    id: i64,
    draft: &EntityDraft,
) -> Result<(), AppError> {
    let updated = match draft {
        EntityDraft::Politician(d) => update_politician(conn, id, d).await?,
        EntityDraft::Party(d) => update_party(conn, id, d).await?,
        EntityDraft::Promise(d) => update_promise(conn, id, d).await?,
        EntityDraft::Bill(d) => update_bill(conn, id, d).await?,
    };
    if updated.is_none() {
        return Err(draft.kind().not_found(id));
    }
    write_children(conn, id, draft).await
}

/// Tags and nested collections; each is replaced only when present in the draft.
async fn write_children(
    conn: &mut PgConnection,
    id: i64,
    draft: &EntityDraft,
) -> Result<(), AppError> {
    if let Some(tags) = draft.tags() {
        sync_tags(conn, draft.kind(), id, tags).await?;
    }
    match draft {
        EntityDraft::Politician(d) => write_politician_children(conn, id, d).await,
        EntityDraft::Party(d) => write_party_children(conn, id, d).await,
        EntityDraft::Promise(_) | EntityDraft::Bill(_) => Ok(()),
    }
}

// ── Politicians ─────────────────────────────────────────────────────────────

async fn insert_politician(conn: &mut PgConnection, d: &PoliticianDraft) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar(
        r#"
        INSERT INTO politicians
            (name, image_url, bio, date_of_birth, province, position, education, contact_email)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(&d.name)
    .bind(&d.image_url)
    .bind(&d.bio)
    .bind(d.date_of_birth)
    .bind(&d.province)
    .bind(&d.position)
    .bind(&d.education)
    .bind(&d.contact_email)
    .fetch_one(&mut *conn)
    .await?)
}

async fn update_politician(
    conn: &mut PgConnection,
    id: i64,
    d: &PoliticianDraft,
) -> Result<Option<i64>, AppError> {
    Ok(sqlx::query_scalar(
        r#"
        UPDATE politicians SET
            name = $2, image_url = $3, bio = $4, date_of_birth = $5, province = $6,
            position = $7, education = $8, contact_email = $9, updated_at = now()
        WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(&d.name)
    .bind(&d.image_url)
    .bind(&d.bio)
    .bind(d.date_of_birth)
    .bind(&d.province)
    .bind(&d.position)
    .bind(&d.education)
    .bind(&d.contact_email)
    .fetch_optional(&mut *conn)
    .await?)
}

async fn write_politician_children(
    conn: &mut PgConnection,
    id: i64,
    d: &PoliticianDraft,
) -> Result<(), AppError> {
    match d.party {
        PartyChange::Keep => {}
        PartyChange::Leave => end_active_party(conn, id).await?,
        PartyChange::Join(party_id) => {
            set_active_party(conn, id, party_id, d.party_role.as_deref()).await?
        }
    }

    if let Some(career) = &d.career {
        sqlx::query("DELETE FROM politician_career WHERE politician_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        for entry in career {
            sqlx::query(
                r#"
                INSERT INTO politician_career
                    (politician_id, title, organization, start_date, end_date, description)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(id)
            .bind(entry.title.trim())
            .bind(&entry.organization)
            .bind(entry.start_date)
            .bind(entry.end_date)
            .bind(&entry.description)
            .execute(&mut *conn)
            .await?;
        }
    }

    if let Some(assets) = &d.assets {
        sqlx::query("DELETE FROM politician_assets WHERE politician_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        for asset in assets {
            sqlx::query(
                r#"
                INSERT INTO politician_assets
                    (politician_id, declaration_year, description, estimated_value, source_url)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(id)
            .bind(asset.declaration_year)
            .bind(asset.description.trim())
            .bind(asset.estimated_value)
            .bind(&asset.source_url)
            .execute(&mut *conn)
            .await?;
        }
    }

    if let Some(records) = &d.criminal_records {
        sqlx::query("DELETE FROM politician_criminal_records WHERE politician_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        for record in records {
            sqlx::query(
                r#"
                INSERT INTO politician_criminal_records
                    (politician_id, case_title, description, severity, status, filed_on, source_url)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(id)
            .bind(&record.case_title)
            .bind(&record.description)
            .bind(record.severity.as_str())
            .bind(record.status.as_str())
            .bind(record.filed_on)
            .bind(&record.source_url)
            .execute(&mut *conn)
            .await?;
        }
    }

    if let Some(links) = &d.social_links {
        sqlx::query("DELETE FROM politician_social_links WHERE politician_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        for link in links {
            sqlx::query(
                "INSERT INTO politician_social_links (politician_id, platform, url) VALUES ($1, $2, $3)",
            )
            .bind(id)
            .bind(link.platform.trim())
            .bind(link.url.trim())
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(())
}

/// Ends the politician's active membership, if any.
pub async fn end_active_party(conn: &mut PgConnection, politician_id: i64) -> Result<(), AppError> {
    let closed = close_active_membership(conn, politician_id).await?;
    if closed > 0 {
        info!(politician_id, "Ended active party membership");
    }
    Ok(())
}

async fn close_active_membership(conn: &mut PgConnection, politician_id: i64) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE party_memberships
        SET is_active = FALSE, end_date = COALESCE(end_date, CURRENT_DATE)
        WHERE politician_id = $1 AND is_active
        "#,
    )
    .bind(politician_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

/// Makes `party_id` the politician's only active membership. Any other
/// active membership is closed first, so at most one is ever active.
pub async fn set_active_party(
    conn: &mut PgConnection,
    politician_id: i64,
    party_id: i64,
    role: Option<&str>,
) -> Result<(), AppError> {
    let current: Option<(i64, i64)> = sqlx::query_as(
        "SELECT id, party_id FROM party_memberships WHERE politician_id = $1 AND is_active FOR UPDATE",
    )
    .bind(politician_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some((membership_id, current_party)) = current {
        if current_party == party_id {
            if role.is_some() {
                sqlx::query("UPDATE party_memberships SET role = $2 WHERE id = $1")
                    .bind(membership_id)
                    .bind(role)
                    .execute(&mut *conn)
                    .await?;
            }
            return Ok(());
        }
    }

    close_active_membership(conn, politician_id).await?;

    sqlx::query(
        r#"
        INSERT INTO party_memberships (politician_id, party_id, role, start_date, is_active)
        VALUES ($1, $2, $3, CURRENT_DATE, TRUE)
        "#,
    )
    .bind(politician_id)
    .bind(party_id)
    .bind(role)
    .execute(&mut *conn)
    .await?;

    info!(politician_id, party_id, "Activated party membership");
    Ok(())
}

// ── Parties ─────────────────────────────────────────────────────────────────

async fn insert_party(conn: &mut PgConnection, d: &PartyDraft) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar(
        r#"
        INSERT INTO parties
            (name, abbreviation, logo_url, description, founded_date, ideology, headquarters, website)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(&d.name)
    .bind(&d.abbreviation)
    .bind(&d.logo_url)
    .bind(&d.description)
    .bind(d.founded_date)
    .bind(&d.ideology)
    .bind(&d.headquarters)
    .bind(&d.website)
    .fetch_one(&mut *conn)
    .await?)
}

async fn update_party(
    conn: &mut PgConnection,
    id: i64,
    d: &PartyDraft,
) -> Result<Option<i64>, AppError> {
    Ok(sqlx::query_scalar(
        r#"
        UPDATE parties SET
            name = $2, abbreviation = $3, logo_url = $4, description = $5, founded_date = $6,
            ideology = $7, headquarters = $8, website = $9, updated_at = now()
        WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(&d.name)
    .bind(&d.abbreviation)
    .bind(&d.logo_url)
    .bind(&d.description)
    .bind(d.founded_date)
    .bind(&d.ideology)
    .bind(&d.headquarters)
    .bind(&d.website)
    .fetch_optional(&mut *conn)
    .await?)
}

async fn write_party_children(
    conn: &mut PgConnection,
    id: i64,
    d: &PartyDraft,
) -> Result<(), AppError> {
    if let Some(history) = &d.election_history {
        sqlx::query("DELETE FROM party_election_history WHERE party_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        for entry in history {
            sqlx::query(
                r#"
                INSERT INTO party_election_history
                    (party_id, election_year, election_type, seats_won, total_seats, vote_percentage)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(id)
            .bind(entry.election_year)
            .bind(&entry.election_type)
            .bind(entry.seats_won)
            .bind(entry.total_seats)
            .bind(entry.vote_percentage)
            .execute(&mut *conn)
            .await?;
        }
    }

    if let Some(controversies) = &d.controversies {
        // Sources cascade with their controversy.
        sqlx::query("DELETE FROM party_controversies WHERE party_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        for controversy in controversies {
            let controversy_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO party_controversies (party_id, title, description, occurred_on)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(id)
            .bind(&controversy.title)
            .bind(&controversy.description)
            .bind(controversy.date)
            .fetch_one(&mut *conn)
            .await?;

            if !controversy.sources.is_empty() {
                sqlx::query(
                    r#"
                    INSERT INTO party_controversy_sources (controversy_id, url)
                    SELECT $1, UNNEST($2::text[])
                    "#,
                )
                .bind(controversy_id)
                .bind(&controversy.sources)
                .execute(&mut *conn)
                .await?;
            }
        }
    }

    Ok(())
}

// ── Promises & bills ────────────────────────────────────────────────────────

async fn insert_promise(conn: &mut PgConnection, d: &PromiseDraft) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar(
        r#"
        INSERT INTO promises
            (title, description, status, due_date, politician_id, party_id, updates, evidence_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(&d.title)
    .bind(&d.description)
    .bind(d.status)
    .bind(d.due_date)
    .bind(d.sponsor.politician_id())
    .bind(d.sponsor.party_id())
    .bind(&d.updates)
    .bind(&d.evidence_url)
    .fetch_one(&mut *conn)
    .await?)
}

async fn update_promise(
    conn: &mut PgConnection,
    id: i64,
    d: &PromiseDraft,
) -> Result<Option<i64>, AppError> {
    Ok(sqlx::query_scalar(
        r#"
        UPDATE promises SET
            title = $2, description = $3, status = $4, due_date = $5, politician_id = $6,
            party_id = $7, updates = $8, evidence_url = $9, updated_at = now()
        WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(&d.title)
    .bind(&d.description)
    .bind(d.status)
    .bind(d.due_date)
    .bind(d.sponsor.politician_id())
    .bind(d.sponsor.party_id())
    .bind(&d.updates)
    .bind(&d.evidence_url)
    .fetch_optional(&mut *conn)
    .await?)
}

async fn insert_bill(conn: &mut PgConnection, d: &BillDraft) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar(
        r#"
        INSERT INTO bills
            (title, description, bill_number, status, ministry, category,
             registration_date, proposed_date, politician_id, party_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        "#,
    )
    .bind(&d.title)
    .bind(&d.description)
    .bind(&d.bill_number)
    .bind(d.status)
    .bind(&d.ministry)
    .bind(&d.category)
    .bind(d.registration_date)
    .bind(d.proposed_date)
    .bind(d.sponsor.politician_id())
    .bind(d.sponsor.party_id())
    .fetch_one(&mut *conn)
    .await?)
}

async fn update_bill(
    conn: &mut PgConnection,
    id: i64,
    d: &BillDraft,
) -> Result<Option<i64>, AppError> {
    Ok(sqlx::query_scalar(
        r#"
        UPDATE bills SET
            title = $2, description = $3, bill_number = $4, status = $5, ministry = $6,
            category = $7, registration_date = $8, proposed_date = $9, politician_id = $10,
            party_id = $11, updated_at = now()
        WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(&d.title)
    .bind(&d.description)
    .bind(&d.bill_number)
    .bind(d.status)
    .bind(&d.ministry)
    .bind(&d.category)
    .bind(d.registration_date)
    .bind(d.proposed_date)
    .bind(d.sponsor.politician_id())
    .bind(d.sponsor.party_id())
    .fetch_optional(&mut *conn)
    .await?)
}
