use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

/// Appends one audit row. Per §9 ("operation-log fire-and-forget"), callers
/// spawn this on a detached task so a failing write never affects the
/// response already sent to the admin; the failure is only logged here.
pub async fn append(
    pool: &PgPool,
    admin_id: Uuid,
    action: &str,
    target_id: Option<&str>,
    before_value: Option<&str>,
    after_value: Option<&str>,
    client_ip: Option<&str>,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO operation_log (admin_id, action, target_id, before_value, after_value, client_ip)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(admin_id)
    .bind(action)
    .bind(target_id)
    .bind(before_value)
    .bind(after_value)
    .bind(client_ip)
    .execute(pool)
    .await;

    if let Err(err) = result {
        warn!(error = %err, %action, "operation log write failed");
    }
}
