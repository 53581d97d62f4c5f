//! LINC Print Admin permission review console.

#![forbid(unsafe_code)]

mod console_config;
mod permission_review;

use std::sync::Arc;

use linc_application::{OperatorSessionProvider, UserPermissionFormService};
use linc_core::AppError;
use linc_infrastructure::HttpLincAdminClient;
use tracing::{info, warn};

use crate::console_config::{ConsoleConfig, init_tracing};
use crate::permission_review::PermissionReview;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ConsoleConfig::load()?;
    let client = Arc::new(HttpLincAdminClient::new(config.api_client()?)?);

    info!(
        api_base_url = %config.api_base_url,
        review_user_id = %config.review_user_id,
        max_attempts = config.http_max_attempts,
        "linc-console started"
    );

    let actor = client.current_operator().await?;
    info!(
        operator = %actor.username(),
        hierarchy_level = actor.hierarchy_level(),
        superuser = actor.is_superuser(),
        "resolved operator session"
    );

    let service = UserPermissionFormService::new(client.clone(), client);
    let user = service.load_user(&actor, config.review_user_id).await?;
    info!(
        review_user_id = %config.review_user_id,
        username = %user.username(),
        assigned_role = ?user.role_id().map(|role_id| role_id.to_string()),
        "loaded user record"
    );

    let Some(opened) = service
        .open_edit_form(&actor, &user, close_requested(tokio::signal::ctrl_c()))
        .await?
    else {
        info!(
            review_user_id = %config.review_user_id,
            "permission load abandoned before completion"
        );
        return Ok(());
    };

    for warning in &opened.warnings {
        warn!(review_user_id = %config.review_user_id, warning = %warning, "load warning");
    }

    let review = PermissionReview::new(&actor, &opened);
    let rendered = serde_json::to_string_pretty(&review)
        .map_err(|error| AppError::Internal(format!("failed to render review: {error}")))?;
    println!("{rendered}");

    info!(
        review_user_id = %config.review_user_id,
        overrides = review.permission_overrides.len(),
        effective = review.effective_permissions.len(),
        "permission review complete"
    );

    Ok(())
}

/// Resolves when the close signal fires. A signal that fails to install never
/// resolves, so the load runs to completion instead of being abandoned.
async fn close_requested<S>(signal: S)
where
    S: Future<Output = std::io::Result<()>>,
{
    if let Err(error) = signal.await {
        warn!(error = %error, "close signal unavailable; load cannot be cancelled");
        std::future::pending::<()>().await;
    }
}
