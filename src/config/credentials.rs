use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::config::identity::IdentityConfig;
use crate::store::ParameterStore;

/// Fill identity fields still empty from a JSON object parameter such as
/// `{"AUTH0_DOMAIN": "...", "AUTH0_CLIENT_ID": "...", "AUTH0_CLIENT_SECRET": "..."}`.
/// Explicitly configured values are never replaced. Returns how many fields were filled.
pub async fn inject_credentials(identity: &mut IdentityConfig, store: &dyn ParameterStore) -> Result<usize> {
    let Some(parameter) = identity.credentials_parameter.clone().filter(|p| !p.is_empty()) else {
        return Ok(0);
    };

    let raw = store
        .get(&parameter)
        .await?
        .ok_or_else(|| anyhow!("credentials parameter '{}' not found", parameter))?;
    let values: HashMap<String, String> = serde_json::from_str(&raw)
        .with_context(|| format!("credentials parameter '{}' must be a JSON object of strings", parameter))?;

    let mut filled = 0;
    let mut fill_required = |field: &mut String, key: &str| {
        if field.trim().is_empty() {
            if let Some(value) = values.get(key) {
                *field = value.clone();
                filled += 1;
            }
        }
    };
    fill_required(&mut identity.domain, "AUTH0_DOMAIN");
    fill_required(&mut identity.client_id, "AUTH0_CLIENT_ID");
    fill_required(&mut identity.client_secret, "AUTH0_CLIENT_SECRET");

    for (field, key) in [
        (&mut identity.audience, "AUTH0_AUDIENCE"),
        (&mut identity.web_client_id, "AUTH0_WEB_CLIENT_ID"),
        (&mut identity.connection, "AUTH0_CONNECTION"),
        (&mut identity.redirect_uri, "REDIRECT_URI"),
    ] {
        if field.as_deref().map_or(true, str::is_empty) {
            if let Some(value) = values.get(key) {
                *field = Some(value.clone());
                filled += 1;
            }
        }
    }

    info!("credentials loaded from parameter '{}' ({} fields)", parameter, filled);
    Ok(filled)
}
