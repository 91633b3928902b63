// alias-cli/src/commands/aliases.rs
use crate::output::{
    format_output, print_response, print_success, print_warning, report_error, AliasTable,
    ErrorResponse, ExitCode, Meta, OutputFormat, Response,
};
use alias_sync::{
    Alias, AliasApi, AliasId, AliasListEngine, CommandError, ErrorNotification, FetchOutcome,
    FilterMode, MutationOutcome, Subscription, SyncEvent,
};
use anyhow::Result;
use dialoguer::Confirm;
use serde_json::json;
use std::io::IsTerminal;

/// First error delivered to `events`, acknowledged so the engine can raise it again
fn take_error<A: AliasApi>(
    engine: &AliasListEngine<A>,
    events: &mut Subscription,
) -> Option<ErrorNotification> {
    let error = events.drain().into_iter().find_map(|e| match e {
        SyncEvent::Error(err) => Some(err),
        SyncEvent::Changed(_) => None,
    })?;
    engine.acknowledge_error(error.kind);
    Some(error)
}

/// Page through the list until `id` shows up or the pages run out
async fn find_alias<A: AliasApi>(engine: &AliasListEngine<A>, id: AliasId) -> Option<Alias> {
    loop {
        if let Some(alias) = engine.alias(id) {
            return Some(alias);
        }
        tracing::debug!(%id, "alias not loaded yet, fetching next page");
        match engine.fetch_next_page().await {
            FetchOutcome::Appended(_) | FetchOutcome::Synced(_) => continue,
            FetchOutcome::Skipped | FetchOutcome::Failed(_) => return None,
        }
    }
}

fn state_name(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

fn command_error(err: CommandError) -> ErrorResponse {
    match err {
        CommandError::UnknownAlias(id) => {
            ErrorResponse::not_found(format!("Alias {} not found", id))
        }
        CommandError::Busy { .. } => ErrorResponse::validation_failed(err.to_string()),
    }
}

pub async fn list_aliases<A: AliasApi>(
    engine: &AliasListEngine<A>,
    filter: FilterMode,
    all_pages: bool,
    format: OutputFormat,
) -> Result<ExitCode> {
    let mut events = engine.subscribe();
    engine.set_filter_mode(filter);

    let mut outcome = engine.fetch_next_page().await;
    while all_pages && matches!(outcome, FetchOutcome::Appended(_)) && engine.has_more() {
        outcome = engine.fetch_next_page().await;
    }

    if let Some(error) = take_error(engine, &mut events) {
        return report_error(ErrorResponse::from(&error), format);
    }

    let view = engine.snapshot();
    let table = AliasTable {
        aliases: &view.visible,
        meta: Meta {
            filter: Some(view.filter_mode.to_string()),
            total: Some(view.total),
            has_more: Some(view.has_more),
        },
    };
    println!("{}", format_output(&table, format));
    if view.has_more && format.is_human() {
        print_warning("More aliases available, use --all to load every page");
    }
    Ok(ExitCode::Success)
}

/// Enable, disable, or flip (`desired == None`) an alias
pub async fn set_alias_state<A: AliasApi>(
    engine: &AliasListEngine<A>,
    id: AliasId,
    desired: Option<bool>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let mut events = engine.subscribe();

    let Some(alias) = find_alias(engine, id).await else {
        if let Some(error) = take_error(engine, &mut events) {
            return report_error(ErrorResponse::from(&error), format);
        }
        return report_error(command_error(CommandError::UnknownAlias(id)), format);
    };

    if desired != Some(alias.enabled) {
        match engine.toggle(id).await {
            Ok(MutationOutcome::Applied) => {}
            Ok(MutationOutcome::Failed(kind)) => {
                let error = take_error(engine, &mut events).unwrap_or(ErrorNotification {
                    kind,
                    message: format!("Failed to update {}", alias.email),
                });
                return report_error(ErrorResponse::from(&error), format);
            }
            Ok(MutationOutcome::Discarded) => {
                return report_error(command_error(CommandError::UnknownAlias(id)), format)
            }
            Err(err) => return report_error(command_error(err), format),
        }
    }

    let enabled = engine.alias(id).map(|a| a.enabled).unwrap_or(alias.enabled);
    if let Some(wanted) = desired.filter(|wanted| *wanted != enabled) {
        tracing::warn!(%id, wanted, enabled, "server confirmed the opposite state");
        return report_error(
            ErrorResponse::validation_failed(format!(
                "{} was changed elsewhere and is now {}; run the command again to {} it",
                alias.email,
                state_name(enabled),
                if wanted { "enable" } else { "disable" }
            )),
            format,
        );
    }

    if format.is_human() {
        print_success(&format!("{} is {}", alias.email, state_name(enabled)));
    } else {
        print_response(&Response::ok(json!({
            "id": id,
            "email": alias.email,
            "enabled": enabled,
        })))?;
    }
    Ok(ExitCode::Success)
}

pub async fn delete_alias<A: AliasApi>(
    engine: &AliasListEngine<A>,
    id: AliasId,
    force: bool,
    format: OutputFormat,
) -> Result<ExitCode> {
    let mut events = engine.subscribe();

    let Some(alias) = find_alias(engine, id).await else {
        if let Some(error) = take_error(engine, &mut events) {
            return report_error(ErrorResponse::from(&error), format);
        }
        return report_error(command_error(CommandError::UnknownAlias(id)), format);
    };

    if !force {
        if !std::io::stdin().is_terminal() {
            return report_error(
                ErrorResponse::safety_rejected(
                    "--force flag is required for delete outside a terminal".to_string(),
                ),
                format,
            );
        }
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete \"{}\"? People/apps who used to contact you via this alias cannot reach you any more. This operation is irreversible.",
                alias.email
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            return report_error(
                ErrorResponse::safety_rejected("Delete cancelled".to_string()),
                format,
            );
        }
    }

    match engine.delete(id).await {
        Ok(MutationOutcome::Applied) | Ok(MutationOutcome::Discarded) => {}
        Ok(MutationOutcome::Failed(kind)) => {
            let error = take_error(engine, &mut events).unwrap_or(ErrorNotification {
                kind,
                message: format!("Failed to delete {}", alias.email),
            });
            return report_error(ErrorResponse::from(&error), format);
        }
        Err(err) => return report_error(command_error(err), format),
    }

    if format.is_human() {
        print_success(&format!("Deleted {}", alias.email));
    } else {
        print_response(&Response::ok(json!({
            "id": id,
            "email": alias.email,
            "deleted": true,
        })))?;
    }
    Ok(ExitCode::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alias_sync::{AliasPage, ApiError, Cursor};
    use async_trait::async_trait;

    /// One disabled alias; every toggle confirms `confirmed`.
    struct OneAlias {
        confirmed: bool,
    }

    #[async_trait]
    impl AliasApi for OneAlias {
        async fn list_aliases(&self, _cursor: &Cursor) -> Result<AliasPage, ApiError> {
            Ok(AliasPage {
                aliases: vec![Alias::new(7, "shop@sl.co", false)],
                next_cursor: Cursor::from_token("1"),
                has_more: false,
            })
        }

        async fn set_alias_enabled(&self, _id: AliasId, _desired: bool) -> Result<bool, ApiError> {
            Ok(self.confirmed)
        }

        async fn delete_alias(&self, _id: AliasId) -> Result<(), ApiError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_enable_succeeds_when_server_confirms() {
        let engine = AliasListEngine::new(OneAlias { confirmed: true });
        let code = set_alias_state(&engine, AliasId(7), Some(true), OutputFormat::Json)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::Success);
        assert!(engine.alias(AliasId(7)).unwrap().enabled);
    }

    #[tokio::test]
    async fn test_enable_fails_when_server_ends_up_disabled() {
        // Enabled from another device, so the toggle flipped it back off
        let engine = AliasListEngine::new(OneAlias { confirmed: false });
        let code = set_alias_state(&engine, AliasId(7), Some(true), OutputFormat::Json)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::PermanentError);
        assert!(!engine.alias(AliasId(7)).unwrap().enabled);
    }

    #[tokio::test]
    async fn test_plain_toggle_accepts_any_confirmed_state() {
        let engine = AliasListEngine::new(OneAlias { confirmed: false });
        let code = set_alias_state(&engine, AliasId(7), None, OutputFormat::Json)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::Success);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let engine = AliasListEngine::new(OneAlias { confirmed: true });
        let code = set_alias_state(&engine, AliasId(99), Some(false), OutputFormat::Json)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::PermanentError);
    }
}
