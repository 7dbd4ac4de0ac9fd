//! Ninja command handlers
//!
//! Every command loads the roster first. Mutating commands refuse to run
//! when that load fails, since writing back a partial roster would wipe
//! the bin.

use anyhow::{Context, Result};

use ninja_core::{SaveEvent, SyncEngine, SyncError};

use super::explain;
use crate::output::Output;

/// List all ninjas
pub async fn list(engine: &mut SyncEngine, output: &Output) -> Result<()> {
    load(engine).await?;
    output.print_ninjas(engine.ninjas());
    Ok(())
}

/// Add a new ninja
pub async fn add(engine: &mut SyncEngine, name: String, bucks: i64, output: &Output) -> Result<()> {
    load(engine).await?;

    let index = engine.append_entity(&name, bucks).map_err(explain)?;
    write_back(engine).await?;

    let ninja = &engine.ninjas()[index];
    output.success(&format!(
        "Added {} with {} ninja bucks",
        ninja.name, ninja.bucks
    ));
    output.print_ninja(index, ninja);
    Ok(())
}

/// Give ninja bucks to the ninja at `index`
pub async fn give(engine: &mut SyncEngine, index: usize, amount: i64, output: &Output) -> Result<()> {
    load(engine).await?;

    let bucks = engine.add_bucks(index, amount).map_err(explain)?;
    write_back(engine).await?;

    let ninja = &engine.ninjas()[index];
    output.success(&format!(
        "Gave {} ninja bucks to {} (now {})",
        amount, ninja.name, bucks
    ));
    output.print_ninja(index, ninja);
    Ok(())
}

/// Spend ninja bucks of the ninja at `index`
pub async fn spend(
    engine: &mut SyncEngine,
    index: usize,
    amount: i64,
    output: &Output,
) -> Result<()> {
    load(engine).await?;

    let bucks = engine.spend_bucks(index, amount).map_err(explain)?;
    write_back(engine).await?;

    let ninja = &engine.ninjas()[index];
    output.success(&format!(
        "{} spent {} ninja bucks (now {})",
        ninja.name, amount, bucks
    ));
    output.print_ninja(index, ninja);
    Ok(())
}

async fn load(engine: &mut SyncEngine) -> Result<()> {
    engine.load().await.map_err(explain)?;
    Ok(())
}

/// Wait for the queued write and fail if it did not land
async fn write_back(engine: &mut SyncEngine) -> Result<()> {
    let mut events = engine.take_events();
    engine
        .flush()
        .await
        .context("Save queue stopped before writing")?;

    let mut last_failure = None;
    if let Some(ref mut events) = events {
        while let Ok(event) = events.try_recv() {
            last_failure = match event {
                SaveEvent::Failed { error, .. } => Some(error),
                SaveEvent::Saved { .. } => None,
            };
        }
    }

    match last_failure {
        Some(error) if engine.has_unsaved_changes() => Err(explain(SyncError::Save(error))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ninja_core::{MemoryStore, Ninja, NinjaDocument, RemoteError};

    use crate::output::OutputFormat;

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    fn engine_with(ninjas: Vec<Ninja>) -> (SyncEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_document(NinjaDocument::new(ninjas)));
        (SyncEngine::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_add_persists_new_ninja() {
        let (mut engine, store) = engine_with(vec![Ninja::new("kai", 10)]);

        add(&mut engine, "  ace ".to_string(), 0, &quiet()).await.unwrap();

        assert_eq!(
            store.document().ninjas,
            vec![Ninja::new("KAI", 10), Ninja::new("ACE", 0)]
        );
    }

    #[tokio::test]
    async fn test_add_rejects_empty_name() {
        let (mut engine, store) = engine_with(vec![]);

        let err = add(&mut engine, "   ".to_string(), 5, &quiet())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Please enter a name");
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_give_and_spend() {
        let (mut engine, store) = engine_with(vec![Ninja::new("kai", 10)]);

        give(&mut engine, 0, 5, &quiet()).await.unwrap();
        assert_eq!(store.document().ninjas[0].bucks, 15);

        spend(&mut engine, 0, 20, &quiet()).await.unwrap();
        assert_eq!(store.document().ninjas[0].bucks, -5);
    }

    #[tokio::test]
    async fn test_give_rejects_zero_amount() {
        let (mut engine, store) = engine_with(vec![Ninja::new("kai", 10)]);

        let err = give(&mut engine, 0, 0, &quiet()).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter amount greater than 0!");
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_spend_unknown_index() {
        let (mut engine, _store) = engine_with(vec![Ninja::new("kai", 10)]);

        let err = spend(&mut engine, 4, 1, &quiet()).await.unwrap_err();
        assert!(err.to_string().contains("No ninja at position 4"));
    }

    #[tokio::test]
    async fn test_mutation_refused_when_load_fails() {
        let (mut engine, store) = engine_with(vec![Ninja::new("kai", 10)]);
        store.set_fetch_error(Some(RemoteError::Transport("offline".to_string())));

        let err = add(&mut engine, "ace".to_string(), 1, &quiet())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to load"));
        assert!(err.to_string().contains("network"));
        assert!(engine.ninjas().is_empty());
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_is_reported() {
        let (mut engine, store) = engine_with(vec![Ninja::new("kai", 10)]);
        store.set_write_error(Some(RemoteError::Transport("offline".to_string())));

        let err = give(&mut engine, 0, 1, &quiet()).await.unwrap_err();

        assert!(err.to_string().contains("Failed to save"));
        assert_eq!(store.document().ninjas[0].bucks, 10);
    }
}
