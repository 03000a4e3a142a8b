//! Command implementations for the `firebase` CLI.

use color_eyre::eyre::{eyre, Result, WrapErr};
use serde_json::{json, Value};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::database::{DatabaseRef, QueryOption};
use crate::push_id::generate_push_id;
use crate::sse::{Event, EventType};

/// Print the value at `path` as indented JSON.
pub async fn get(db: &DatabaseRef, path: &str, shallow: bool) -> Result<()> {
    let options = if shallow {
        vec![QueryOption::Shallow]
    } else {
        Vec::new()
    };

    let value: Value = db.child(path).get(&options).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Print change events at `path` until the stream ends or `cancel` fires.
///
/// Without `listen` the command exits when the server closes the stream;
/// with it, the stream is re-established and only `events` are printed.
pub async fn monitor(
    db: &DatabaseRef,
    path: &str,
    listen: bool,
    events: Vec<EventType>,
    cancel: CancellationToken,
) -> Result<()> {
    let target = db.child(path);

    if listen {
        let mut rx = target.listen(cancel, events, Vec::new());
        while let Some(event) = rx.recv().await {
            println!("{}", format_event(&event));
        }
        return Ok(());
    }

    let mut rx = target.watch(cancel, &[]).await?;
    while let Some(event) = rx.recv().await {
        match event.event_type {
            EventType::Closed => info!("Server closed the stream"),
            _ if event.is_terminal() => return Err(eyre!("stream failed: {}", event)),
            _ => println!("{}", format_event(&event)),
        }
    }
    Ok(())
}

/// One line per event: the upper-cased type, then the data as indented JSON
/// when it parses, or verbatim otherwise.
pub fn format_event(event: &Event) -> String {
    let data = match event.json::<Value>() {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()),
        Err(_) => event.data_str().into_owned(),
    };
    format!("{}: {}", event.event_type.as_str().to_uppercase(), data)
}

/// Print the security rules as indented JSON.
pub async fn rules_get(db: &DatabaseRef) -> Result<()> {
    let raw = db.get_rules_json().await?;
    let rules: Value = serde_json::from_slice(&raw).wrap_err("server returned invalid rules")?;
    println!("{}", serde_json::to_string_pretty(&rules)?);
    Ok(())
}

/// Upload the rules in `file`.
pub async fn rules_set(db: &DatabaseRef, file: &Path) -> Result<()> {
    let rules = std::fs::read(file)
        .wrap_err_with(|| format!("could not read rules from {}", file.display()))?;
    db.set_rules_json(&rules).await?;
    info!("Rules updated from {}", file.display());
    Ok(())
}

/// Rules denying every read and write.
pub fn locked_rules() -> Value {
    json!({
        "rules": {
            ".read": false,
            ".write": false
        }
    })
}

/// Replace the rules with [`locked_rules`].
pub async fn rules_clear(db: &DatabaseRef) -> Result<()> {
    db.set_rules(&locked_rules()).await?;
    info!("Rules cleared");
    Ok(())
}

/// Generate `count` push ids.
pub fn push_ids(count: usize) -> Vec<String> {
    (0..count).map(|_| generate_push_id()).collect()
}
