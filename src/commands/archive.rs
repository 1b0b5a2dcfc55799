use clap::Subcommand;
use serde_json::json;

use crate::app::Runtime;
use crate::errors::CliError;
use crate::poem::{ArchivedPoem, PoemView};

#[derive(Debug, Subcommand)]
pub enum ArchiveCommand {
    /// List archived poems
    List,
    /// Print one archived poem
    Show { id: String },
}

pub async fn handle(runtime: &Runtime, command: ArchiveCommand) -> Result<(), CliError> {
    let api = runtime.api_client()?;
    let poems = api.list_poems().await?;
    tracing::info!(count = poems.len(), "archive loaded");

    match command {
        ArchiveCommand::List => list(runtime, &poems),
        ArchiveCommand::Show { id } => show(runtime, &poems, &id),
    }
}

fn list(runtime: &Runtime, poems: &[ArchivedPoem]) -> Result<(), CliError> {
    if runtime.output.json {
        runtime.output.print_json(&json!({ "poems": poems }))?;
        return Ok(());
    }

    if poems.is_empty() {
        runtime.output.print_human("(archive is empty)");
        return Ok(());
    }

    let width = poems.iter().map(|p| p.id.len()).max().unwrap_or(0);
    for poem in poems {
        let title = if poem.title.trim().is_empty() {
            "Untitled"
        } else {
            poem.title.trim()
        };
        runtime
            .output
            .print_human(&format!("{:>width$}  {title}", poem.id));
    }
    Ok(())
}

fn show(runtime: &Runtime, poems: &[ArchivedPoem], id: &str) -> Result<(), CliError> {
    let poem = find_poem(poems, id)
        .ok_or_else(|| CliError::Usage(format!("No archived poem with id '{}'.", id.trim())))?;

    if runtime.output.json {
        runtime.output.print_json(poem)?;
    } else {
        runtime.output.print_poem(&PoemView::from(poem), false);
    }
    Ok(())
}

fn find_poem<'a>(poems: &'a [ArchivedPoem], id: &str) -> Option<&'a ArchivedPoem> {
    let id = id.trim();
    poems.iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> ArchivedPoem {
        ArchivedPoem {
            id: id.to_string(),
            title: format!("Poem {id}"),
            content: "verse".to_string(),
            signature: String::new(),
        }
    }

    #[test]
    fn find_matches_trimmed_id() {
        let poems = vec![entry("1"), entry("22")];
        assert_eq!(find_poem(&poems, " 22 ").map(|p| p.title.as_str()), Some("Poem 22"));
        assert!(find_poem(&poems, "3").is_none());
    }
}
