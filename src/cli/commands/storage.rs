use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::storage::DocumentStore;

#[derive(Subcommand)]
pub enum StorageCommands {
    #[command(about = "Create the upload directories with restrictive permissions")]
    Init,
}

pub async fn handle(cmd: StorageCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        StorageCommands::Init => {
            let store = DocumentStore::from_config();
            store.init().await?;
            output_success(
                output_format,
                &format!("Document storage initialized at {}", store.root().display()),
                Some(json!({ "root": store.root() })),
            )
        }
    }
}
