//! `cardseal show`: a single read of the saved card.

use std::path::Path;

use clap::Args;

use crate::render;

/// Show command arguments.
#[derive(Args)]
pub struct ShowArgs {
    /// Print the full card number and CVV instead of the masked form
    #[arg(long)]
    pub reveal: bool,
}

/// Run the show command.
pub async fn run(args: ShowArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let pipeline = super::pipeline(config_path)?;

    let token = pipeline
        .unseal()
        .await
        .map_err(|e| super::explain(e, "read card"))?;

    println!("{}", render::card(token.as_ref(), args.reveal));
    Ok(())
}
