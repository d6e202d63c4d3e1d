//! `cardseal seal`: the writer side.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::Context;
use cardseal_secrets::CardToken;
use clap::Args;

/// Seal command arguments.
///
/// Values left out are prompted for; the card number and CVV use hidden
/// input.
#[derive(Args)]
pub struct SealArgs {
    /// Card number
    #[arg(long)]
    pub card_number: Option<String>,

    /// Expiration date, e.g. 12/29
    #[arg(long)]
    pub expiration: Option<String>,

    /// Card verification value
    #[arg(long)]
    pub cvv: Option<String>,
}

/// Run the seal command.
pub async fn run(args: SealArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let pipeline = super::pipeline(config_path)?;

    let card_number = match args.card_number {
        Some(v) => v,
        None => rpassword::prompt_password("Card number: ")
            .context("failed to read card number")?,
    };
    let expiration = match args.expiration {
        Some(v) => v,
        None => prompt_line("Expiration date: ")?,
    };
    let cvv = match args.cvv {
        Some(v) => v,
        None => rpassword::prompt_password("CVV: ").context("failed to read CVV")?,
    };

    let token = CardToken::new(card_number.trim(), expiration.trim(), cvv.trim());

    pipeline
        .seal(&token)
        .await
        .map_err(|e| super::explain(e, "seal card"))?;

    println!("Card {} saved.", token.masked_number());
    Ok(())
}

fn prompt_line(prompt: &str) -> anyhow::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line)
}
