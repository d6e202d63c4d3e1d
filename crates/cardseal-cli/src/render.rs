//! Text rendering of unsealed cards.

use cardseal_secrets::CardToken;

/// Shown when nothing has been sealed yet.
pub const PLACEHOLDER: &str = "No card saved yet.";

/// Render the result of an unseal for the terminal.
///
/// The masked form shows only the last four digits and the expiry; the CVV
/// appears only when `reveal` is set.
pub fn card(token: Option<&CardToken>, reveal: bool) -> String {
    let Some(token) = token else {
        return PLACEHOLDER.to_string();
    };

    if reveal {
        format!(
            "{}  exp {}  cvv {}",
            token.card_number().expose_secret(),
            token.expiration().expose_secret(),
            token.cvv().expose_secret()
        )
    } else {
        format!(
            "{}  exp {}",
            token.masked_number(),
            token.expiration().expose_secret()
        )
    }
}
