//! One-shot answers to the game server's login prompts.

use super::patterns::{LOGIN_GAME, LOGIN_NAME, LOGIN_PASSWORD};
use tracing::info;

/// Configured credentials. Each answer is handed out at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginScript {
    name: Option<String>,
    game: Option<String>,
    password: Option<String>,
}

impl LoginScript {
    pub fn new(name: Option<String>, game: Option<String>, password: Option<String>) -> Self {
        Self {
            name,
            game,
            password,
        }
    }

    /// True once nothing is left to answer.
    pub fn is_exhausted(&self) -> bool {
        self.name.is_none() && self.game.is_none() && self.password.is_none()
    }

    /// The bytes to send for `line`, if it is a login prompt we can still answer.
    pub fn respond(&mut self, line: &str) -> Option<Vec<u8>> {
        if LOGIN_NAME.is_match(line) {
            let name = self.name.take()?;
            info!("Answering name prompt");
            Some(format!("{}\r\n", name).into_bytes())
        } else if LOGIN_GAME.is_match(line) {
            let game = self.game.take()?;
            info!(game = %game, "Selecting game");
            Some(game.into_bytes())
        } else if LOGIN_PASSWORD.is_match(line) {
            let password = self.password.take()?;
            info!("Answering password prompt");
            Some(format!("{}\r\n", password).into_bytes())
        } else {
            None
        }
    }
}
