use super::{AssetId, Outcome};
use crate::error::{Error, Result};

/// Binary market, identified by its pair of outcome tokens.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Market {
    yes_token: AssetId,
    no_token: AssetId,
}

impl Market {
    /// Validates the token pair: tokens must be distinct and neither can
    /// be the settlement asset.
    pub fn new(yes_token: AssetId, no_token: AssetId) -> Result<Self> {
        if yes_token == no_token {
            return Err(Error::InvalidMarket(format!(
                "yes and no tokens are the same: {yes_token}"
            )));
        }
        if yes_token.is_settlement() || no_token.is_settlement() {
            return Err(Error::InvalidMarket(
                "outcome token can not be the settlement asset".to_string(),
            ));
        }
        if yes_token.as_str().is_empty() || no_token.as_str().is_empty() {
            return Err(Error::InvalidMarket("empty outcome token".to_string()));
        }
        Ok(Self {
            yes_token,
            no_token,
        })
    }

    pub fn yes_token(&self) -> &AssetId {
        &self.yes_token
    }

    pub fn no_token(&self) -> &AssetId {
        &self.no_token
    }

    /// Outcome tokens in canonical processing order.
    pub fn tokens(&self) -> [(Outcome, &AssetId); 2] {
        [
            (Outcome::Yes, &self.yes_token),
            (Outcome::No, &self.no_token),
        ]
    }

    pub fn outcome_of(&self, asset: &AssetId) -> Option<Outcome> {
        if *asset == self.yes_token {
            Some(Outcome::Yes)
        } else if *asset == self.no_token {
            Some(Outcome::No)
        } else {
            None
        }
    }
}
