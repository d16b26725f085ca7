pub mod session;

// Internal "interpreter" for `Action`.
mod run;

use crate::{config::IssuerConfig, session::Identity};

#[derive(Debug)]
pub enum Action {
    Issue {
        config: IssuerConfig,
        identity: Identity,
    },
    Verify {
        config: IssuerConfig,
        token: String,
        refresh: bool,
    },
    Resolve {
        config: IssuerConfig,
        token: String,
    },
    Refresh {
        config: IssuerConfig,
        token: String,
    },
    Revoke {
        config: IssuerConfig,
        session_ids: Vec<String>,
    },
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
