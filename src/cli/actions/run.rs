use crate::cli::actions::{session, Action};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    let output = match action {
        Action::Issue { config, identity } => session::issue(&config, &identity).await?,
        Action::Verify {
            config,
            token,
            refresh,
        } => session::verify(&config, &token, refresh)?,
        Action::Resolve { config, token } => session::resolve(&config, &token).await?,
        Action::Refresh { config, token } => session::refresh(&config, &token).await?,
        Action::Revoke {
            config,
            session_ids,
        } => session::revoke(&config, &session_ids).await?,
    };

    println!("{output}");

    Ok(())
}
