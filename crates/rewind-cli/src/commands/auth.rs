use super::setup;
use crate::output::Output;
use color_eyre::Result;

/// Run the interactive PIN authorization flow and persist the tokens.
pub async fn run(output: &Output) -> Result<()> {
    let mut client = setup::build_client(output)?;
    client
        .authenticate_interactive()
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Authentication failed: {}", e))?;
    output.success("Authenticated with Trakt, tokens saved");
    Ok(())
}
