use std::time::Duration;

use anyhow::{Result, bail};

use studyhall_assistant_client::AssistantClient;

use crate::config;

pub async fn run(prompt: String) -> Result<()> {
    let prompt = prompt.trim().to_string();
    if prompt.is_empty() {
        bail!("nothing to ask - pass a question, e.g. `studyhall assistant how do I revise?`");
    }

    let cfg = config::load()?;
    let client = AssistantClient::new(cfg.assistant_endpoint(), Duration::from_secs(30))?;
    let reply = client.ask(&prompt).await?;
    println!("{reply}");
    Ok(())
}
