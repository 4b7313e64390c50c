use anyhow::{Context, Result, bail};

use studyhall_core::{CollectionPath, Document};
use studyhall_gateway::{SqliteBackend, SqliteGateway};
use studyhall_sync::{Identity, LocalIdentityProvider, Panel, SessionContext};

use crate::config::{self, CliConfig};

/// Everything a command needs: config, the local store, and the resolved
/// session.
pub struct App {
    pub config: CliConfig,
    backend: SqliteBackend,
    pub session: SessionContext<LocalIdentityProvider>,
}

impl App {
    pub async fn load() -> Result<Self> {
        let config = config::load()?;
        let data_dir = config.data_dir()?;

        let backend = SqliteBackend::open(&data_dir.join("studyhall.db"))
            .context("opening local record store")?;
        let provider = LocalIdentityProvider::open(data_dir.join("users.json"))
            .context("opening local user store")?;

        let session = SessionContext::new(provider);
        session
            .init()
            .await
            .map_err(|e| anyhow::anyhow!("resolving session: {e}"))?;

        Ok(Self {
            config,
            backend,
            session,
        })
    }

    pub fn identity(&self) -> Result<Identity> {
        self.session
            .identity()
            .context("session not resolved")
    }

    /// Identity for data commands. Anonymous CLI identities do not outlive
    /// the process, so everything that persists records requires an account.
    pub fn require_account(&self) -> Result<Identity> {
        let identity = self.identity()?;
        if !identity.registered {
            bail!(
                "not signed in - run `studyhall account register` or `studyhall account login` first"
            );
        }
        Ok(identity)
    }

    pub fn gateway_for(&self, identity: &Identity) -> SqliteGateway {
        self.backend.connect(identity.uid.clone())
    }

    /// Mount a panel on `path` and wait for its first snapshot.
    pub async fn open_panel<T: Document>(
        &self,
        identity: &Identity,
        path: CollectionPath,
    ) -> Result<Panel<T, SqliteGateway>> {
        let mut panel = Panel::new(self.gateway_for(identity), path);
        panel.mount();
        panel
            .wait_live()
            .await
            .with_context(|| format!("subscribing to {}", panel.path()))?;
        Ok(panel)
    }
}

/// Shorten an opaque record id for display.
pub fn short_id(id: &str) -> &str {
    &id[..id.len().min(8)]
}

/// Resolve a user-supplied (possibly shortened) id against a list of ids.
pub fn resolve_id<'a>(ids: impl Iterator<Item = &'a str>, needle: &str) -> Result<String> {
    let matches: Vec<&str> = ids.filter(|id| id.starts_with(needle)).collect();
    match matches.as_slice() {
        [] => bail!("no record matches id '{needle}'"),
        [id] => Ok((*id).to_string()),
        _ => bail!("id '{needle}' is ambiguous ({} matches)", matches.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_ids_truncate_safely() {
        assert_eq!(short_id("abcdefghij"), "abcdefgh");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn prefix_resolution() {
        let ids = ["alpha-1", "alpha-2", "beta-1"];
        assert_eq!(
            resolve_id(ids.iter().copied(), "beta").unwrap(),
            "beta-1"
        );
        assert!(resolve_id(ids.iter().copied(), "alpha").is_err());
        assert!(resolve_id(ids.iter().copied(), "gamma").is_err());
    }
}
