//! The live collection sync engine: view models materializing gateway
//! snapshots, panel controllers owning subscription lifecycles, and the
//! process-wide session/identity context.

mod crypto;
pub mod local_auth;
pub mod panel;
pub mod session;
pub mod view;

pub use local_auth::LocalIdentityProvider;
pub use panel::{Panel, PanelChange, PanelError, PanelState};
pub use session::{AuthError, Identity, IdentityProvider, SessionContext, SessionState};
pub use view::LiveView;
