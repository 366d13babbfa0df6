pub mod chain;
pub mod error;
pub mod identity;
pub mod session;

pub use chain::{AuthChain, XboxUserToken};
pub use error::{AuthError, AuthStep};
pub use identity::{
    CachedLogin, DeviceCodePrompt, IdentityProvider, IdentityToken, MsaDeviceCodeProvider,
    PromptFn, TokenCache,
};
pub use session::{AuthHandle, LaunchAuth, MinecraftProfile};
