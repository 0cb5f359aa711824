//! Demonstrates the silent-to-interactive fallback against a simulated
//! identity library.
//!
//! Run with `--expired-session` to force the silent attempt to fail with an
//! interaction-required error and watch the provider fall back to the popup
//! flow.

use async_trait::async_trait;
use clap::Parser;
use sigil_tokens::{
    identity::{IdentityClient, IdentityError},
    AccessToken, AccountId, AccountIdRef, Acquisition, InteractionType, ProviderOptions, Scope,
    ScopeSet, TokenProvider,
};

#[derive(Debug, Parser)]
struct Opts {
    /// The signed-in account to acquire a token for
    #[arg(short, long, env, default_value = "user@example.com")]
    account: AccountId,

    /// The scopes to request, space-delimited
    #[arg(short, long, env, value_delimiter = ' ', default_value = "User.Read")]
    scopes: Vec<Scope>,

    /// Simulate an expired session so that silent acquisition requires
    /// interaction
    #[arg(long, env)]
    expired_session: bool,
}

/// A stand-in for a real identity platform library
#[derive(Debug)]
struct SimulatedIdentity {
    expired_session: bool,
}

#[derive(Debug, thiserror::Error)]
enum SimulatedError {
    #[error("the session has expired; the user must sign in again")]
    SessionExpired,
}

impl IdentityError for SimulatedError {
    fn requires_interaction(&self) -> bool {
        matches!(self, SimulatedError::SessionExpired)
    }
}

#[async_trait]
impl IdentityClient for SimulatedIdentity {
    type Error = SimulatedError;

    async fn acquire_silent(
        &self,
        account: &AccountIdRef,
        scopes: &ScopeSet,
    ) -> Result<Option<AccessToken>, Self::Error> {
        if self.expired_session {
            return Err(SimulatedError::SessionExpired);
        }

        tracing::info!(%account, %scopes, "issuing token from cached session");
        Ok(Some(AccessToken::from("token-from-cached-session")))
    }

    async fn acquire_with_popup(
        &self,
        scopes: &ScopeSet,
    ) -> Result<Option<AccessToken>, Self::Error> {
        tracing::info!(%scopes, "user signed in through the popup surface");
        Ok(Some(AccessToken::from("token-from-popup")))
    }

    async fn acquire_with_redirect(&self, scopes: &ScopeSet) -> Result<(), Self::Error> {
        tracing::info!(%scopes, "navigating away to the identity provider");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();

    let options = ProviderOptions {
        account: opts.account,
        scopes: opts.scopes.into_iter().collect(),
        interaction_type: InteractionType::Popup,
    };

    let identity = SimulatedIdentity {
        expired_session: opts.expired_session,
    };

    let provider = TokenProvider::new(identity, options);

    match provider.acquire_token().await? {
        Acquisition::Token(token) => {
            tracing::info!(token = format_args!("{:#?}", token), "acquired access token");
        }
        Acquisition::RedirectInitiated => {
            tracing::info!("redirect initiated; the flow resumes after navigation");
        }
    }

    Ok(())
}
