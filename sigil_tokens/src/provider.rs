use std::error;

use serde::{Deserialize, Serialize};

use crate::{
    identity::{IdentityClient, IdentityError},
    AccessToken, AccountId, AcquisitionError, ScopeSet,
};

/// The user-facing flow used when silent acquisition requires interaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    /// Acquire the token through a separate popup surface
    Popup,
    /// Acquire the token through a full-page redirect to the identity
    /// provider
    Redirect,
}

/// Configuration captured by a token provider at construction
///
/// Options are immutable once the provider owns them; there is no way to
/// retarget a provider at a different account or scope set after the fact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOptions {
    /// The signed-in account to acquire tokens for
    pub account: AccountId,
    /// The scopes to request, in order
    pub scopes: ScopeSet,
    /// The fallback flow to use when interaction is required
    pub interaction_type: InteractionType,
}

/// The outcome of a successful acquisition call
#[derive(Debug)]
pub enum Acquisition {
    /// A non-empty bearer token, issued for exactly the configured account
    /// and scope set
    Token(AccessToken),
    /// A redirect flow was initiated; no token will be issued within this
    /// process lifetime
    ///
    /// The flow resumes in a fresh execution context once the identity
    /// provider redirects back.
    RedirectInitiated,
}

impl Acquisition {
    /// The acquired token, if the call produced one
    pub fn into_token(self) -> Option<AccessToken> {
        match self {
            Acquisition::Token(token) => Some(token),
            Acquisition::RedirectInitiated => None,
        }
    }
}

/// A token provider with a two-tier acquisition policy
///
/// Each call to [`acquire_token()`][Self::acquire_token] first attempts
/// silent acquisition against the injected identity client. When the client
/// reports that interaction is required, the provider falls back to the
/// configured interactive flow with the same scopes. Any other silent
/// failure is returned to the caller unrecovered.
///
/// The provider holds no token state: tokens are never cached across calls,
/// and concurrent calls are not coalesced. Both remain the identity
/// library's responsibility.
#[derive(Clone, Debug)]
pub struct TokenProvider<I> {
    identity: I,
    options: ProviderOptions,
}

impl<I> TokenProvider<I> {
    /// Constructs a provider from an identity client and options
    pub fn new(identity: I, options: ProviderOptions) -> Self {
        Self { identity, options }
    }

    /// The options this provider was constructed with
    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }
}

impl<I: IdentityClient> TokenProvider<I> {
    /// Acquires a bearer token for the configured account and scopes
    ///
    /// This suspends on at most two identity library calls: the silent
    /// attempt, then conditionally one interactive attempt. A popup flow can
    /// suspend indefinitely while it waits on the user; no timeout is
    /// imposed here.
    #[tracing::instrument(
        err,
        skip(self),
        fields(
            account = %self.options.account,
            scopes = %self.options.scopes,
            interaction = ?self.options.interaction_type,
        ),
    )]
    pub async fn acquire_token(&self) -> Result<Acquisition, AcquisitionError<I::Error>> {
        tracing::trace!("attempting silent token acquisition");

        match self
            .identity
            .acquire_silent(&self.options.account, &self.options.scopes)
            .await
        {
            Ok(Some(token)) => {
                tracing::debug!("silent acquisition produced a token");
                Ok(Acquisition::Token(token))
            }
            Ok(None) => {
                tracing::warn!("silent acquisition completed without a token");
                Err(AcquisitionError::NoTokenReturned)
            }
            Err(error) if error.requires_interaction() => {
                tracing::debug!(
                    error = (&error as &dyn error::Error),
                    "interaction required, falling back to interactive acquisition"
                );
                self.acquire_interactive().await
            }
            Err(error) => Err(AcquisitionError::Silent(error)),
        }
    }

    async fn acquire_interactive(&self) -> Result<Acquisition, AcquisitionError<I::Error>> {
        match self.options.interaction_type {
            InteractionType::Popup => {
                match self.identity.acquire_with_popup(&self.options.scopes).await {
                    Ok(Some(token)) => {
                        tracing::debug!("popup acquisition produced a token");
                        Ok(Acquisition::Token(token))
                    }
                    Ok(None) => {
                        tracing::warn!("popup acquisition completed without a token");
                        Err(AcquisitionError::NoTokenReturned)
                    }
                    Err(error) => Err(AcquisitionError::Interactive(error)),
                }
            }
            InteractionType::Redirect => {
                self.identity
                    .acquire_with_redirect(&self.options.scopes)
                    .await
                    .map_err(AcquisitionError::Interactive)?;

                tracing::debug!("redirect flow initiated, no token in this process lifetime");
                Ok(Acquisition::RedirectInitiated)
            }
        }
    }
}
