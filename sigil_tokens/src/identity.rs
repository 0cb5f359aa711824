//! The seam between the token provider and the identity library
//!
//! An [`IdentityClient`] is the provider's only collaborator. Concrete
//! implementations wrap whatever identity platform library the application
//! uses; the provider never talks to an ambient global instance, only to the
//! client injected at construction.

use std::{convert::Infallible, error};

use async_trait::async_trait;

use crate::{AccessToken, AccountIdRef, ScopeSet};

/// Classification of identity client failures
///
/// An identity library distinguishes failures that can be recovered by
/// putting the user through a visible flow (re-authentication, re-consent)
/// from those that cannot. The token provider branches on this
/// classification when deciding whether to fall back to interaction.
pub trait IdentityError {
    /// Whether this failure can only be resolved by user interaction
    fn requires_interaction(&self) -> bool;
}

impl IdentityError for Infallible {
    fn requires_interaction(&self) -> bool {
        match *self {}
    }
}

/// An asynchronous client for an identity library
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// The error type returned when an acquisition attempt fails
    type Error: IdentityError + error::Error + Send + Sync + 'static;

    /// Requests a token without user interaction, typically served from the
    /// identity library's cached or refreshed session
    ///
    /// Returns `Ok(None)` when the attempt completes but the identity
    /// library produces no token.
    async fn acquire_silent(
        &self,
        account: &AccountIdRef,
        scopes: &ScopeSet,
    ) -> Result<Option<AccessToken>, Self::Error>;

    /// Requests a token through a visible popup surface
    async fn acquire_with_popup(&self, scopes: &ScopeSet)
        -> Result<Option<AccessToken>, Self::Error>;

    /// Initiates a full-page redirect to the identity provider
    ///
    /// No token is produced by this call; the flow resumes in a fresh
    /// execution context after the provider redirects back.
    async fn acquire_with_redirect(&self, scopes: &ScopeSet) -> Result<(), Self::Error>;
}

/// An identity client that always returns the same token silently
///
/// Useful in tests and examples where the two-tier acquisition policy is not
/// the thing being exercised.
#[derive(Clone, Debug)]
pub struct StaticIdentityClient {
    token: AccessToken,
}

impl StaticIdentityClient {
    /// Constructs a client that always serves `token`
    pub fn new(token: impl Into<AccessToken>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl IdentityClient for StaticIdentityClient {
    type Error = Infallible;

    async fn acquire_silent(
        &self,
        _account: &AccountIdRef,
        _scopes: &ScopeSet,
    ) -> Result<Option<AccessToken>, Self::Error> {
        Ok(Some(self.token.clone()))
    }

    async fn acquire_with_popup(
        &self,
        _scopes: &ScopeSet,
    ) -> Result<Option<AccessToken>, Self::Error> {
        Ok(Some(self.token.clone()))
    }

    async fn acquire_with_redirect(&self, _scopes: &ScopeSet) -> Result<(), Self::Error> {
        Ok(())
    }
}
