//! Middleware to authorize outgoing requests through a token provider
//!
//! When using [`ClientWithMiddleware`](reqwest_middleware::ClientWithMiddleware),
//! include a [`TokenProviderMiddleware`] in the middleware stack to acquire a
//! bearer token through a [`TokenProvider`] for each outbound request. The
//! provider runs its full silent-first acquisition policy per request; no
//! token is reused across requests by the middleware itself.
//!
//! If a request already carries an `Authorization` header by the time the
//! middleware executes, the existing value is left in place, allowing
//! per-request overrides.
//!
//! ```
//! use std::sync::Arc;
//!
//! use reqwest::Client;
//! use reqwest_middleware::ClientBuilder;
//! use sigil_reqwest::TokenProviderMiddleware;
//! use sigil_tokens::{
//!     identity::StaticIdentityClient, AccountId, InteractionType, ProviderOptions, Scope,
//!     TokenProvider,
//! };
//!
//! let provider = Arc::new(TokenProvider::new(
//!     StaticIdentityClient::new("token"),
//!     ProviderOptions {
//!         account: AccountId::from_static("user@example.com"),
//!         scopes: [Scope::from_static("User.Read")].into_iter().collect(),
//!         interaction_type: InteractionType::Popup,
//!     },
//! ));
//!
//! let client = ClientBuilder::new(Client::default())
//!     .with(TokenProviderMiddleware::new(provider))
//!     .build();
//! ```
//!
//! The middleware can be configured to attach a token only conditionally,
//! which is useful when one middleware stack serves multiple backends.
//! Predicates compose through [`predicates::prelude::PredicateBooleanExt`]:
//!
//! ```
//! # use std::sync::Arc;
//! use predicates::prelude::PredicateBooleanExt;
//! use sigil_reqwest::{ExactHostMatch, HttpsOnly, TokenProviderMiddleware};
//! # use sigil_tokens::{
//! #     identity::StaticIdentityClient, AccountId, InteractionType, ProviderOptions, Scope,
//! #     TokenProvider,
//! # };
//! # let provider = Arc::new(TokenProvider::new(
//! #     StaticIdentityClient::new("token"),
//! #     ProviderOptions {
//! #         account: AccountId::from_static("user@example.com"),
//! #         scopes: [Scope::from_static("User.Read")].into_iter().collect(),
//! #         interaction_type: InteractionType::Popup,
//! #     },
//! # ));
//!
//! TokenProviderMiddleware::new(provider)
//!     .with_predicate(HttpsOnly.and(ExactHostMatch::new("example.com")));
//! ```

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

use std::{fmt, sync::Arc};

use bytes::{BufMut, BytesMut};
use predicates::{prelude::*, reflection};
use reqwest::{header, Request, Response};
use reqwest_middleware::{Error, Middleware, Next, Result};
use sigil_tokens::{identity::IdentityClient, Acquisition, TokenProvider};

/// A middleware that acquires and attaches a bearer token per outgoing
/// request
#[derive(Clone, Debug)]
pub struct TokenProviderMiddleware<I, P> {
    provider: Arc<TokenProvider<I>>,
    predicate: P,
}

/// The provider initiated a redirect flow, so the request has no credential
#[derive(Clone, Copy, Debug, thiserror::Error)]
#[error("an interactive redirect was initiated; no bearer token is available for this request")]
pub struct RedirectPending;

impl<I> TokenProviderMiddleware<I, HttpsOnly> {
    /// Constructs a new middleware from a token provider
    ///
    /// By default, the middleware only attaches a token when the request is
    /// being sent via HTTPS. Provide a custom predicate with
    /// [`with_predicate()`][Self::with_predicate()] to change that.
    pub fn new(provider: Arc<TokenProvider<I>>) -> Self {
        Self {
            provider,
            predicate: HttpsOnly,
        }
    }

    /// Replaces the default predicate with a custom predicate
    pub fn with_predicate<P>(self, predicate: P) -> TokenProviderMiddleware<I, P> {
        TokenProviderMiddleware {
            provider: self.provider,
            predicate,
        }
    }
}

impl<I, P> TokenProviderMiddleware<I, P>
where
    I: IdentityClient,
{
    async fn bearer_header(&self) -> Result<header::HeaderValue> {
        let token = match self.provider.acquire_token().await.map_err(Error::middleware)? {
            Acquisition::Token(token) => token,
            Acquisition::RedirectInitiated => return Err(Error::middleware(RedirectPending)),
        };

        tracing::trace!("acquired bearer token for outbound request");

        let mut header_value = BytesMut::with_capacity(token.as_str().len() + 7);
        header_value.put_slice(b"Bearer ");
        header_value.put_slice(token.as_str().as_bytes());
        let mut value =
            header::HeaderValue::from_maybe_shared(header_value.freeze()).map_err(Error::middleware)?;
        value.set_sensitive(true);
        Ok(value)
    }
}

#[async_trait::async_trait]
impl<I, P> Middleware for TokenProviderMiddleware<I, P>
where
    I: IdentityClient + 'static,
    P: Predicate<Request> + Send + Sync + 'static,
{
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        if self.predicate.eval(&req) && !req.headers().contains_key(header::AUTHORIZATION) {
            let value = self.bearer_header().await?;
            req.headers_mut().insert(header::AUTHORIZATION, value);
        }

        next.run(req, extensions).await
    }
}

/// Only attach a token if the request is being sent over HTTPS
#[derive(Clone, Copy, Debug)]
pub struct HttpsOnly;

impl Predicate<Request> for HttpsOnly {
    #[inline]
    fn eval(&self, req: &Request) -> bool {
        req.url().scheme() == "https"
    }

    fn find_case(&self, expected: bool, req: &Request) -> Option<reflection::Case> {
        let result = self.eval(req);
        if result != expected {
            Some(
                reflection::Case::new(Some(self), result).add_product(reflection::Product::new(
                    "scheme",
                    req.url().scheme().to_owned(),
                )),
            )
        } else {
            None
        }
    }
}

impl reflection::PredicateReflection for HttpsOnly {}
impl fmt::Display for HttpsOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("scheme is https")
    }
}

/// Only attach a token if the request is being sent to the exact host
/// specified
#[derive(Clone, Debug)]
pub struct ExactHostMatch {
    host: String,
}

impl ExactHostMatch {
    /// Constructs a new predicate from a host string
    pub fn new<S>(host: S) -> Self
    where
        S: Into<String>,
    {
        Self { host: host.into() }
    }
}

impl Predicate<Request> for ExactHostMatch {
    #[inline]
    fn eval(&self, req: &Request) -> bool {
        req.url().host_str() == Some(&self.host)
    }

    fn find_case(&self, expected: bool, req: &Request) -> Option<reflection::Case> {
        let result = self.eval(req);
        if result != expected {
            Some(
                reflection::Case::new(Some(self), result).add_product(reflection::Product::new(
                    "host",
                    req.url()
                        .host_str()
                        .unwrap_or("<value not valid utf-8>")
                        .to_owned(),
                )),
            )
        } else {
            None
        }
    }
}

impl reflection::PredicateReflection for ExactHostMatch {}
impl fmt::Display for ExactHostMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("host == ")?;
        f.write_str(&self.host)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use reqwest::Client;
    use reqwest_middleware::ClientBuilder;
    use sigil_tokens::{
        identity::{IdentityError, StaticIdentityClient},
        AccessToken, AccountId, AccountIdRef, InteractionType, ProviderOptions, Scope, ScopeSet,
    };

    use super::*;

    const TEST_TOKEN: &str = "this-is-a-test-token";
    const BEARER_TEST_TOKEN: &str = "Bearer this-is-a-test-token";

    fn provider_options(interaction_type: InteractionType) -> ProviderOptions {
        ProviderOptions {
            account: AccountId::from_static("user@example.com"),
            scopes: [Scope::from_static("User.Read")].into_iter().collect(),
            interaction_type,
        }
    }

    fn static_middleware() -> TokenProviderMiddleware<StaticIdentityClient, HttpsOnly> {
        let provider = Arc::new(TokenProvider::new(
            StaticIdentityClient::new(TEST_TOKEN),
            provider_options(InteractionType::Popup),
        ));

        TokenProviderMiddleware::new(provider)
    }

    struct AuthChecker {
        expected_authorization: String,
        checked: AtomicBool,
    }

    impl AuthChecker {
        pub fn new(expected: impl Into<String>) -> Self {
            Self {
                expected_authorization: expected.into(),
                checked: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl Middleware for AuthChecker {
        async fn handle(
            &self,
            req: Request,
            _: &mut http::Extensions,
            _: Next<'_>,
        ) -> Result<Response> {
            let authorization_header = req
                .headers()
                .get(header::AUTHORIZATION)
                .expect("no authorization header")
                .to_str()
                .expect("authorization header was not valid UTF-8");

            assert_eq!(authorization_header, self.expected_authorization);
            self.checked.store(true, Ordering::Release);

            Ok(http::Response::<&[u8]>::default().into())
        }
    }

    #[derive(Default)]
    struct NoAuthChecker {
        checked: AtomicBool,
    }

    #[async_trait]
    impl Middleware for NoAuthChecker {
        async fn handle(
            &self,
            req: Request,
            _: &mut http::Extensions,
            _: Next<'_>,
        ) -> Result<Response> {
            assert_eq!(req.headers().get(header::AUTHORIZATION), None);
            self.checked.store(true, Ordering::Release);

            Ok(http::Response::<&[u8]>::default().into())
        }
    }

    mod when_request_does_not_have_an_authorization_header {
        use super::*;

        #[tokio::test]
        async fn middleware_with_defaults_attaches_token_on_https_request() {
            let auth_checker = Arc::new(AuthChecker::new(BEARER_TEST_TOKEN));

            let client = ClientBuilder::new(Client::default())
                .with(static_middleware())
                .with_arc(auth_checker.clone())
                .build();

            let resp = client.get("https://example.com").send().await.unwrap();

            assert_eq!(resp.status(), http::StatusCode::OK);
            assert!(auth_checker.checked.load(Ordering::Acquire));
        }

        #[tokio::test]
        async fn middleware_with_defaults_ignores_http_request() {
            let auth_checker = Arc::new(NoAuthChecker::default());

            let client = ClientBuilder::new(Client::default())
                .with(static_middleware())
                .with_arc(auth_checker.clone())
                .build();

            let resp = client.get("http://example.com").send().await.unwrap();

            assert_eq!(resp.status(), http::StatusCode::OK);
            assert!(auth_checker.checked.load(Ordering::Acquire));
        }

        mod and_predicate_evaluates_to_ignore {
            use super::*;

            #[tokio::test]
            async fn middleware_does_not_attach_a_token() {
                let middleware = static_middleware().with_predicate(predicate::never());
                let auth_checker = Arc::new(NoAuthChecker::default());

                let client = ClientBuilder::new(Client::default())
                    .with(middleware)
                    .with_arc(auth_checker.clone())
                    .build();

                let resp = client.get("https://example.com").send().await.unwrap();

                assert_eq!(resp.status(), http::StatusCode::OK);
                assert!(auth_checker.checked.load(Ordering::Acquire));
            }
        }
    }

    mod when_request_already_contains_an_authorization_header {
        use super::*;

        #[tokio::test]
        async fn middleware_does_not_attach_a_token() {
            const OVERRIDE_TOKEN: &str = "overridden!";
            // Reqwest uses a capital `B` bearer
            const BEARER_OVERRIDE_TOKEN: &str = "Bearer overridden!";

            let auth_checker = Arc::new(AuthChecker::new(BEARER_OVERRIDE_TOKEN));

            let client = ClientBuilder::new(Client::default())
                .with(static_middleware())
                .with_arc(auth_checker.clone())
                .build();

            let resp = client
                .get("https://example.com")
                .bearer_auth(OVERRIDE_TOKEN)
                .send()
                .await
                .unwrap();

            assert_eq!(resp.status(), http::StatusCode::OK);
            assert!(auth_checker.checked.load(Ordering::Acquire));
        }
    }

    mod when_the_provider_cannot_produce_a_token {
        use super::*;

        #[derive(Debug, thiserror::Error)]
        enum FailingError {
            #[error("interaction required")]
            InteractionRequired,
            #[error("identity authority unreachable")]
            AuthorityUnreachable,
        }

        impl IdentityError for FailingError {
            fn requires_interaction(&self) -> bool {
                matches!(self, FailingError::InteractionRequired)
            }
        }

        /// Fails every silent attempt; the redirect flow "succeeds" by
        /// navigating away
        struct FailingIdentity {
            requires_interaction: bool,
        }

        #[async_trait]
        impl IdentityClient for FailingIdentity {
            type Error = FailingError;

            async fn acquire_silent(
                &self,
                _account: &AccountIdRef,
                _scopes: &ScopeSet,
            ) -> std::result::Result<Option<AccessToken>, Self::Error> {
                if self.requires_interaction {
                    Err(FailingError::InteractionRequired)
                } else {
                    Err(FailingError::AuthorityUnreachable)
                }
            }

            async fn acquire_with_popup(
                &self,
                _scopes: &ScopeSet,
            ) -> std::result::Result<Option<AccessToken>, Self::Error> {
                Err(FailingError::AuthorityUnreachable)
            }

            async fn acquire_with_redirect(
                &self,
                _scopes: &ScopeSet,
            ) -> std::result::Result<(), Self::Error> {
                Ok(())
            }
        }

        fn failing_middleware(
            requires_interaction: bool,
            interaction_type: InteractionType,
        ) -> TokenProviderMiddleware<FailingIdentity, HttpsOnly> {
            let provider = Arc::new(TokenProvider::new(
                FailingIdentity {
                    requires_interaction,
                },
                provider_options(interaction_type),
            ));

            TokenProviderMiddleware::new(provider)
        }

        #[tokio::test]
        async fn a_silent_failure_fails_the_request() {
            let client = ClientBuilder::new(Client::default())
                .with(failing_middleware(false, InteractionType::Popup))
                .with_arc(Arc::new(NoAuthChecker::default()))
                .build();

            let error = client.get("https://example.com").send().await.unwrap_err();

            assert!(matches!(error, Error::Middleware(_)));
        }

        #[tokio::test]
        async fn an_initiated_redirect_fails_the_request() {
            let client = ClientBuilder::new(Client::default())
                .with(failing_middleware(true, InteractionType::Redirect))
                .with_arc(Arc::new(NoAuthChecker::default()))
                .build();

            let error = client.get("https://example.com").send().await.unwrap_err();

            let Error::Middleware(inner) = error else {
                panic!("expected a middleware error");
            };
            assert!(inner.is::<RedirectPending>());
        }
    }
}
