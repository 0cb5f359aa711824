//! Silent-first access token acquisition with an interactive fallback
//!
//! This library provides a small token provider that sits between an API
//! client and an identity library. Before each outbound API call, the
//! provider asks the identity library for a credential without involving the
//! user. When the identity library reports that user interaction is required,
//! the provider falls back to the configured interactive flow: a popup
//! surface or a full-page redirect.
//!
//! The provider deliberately holds no token state of its own. Every call to
//! [`TokenProvider::acquire_token`] issues a fresh request to the identity
//! library, which remains the sole owner of token caching, refresh, and
//! session storage. Concurrent acquisitions are likewise not coalesced here;
//! deduplicating in-flight requests is the identity library's concern.
//!
//! The identity library itself is abstracted behind the
//! [`IdentityClient`][identity::IdentityClient] trait and injected at
//! construction, so there is no ambient global client instance.
//!
//! ```
//! use sigil_tokens::{
//!     identity::StaticIdentityClient, AccountId, Acquisition, InteractionType,
//!     ProviderOptions, Scope, TokenProvider,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")] async fn main() {
//! let options = ProviderOptions {
//!     account: AccountId::from_static("user@example.com"),
//!     scopes: [Scope::from_static("User.Read")].into_iter().collect(),
//!     interaction_type: InteractionType::Popup,
//! };
//!
//! let provider = TokenProvider::new(StaticIdentityClient::new("a-token"), options);
//!
//! match provider.acquire_token().await.unwrap() {
//!     Acquisition::Token(token) => assert_eq!(token.as_str(), "a-token"),
//!     Acquisition::RedirectInitiated => unreachable!("no redirect was configured"),
//! }
//! # }
//! ```
//!
//! The `sigil_reqwest` companion crate wires a provider into a
//! `reqwest` middleware stack so that an `Authorization` header is attached
//! to each outbound request.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod braids;
mod error;
pub mod identity;
mod provider;
pub mod scope;

pub use braids::*;
pub use error::AcquisitionError;
pub use provider::{Acquisition, InteractionType, ProviderOptions, TokenProvider};
pub use scope::ScopeSet;
