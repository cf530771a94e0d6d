//! # Platforms
//!
//! Thin, typed REST clients for the third-party services the site pipeline drives:
//!
//! - **Netlify**: throwaway mockup sites deployed from a zip archive
//! - **Sanity**: project, token and webhook management plus the data mutate API
//! - **Cloudflare**: Pages projects and deployments, zones, DNS records and zone settings
//! - **Email**: Brevo, SendGrid and Resend transactional send endpoints
//! - **DNS over HTTPS**: propagation lookups through a public resolver
//!
//! Every client takes an `api_base` in its configuration so tests can point it at a
//! local mock server.

pub mod cloudflare;
pub mod doh;
pub mod email;
pub mod error;
pub mod http;
pub mod netlify;
pub mod sanity;

pub use cloudflare::{CloudflareClient, CloudflareConfig};
pub use doh::{DnsAnswer, DohResolver, DohResponse};
pub use email::{EmailClient, EmailProvider, OutgoingEmail, SendReceipt};
pub use error::{PlatformError, Result};
pub use netlify::{NetlifyClient, NetlifyConfig, NetlifyDeploy, NetlifySite};
pub use sanity::{SanityClient, SanityConfig, SanityProject, SanityToken};
