//! Sitelens Checks - Built-in website quality/SEO validation checks.
//!
//! Each module implements one check against the [`sitelens_check::Check`]
//! contract. Checks acquire their own [`sitelens_fetch::Fetcher`] per run,
//! keep their concurrency caps to themselves, and convert every internal
//! failure into a verdict at their own boundary.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod banner_links;
pub mod breadcrumbs;
pub mod broken_images;
pub mod broken_links;
pub mod favicon;
pub mod fontawesome;
pub mod footer_lazy_load;
pub mod http_status;
pub mod lateral_scroll;
pub mod page;
pub mod ssl_certificate;
pub mod url_h1_coherence;
pub mod viewport;
pub mod w3c;

use sitelens_check::{CheckDescriptor, CheckFactory, CheckParam};
use sitelens_core::CheckId;
use std::sync::Arc;

// Built-in check IDs are static literals validated at construction.
pub(crate) fn descriptor_for(id: &str, params: &[CheckParam]) -> CheckDescriptor {
    CheckDescriptor::new(CheckId::new(id).expect("static check id"), params.to_vec())
}

/// The built-in check set, as factories for the registry.
///
/// Ordering here has no meaning; the registry indexes by ID and the
/// orchestrator dispatches concurrently.
#[must_use]
pub fn builtin_checks() -> Vec<CheckFactory> {
    vec![
        Box::new(|cfg| Ok(Arc::new(http_status::HttpStatusCheck::new(cfg)))),
        Box::new(|cfg| Ok(Arc::new(ssl_certificate::SslCertificateCheck::new(cfg)))),
        Box::new(|cfg| Ok(Arc::new(broken_links::BrokenLinksCheck::new(cfg)))),
        Box::new(|cfg| Ok(Arc::new(broken_images::BrokenImagesCheck::new(cfg)))),
        Box::new(|cfg| Ok(Arc::new(favicon::FaviconCheck::new(cfg)))),
        Box::new(|cfg| Ok(Arc::new(fontawesome::FontAwesomeCheck::new(cfg)))),
        Box::new(|cfg| Ok(Arc::new(viewport::ViewportCheck::new(cfg)))),
        Box::new(|cfg| Ok(Arc::new(footer_lazy_load::FooterLazyLoadCheck::new(cfg)))),
        Box::new(|cfg| Ok(Arc::new(banner_links::BannerLinksCheck::new(cfg)))),
        Box::new(|cfg| Ok(Arc::new(breadcrumbs::BreadcrumbsCheck::new(cfg)))),
        Box::new(|cfg| Ok(Arc::new(url_h1_coherence::UrlH1CoherenceCheck::new(cfg)))),
        Box::new(|cfg| Ok(Arc::new(w3c::W3cHtmlCheck::new(cfg)))),
        Box::new(|cfg| Ok(Arc::new(w3c::W3cCssCheck::new(cfg)))),
        Box::new(|cfg| Ok(Arc::new(lateral_scroll::LateralScrollCheck::new(cfg)))),
    ]
}
