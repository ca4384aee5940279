//! First-party origins that skip approval where a handler allows it.

use crate::handler::RequestContext;
use wb_01_transport::ConnectionKind;

#[derive(Debug, Clone, Default)]
pub struct TrustedOrigins {
    domains: Vec<String>,
}

impl TrustedOrigins {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains
                .into_iter()
                .map(|d| d.into().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Exact domain or any subdomain of a listed domain.
    pub fn is_trusted_domain(&self, domain: &str) -> bool {
        let domain = domain.to_ascii_lowercase();
        self.domains.iter().any(|trusted| {
            domain == *trusted
                || domain
                    .strip_suffix(trusted.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// dApp request from a trusted first-party site.
    pub fn is_trusted(&self, ctx: &RequestContext) -> bool {
        ctx.kind == ConnectionKind::DApp && ctx.domain().is_some_and(|d| self.is_trusted_domain(d))
    }
}
