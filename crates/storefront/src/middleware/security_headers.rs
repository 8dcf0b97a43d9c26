//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Adds restrictive security headers to all responses. The storefront ships
//! no client-side JavaScript, so the CSP carries no script allowance at all;
//! `img-src` is widened at startup for the WooCommerce media origin and, when
//! the Meta pixel is configured, for the pixel's image endpoint.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};
use url::Url;

use crate::config::StorefrontConfig;

/// Pre-built per-deployment header values.
#[derive(Clone)]
pub struct SecurityHeaders {
    csp: HeaderValue,
}

impl SecurityHeaders {
    /// Build the header set from configuration.
    #[must_use]
    pub fn from_config(config: &StorefrontConfig) -> Self {
        let csp = build_csp(
            &config.woo.base_url,
            config.analytics.meta_pixel_id.is_some(),
        );

        Self {
            csp: HeaderValue::from_str(&csp)
                .unwrap_or_else(|_| HeaderValue::from_static("default-src 'none'")),
        }
    }
}

/// The content security policy, widened only for image origins we render.
fn build_csp(woo_base_url: &str, meta_pixel: bool) -> String {
    let mut img_src = String::from("'self'");
    if let Some(origin) = origin_of(woo_base_url) {
        img_src.push(' ');
        img_src.push_str(&origin);
    }
    if meta_pixel {
        // The no-JavaScript pixel is a plain <img> to facebook.com
        img_src.push_str(" https://www.facebook.com");
    }

    format!(
        "default-src 'none'; \
         style-src 'self'; \
         font-src 'self'; \
         img-src {img_src}; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'; \
         upgrade-insecure-requests"
    )
}

/// Scheme + host (+ port) of a URL, e.g. `https://shop.example.com`.
fn origin_of(base_url: &str) -> Option<String> {
    let url = Url::parse(base_url).ok()?;
    url.host_str()?;
    Some(url.origin().ascii_serialization())
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: no-referrer` - Zero referrer leakage
/// - `Content-Security-Policy` - Built at startup, see [`SecurityHeaders`]
/// - `Permissions-Policy` - Deny all sensitive features
/// - `Cache-Control: no-store, max-age=0` - Prevent caching sessioned pages
/// - `Cross-Origin-Opener-Policy: same-origin` - Process isolation
/// - `Cross-Origin-Resource-Policy: same-origin` - Resource isolation
/// - `Cross-Origin-Embedder-Policy: credentialless` - Isolation that still
///   allows product images from WordPress media, which sets no CORP headers
/// - `X-DNS-Prefetch-Control: off` - Prevent DNS prefetch leakage
pub async fn security_headers_middleware(
    State(security): State<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    // Prevent clickjacking
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    // Prevent MIME sniffing
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

    // Zero referrer leakage (stricter than same-origin)
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    headers.insert(CONTENT_SECURITY_POLICY, security.csp.clone());

    // Strict Permissions Policy - deny all sensitive features
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             ambient-light-sensor=(), \
             autoplay=(), \
             battery=(), \
             browsing-topics=(), \
             camera=(), \
             display-capture=(), \
             document-domain=(), \
             encrypted-media=(), \
             fullscreen=(), \
             geolocation=(), \
             gyroscope=(), \
             hid=(), \
             idle-detection=(), \
             interest-cohort=(), \
             magnetometer=(), \
             microphone=(), \
             midi=(), \
             payment=(), \
             picture-in-picture=(), \
             publickey-credentials-get=(), \
             screen-wake-lock=(), \
             serial=(), \
             sync-xhr=(), \
             usb=(), \
             web-share=(), \
             xr-spatial-tracking=()",
        ),
    );

    // Prevent caching of sessioned responses
    headers.insert(
        HeaderName::from_static("cache-control"),
        HeaderValue::from_static("no-store, max-age=0"),
    );

    // Cross-Origin policies for additional isolation
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );

    // credentialless rather than require-corp: WordPress media sends no
    // CORP headers and require-corp would blank every product image
    headers.insert(
        HeaderName::from_static("cross-origin-embedder-policy"),
        HeaderValue::from_static("credentialless"),
    );

    // Prevent DNS prefetching to avoid leaking which links user hovers over
    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_includes_woo_media_origin() {
        let csp = build_csp("https://shop.makrama.pl", false);
        assert!(csp.contains("img-src 'self' https://shop.makrama.pl;"));
        assert!(!csp.contains("facebook"));
        assert!(!csp.contains("script-src"));
    }

    #[test]
    fn test_csp_adds_pixel_host_when_configured() {
        let csp = build_csp("https://shop.makrama.pl", true);
        assert!(csp.contains("https://shop.makrama.pl https://www.facebook.com"));
    }

    #[test]
    fn test_origin_of_strips_path_and_keeps_port() {
        assert_eq!(
            origin_of("https://shop.example.com/wp-json").as_deref(),
            Some("https://shop.example.com")
        );
        assert_eq!(
            origin_of("http://localhost:8080").as_deref(),
            Some("http://localhost:8080")
        );
        assert_eq!(origin_of("not a url"), None);
    }
}
