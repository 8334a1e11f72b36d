//! Response-header helpers: integer accessor and content-security patching.

use url::Url;

/// One response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Value of header `name` parsed as an unsigned integer.
///
/// `None` when the header is missing or its value is not numeric; callers
/// treat that as "absent" and skip their update.
pub fn int_header_value(headers: &[Header], name: &str) -> Option<u64> {
    headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case(name))
        .and_then(|header| header.value.trim().parse().ok())
}

/// Rewrites any `content-security-policy` header so the page will accept
/// images served from `proxy_url`'s origin. Other headers pass through
/// untouched, as does everything when the proxy URL does not parse.
pub fn patch_content_security(headers: Vec<Header>, proxy_url: &str) -> Vec<Header> {
    let Some(origin) = proxy_origin(proxy_url) else {
        return headers;
    };
    headers
        .into_iter()
        .map(|header| {
            if header.name.eq_ignore_ascii_case("content-security-policy") {
                Header {
                    value: allow_origin(&header.value, &origin),
                    ..header
                }
            } else {
                header
            }
        })
        .collect()
}

fn proxy_origin(proxy_url: &str) -> Option<String> {
    let parsed = Url::parse(proxy_url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}://{host}:{port}", parsed.scheme()),
        None => format!("{}://{host}", parsed.scheme()),
    })
}

/// Appends `origin` to the `img-src` directive, falling back to
/// `default-src` when the policy has no `img-src`. A policy with neither
/// directive already admits images from anywhere.
fn allow_origin(policy: &str, origin: &str) -> String {
    let mut directives: Vec<String> = policy
        .split(';')
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .map(str::to_owned)
        .collect();

    let mut patched = false;
    for directive in &mut directives {
        if directive_name_is(directive, "img-src") {
            directive.push(' ');
            directive.push_str(origin);
            patched = true;
        }
    }
    if !patched {
        for directive in &mut directives {
            if directive_name_is(directive, "default-src") {
                directive.push(' ');
                directive.push_str(origin);
                break;
            }
        }
    }

    directives.join("; ")
}

fn directive_name_is(directive: &str, name: &str) -> bool {
    directive
        .split_whitespace()
        .next()
        .is_some_and(|first| first.eq_ignore_ascii_case(name))
}
