use url::Url;

/// Query parameters that only carry campaign tracking
const TRACKING_PARAMS: [&str; 2] = ["gclid", "fbclid"];
const TRACKING_PREFIX: &str = "utm_";

/// Canonicalizes a URL for deduplication and comparison.
///
/// Removes the fragment and tracking query parameters, strips trailing
/// slashes from non-root paths and lowercases the host. Surviving query
/// parameters keep their order and raw values. Input that is not an
/// absolute URL is returned unchanged.
///
/// The result is a comparison key, not something to navigate to.
pub fn normalize(raw: &str) -> String {
    let mut url = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => {
            ::log::trace!("Leaving unparseable URL as-is ({}): {}", e, raw);
            return raw.to_string();
        }
    };

    url.set_fragment(None);
    strip_tracking_params(&mut url);
    strip_trailing_slash(&mut url);
    lowercase_host(&mut url);

    url.to_string()
}

/// Returns true if the query parameter name is a tracking parameter
pub fn is_tracking_param(name: &str) -> bool {
    name.starts_with(TRACKING_PREFIX) || TRACKING_PARAMS.contains(&name)
}

fn strip_tracking_params(url: &mut Url) {
    let Some(query) = url.query() else {
        return;
    };

    // Work on the raw query so kept values are not re-encoded
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let name = pair.split_once('=').map_or(*pair, |(name, _)| name);
            !is_tracking_param(name)
        })
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let rebuilt = kept.join("&");
        url.set_query(Some(&rebuilt));
    }
}

fn strip_trailing_slash(url: &mut Url) {
    let path = url.path();
    if path == "/" || !path.ends_with('/') {
        return;
    }

    let trimmed = path.trim_end_matches('/');
    let trimmed = if trimmed.is_empty() { "/" } else { trimmed }.to_string();
    url.set_path(&trimmed);
}

fn lowercase_host(url: &mut Url) {
    let Some(host) = url.host_str() else {
        return;
    };
    if !host.chars().any(|c| c.is_ascii_uppercase()) {
        return;
    }

    let lowered = host.to_ascii_lowercase();
    if let Err(e) = url.set_host(Some(&lowered)) {
        ::log::trace!("Could not lowercase host {}: {}", lowered, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_fragment() {
        assert_eq!(
            normalize("https://r.com/menu#dinner"),
            "https://r.com/menu"
        );
    }

    #[test]
    fn test_strips_tracking_params_and_keeps_the_rest() {
        let normalized =
            normalize("https://r.com/menu?utm_source=ig&b=2&gclid=xyz&a=%20x&fbclid=1&utm_medium=s");
        assert_eq!(normalized, "https://r.com/menu?b=2&a=%20x");

        // Only tracking params: the query disappears entirely
        assert_eq!(
            normalize("https://r.com/menu?utm_campaign=spring"),
            "https://r.com/menu"
        );

        // Names that merely contain a tracking name are kept
        assert_eq!(
            normalize("https://r.com/menu?my_utm_tag=1&gclid_x=2"),
            "https://r.com/menu?my_utm_tag=1&gclid_x=2"
        );
    }

    #[test]
    fn test_trailing_slash() {
        assert_eq!(normalize("https://r.com/menu/"), "https://r.com/menu");
        assert_eq!(normalize("https://r.com/menu//"), "https://r.com/menu");
        assert_eq!(normalize("https://r.com/"), "https://r.com/");
        assert_eq!(normalize("https://r.com"), "https://r.com/");
        assert_eq!(
            normalize("https://r.com/menu/?page=2"),
            "https://r.com/menu?page=2"
        );
    }

    #[test]
    fn test_lowercases_host_only() {
        assert_eq!(
            normalize("https://WWW.Bistro.COM/Menu/Dinner"),
            "https://www.bistro.com/Menu/Dinner"
        );
        assert_eq!(
            normalize("http://Localhost:8080/Menu?Day=Fri"),
            "http://localhost:8080/Menu?Day=Fri"
        );
    }

    #[test]
    fn test_unparseable_input_is_returned_unchanged() {
        assert_eq!(normalize("/menu"), "/menu");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("not a url"), "not a url");
        assert_eq!(normalize("http://"), "http://");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "https://r.com/menu/",
            "https://R.com//menus//#top",
            "https://r.com/a/b/?utm_source=x&q=1#frag",
            "https://r.com/?",
            "https://r.com/menu.pdf?gclid=1",
            "mailto:Owner@R.com",
            "http://localhost:8080/Menu/",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {}", sample);
        }
    }

    #[test]
    fn test_is_tracking_param() {
        assert!(is_tracking_param("utm_source"));
        assert!(is_tracking_param("utm_"));
        assert!(is_tracking_param("gclid"));
        assert!(is_tracking_param("fbclid"));
        assert!(!is_tracking_param("UTM_SOURCE"));
        assert!(!is_tracking_param("page"));
    }
}
