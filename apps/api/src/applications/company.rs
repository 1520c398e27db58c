use reqwest::Url;

// Second-level labels that sit under a country code (acme.co.uk).
const GENERIC_SECOND_LEVEL: &[&str] = &["co", "com", "org", "net", "ac", "gov", "edu"];

/// Guesses a company name from a job posting URL:
/// `https://www.google.com/careers` → `Google`.
/// Returns `None` when the URL has no usable host.
pub fn derive_company(raw_url: &str) -> Option<String> {
    let raw_url = raw_url.trim();
    let url = Url::parse(raw_url)
        .or_else(|_| Url::parse(&format!("https://{raw_url}")))
        .ok()?;
    let host = url.host_str()?.trim_start_matches("www.").to_lowercase();

    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    let name = match labels.as_slice() {
        [] => return None,
        [only] => *only,
        [.., sld, _tld] if labels.len() >= 3 && GENERIC_SECOND_LEVEL.contains(sld) => {
            labels[labels.len() - 3]
        }
        [.., name, _tld] => *name,
    };

    if name.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(capitalize(name))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
