//! Helpers for provider output references.

/// Extension used when an output URL carries none we can trust.
pub const DEFAULT_EXTENSION: &str = "jpg";

const MAX_EXTENSION_LEN: usize = 5;

/// File extension of an output URL, lowercased.
///
/// Looks at the last path segment only; query string and fragment are
/// ignored. Falls back to [`DEFAULT_EXTENSION`] when there is no
/// extension, or it is not short and alphanumeric.
pub fn file_extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let without_scheme = path.split_once("://").map_or(path, |(_, rest)| rest);
    // A bare host ("https://host") has no path segment to inspect.
    let Some((_, path)) = without_scheme.split_once('/') else {
        return DEFAULT_EXTENSION.to_string();
    };
    let segment = path.rsplit('/').next().unwrap_or_default();

    match segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_from_last_segment() {
        assert_eq!(file_extension("https://cdn.example/out/image.png"), "png");
        assert_eq!(file_extension("https://cdn.example/a.b/clip.MP4"), "mp4");
    }

    #[test]
    fn query_and_fragment_are_ignored() {
        assert_eq!(file_extension("https://cdn.example/x.webp?sig=a.b"), "webp");
        assert_eq!(file_extension("https://cdn.example/x.gif#frag.txt"), "gif");
    }

    #[test]
    fn falls_back_to_jpg() {
        assert_eq!(file_extension("https://cdn.example/output"), "jpg");
        assert_eq!(file_extension("https://cdn.example.com"), "jpg");
        assert_eq!(file_extension("https://cdn.example/file.toolongext"), "jpg");
        assert_eq!(file_extension("https://cdn.example/.hidden"), "jpg");
        assert_eq!(file_extension("https://cdn.example/x.p-g"), "jpg");
        assert_eq!(file_extension(""), "jpg");
    }
}
