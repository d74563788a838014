//! Case conversions between path text and handler identifiers.
//!
//! `admin/user_photos` <-> `Admin::UserPhotos`

/// `admin/user_photos` -> `Admin::UserPhotos`
#[must_use]
pub fn camelize(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 4);
    for (i, namespace) in term.split('/').enumerate() {
        if i > 0 {
            out.push_str("::");
        }
        for word in namespace.split('_') {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

/// `Admin::UserPhotos` -> `admin/user_photos`, `HTMLParser` -> `html_parser`
#[must_use]
pub fn underscore(word: &str) -> String {
    let word = word.replace("::", "/");
    let chars: Vec<char> = word.chars().collect();
    let mut out = String::with_capacity(word.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let word_start = prev.is_ascii_lowercase() || prev.is_ascii_digit();
            let acronym_end =
                prev.is_ascii_uppercase() && next.is_some_and(|n| n.is_ascii_lowercase());
            if word_start || acronym_end {
                out.push('_');
            }
        }
        match c {
            '-' => out.push('_'),
            other => out.push(other.to_ascii_lowercase()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camelize() {
        assert_eq!(camelize("photos"), "Photos");
        assert_eq!(camelize("user_photos"), "UserPhotos");
        assert_eq!(camelize("admin/user_photos"), "Admin::UserPhotos");
    }

    #[test]
    fn test_underscore() {
        assert_eq!(underscore("UserPhotos"), "user_photos");
        assert_eq!(underscore("Admin::UserPhotos"), "admin/user_photos");
        assert_eq!(underscore("HTMLParser"), "html_parser");
        assert_eq!(underscore("user-photos"), "user_photos");
        assert_eq!(underscore("photos"), "photos");
    }
}
