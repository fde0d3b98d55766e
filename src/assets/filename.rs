//! Filename sanitizing and image type checks for uploaded assets.

use std::path::Path;

/// Image extensions accepted for upload, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "ico"];

/// Reduce an untrusted filename to a bare, ASCII-only name.
///
/// Path separators become word breaks, whitespace runs collapse to `_`,
/// anything outside `[A-Za-z0-9_.-]` is dropped and leading or trailing
/// dots and underscores are trimmed. The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let spaced: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Whether the filename ends in one of the allowed image extensions.
///
/// A name that is only an extension (`.png`) has no extension.
pub fn has_allowed_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_filename_keeps_plain_names() {
        assert_eq!(secure_filename("pic.png"), "pic.png");
        assert_eq!(secure_filename("hero_pic-2.JPG"), "hero_pic-2.JPG");
    }

    #[test]
    fn test_secure_filename_strips_paths() {
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("/etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename(r"C:\Users\me\logo.png"), "C_Users_me_logo.png");
    }

    #[test]
    fn test_secure_filename_cleans_characters() {
        assert_eq!(secure_filename("my cool  pic.png"), "my_cool_pic.png");
        assert_eq!(secure_filename("café<script>.gif"), "cafscript.gif");
        assert_eq!(secure_filename("..hidden.png"), "hidden.png");
        assert_eq!(secure_filename("日本.png"), "png");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn test_allowed_extensions() {
        assert!(has_allowed_extension("a.jpg"));
        assert!(has_allowed_extension("a.JPEG"));
        assert!(has_allowed_extension("favicon.ico"));
        assert!(has_allowed_extension("anim.GiF"));
        assert!(!has_allowed_extension("setup.exe"));
        assert!(!has_allowed_extension("png"));
        assert!(!has_allowed_extension(".png"));
        assert!(!has_allowed_extension("archive.png.zip"));
        assert!(!has_allowed_extension(""));
    }
}
