use bytes::Bytes;
use thiserror::Error;

use crate::content::is_safe_component;

pub const MAX_CAPTION_CHARS: usize = 256;

/// Column widths of `posts.andrewid` and `posts.username`.
pub const MAX_ANDREW_ID_CHARS: usize = 8;
pub const MAX_NAME_CHARS: usize = 30;

/// Upload positions `file_0` through `file_9`.
pub const FILE_SLOTS: usize = 10;

pub const ALLOWED_EXTENSIONS: [&str; 9] = [
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".mp4", ".mov", ".webm", ".avi",
];

/// Extension used when neither the filename nor the content type is recognized.
const FALLBACK_EXTENSION: &str = ".bin";

const CONTENT_TYPE_EXTENSIONS: [(&str, &str); 7] = [
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
    ("video/mp4", ".mp4"),
    ("video/quicktime", ".mov"),
    ("video/webm", ".webm"),
];

/// Why a submission was turned away. The message is shown to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Failed to parse form data: {0}")]
    MalformedForm(String),
    #[error("Andrew ID is required")]
    AndrewIdRequired,
    #[error("Andrew ID is invalid")]
    AndrewIdInvalid,
    #[error("Andrew ID exceeds 8 characters")]
    AndrewIdTooLong,
    #[error("Name is required")]
    NameRequired,
    #[error("Name exceeds 30 characters")]
    NameTooLong,
    #[error("Instagram username is required")]
    InstagramUsernameRequired,
    #[error("Caption is required")]
    CaptionRequired,
    #[error("Caption exceeds 256 characters")]
    CaptionTooLong,
    #[error("At least one image or video is required")]
    NoMedia,
}

/// Text fields exactly as they arrived.
#[derive(Debug, Clone, Default)]
pub struct RawFields {
    pub andrew_id: Option<String>,
    pub name: Option<String>,
    pub instagram_username: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFields {
    pub andrew_id: String,
    pub name: String,
    /// Without the leading `@`
    pub instagram_username: String,
    pub caption: String,
}

/// One uploaded file part.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

fn trimmed(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

/// Check the text fields in order, stopping at the first problem.
pub fn validate_fields(raw: &RawFields) -> Result<ValidatedFields, Rejection> {
    let andrew_id = trimmed(&raw.andrew_id);
    if andrew_id.is_empty() {
        return Err(Rejection::AndrewIdRequired);
    }
    // The id becomes a directory name.
    if !is_safe_component(andrew_id) {
        return Err(Rejection::AndrewIdInvalid);
    }
    if andrew_id.chars().count() > MAX_ANDREW_ID_CHARS {
        return Err(Rejection::AndrewIdTooLong);
    }

    let name = trimmed(&raw.name);
    if name.is_empty() {
        return Err(Rejection::NameRequired);
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(Rejection::NameTooLong);
    }

    let instagram_username = trimmed(&raw.instagram_username);
    let instagram_username = instagram_username
        .strip_prefix('@')
        .unwrap_or(instagram_username);
    if instagram_username.is_empty() {
        return Err(Rejection::InstagramUsernameRequired);
    }

    let caption = trimmed(&raw.caption);
    if caption.is_empty() {
        return Err(Rejection::CaptionRequired);
    }
    if caption.chars().count() > MAX_CAPTION_CHARS {
        return Err(Rejection::CaptionTooLong);
    }

    Ok(ValidatedFields {
        andrew_id: andrew_id.to_string(),
        name: name.to_string(),
        instagram_username: instagram_username.to_string(),
        caption: caption.to_string(),
    })
}

/// Lower-cased suffix of the last path element, dot included (`"a/b.JPG"` → `".jpg"`).
fn filename_extension(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    base.rfind('.').map(|i| base[i..].to_lowercase())
}

fn content_type_extension(content_type: Option<&str>) -> &'static str {
    let content_type = content_type.unwrap_or("").trim().to_lowercase();
    CONTENT_TYPE_EXTENSIONS
        .iter()
        .find(|(prefix, _)| content_type.starts_with(prefix))
        .map(|(_, ext)| *ext)
        .unwrap_or(FALLBACK_EXTENSION)
}

/// The filename's extension if it has one, otherwise one inferred from the content type.
pub fn resolve_extension(file_name: Option<&str>, content_type: Option<&str>) -> String {
    file_name
        .and_then(filename_extension)
        .unwrap_or_else(|| content_type_extension(content_type).to_string())
}

pub fn is_allowed_extension(extension: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&extension)
}

/// Extension to store the part under, or `None` if the part should be dropped.
pub fn accepted_extension(part: &FilePart) -> Option<String> {
    let extension = resolve_extension(part.file_name.as_deref(), part.content_type.as_deref());
    is_allowed_extension(&extension).then_some(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(andrew_id: &str, name: &str, instagram: &str, caption: &str) -> RawFields {
        RawFields {
            andrew_id: Some(andrew_id.to_string()),
            name: Some(name.to_string()),
            instagram_username: Some(instagram.to_string()),
            caption: Some(caption.to_string()),
        }
    }

    fn part(file_name: Option<&str>, content_type: Option<&str>) -> FilePart {
        FilePart {
            file_name: file_name.map(str::to_string),
            content_type: content_type.map(str::to_string),
            data: Bytes::from_static(b"data"),
        }
    }

    #[test]
    fn test_valid_fields_are_trimmed() {
        let valid = validate_fields(&fields(" abc123 ", " A B ", " @ab ", "  hi  ")).unwrap();
        assert_eq!(
            valid,
            ValidatedFields {
                andrew_id: "abc123".to_string(),
                name: "A B".to_string(),
                instagram_username: "ab".to_string(),
                caption: "hi".to_string(),
            }
        );
    }

    #[test]
    fn test_rules_short_circuit_in_order() {
        assert_eq!(
            validate_fields(&RawFields::default()),
            Err(Rejection::AndrewIdRequired)
        );
        assert_eq!(
            validate_fields(&fields("abc", "  ", "", "")),
            Err(Rejection::NameRequired)
        );
        assert_eq!(
            validate_fields(&fields("abc", "A", " ", "")),
            Err(Rejection::InstagramUsernameRequired)
        );
        assert_eq!(
            validate_fields(&fields("abc", "A", "@", "hi")),
            Err(Rejection::InstagramUsernameRequired)
        );
        assert_eq!(
            validate_fields(&fields("abc", "A", "ab", " ")),
            Err(Rejection::CaptionRequired)
        );
    }

    #[test]
    fn test_andrew_id_cannot_escape_store_root() {
        assert_eq!(
            validate_fields(&fields("../etc", "A", "ab", "hi")),
            Err(Rejection::AndrewIdInvalid)
        );
        assert_eq!(
            validate_fields(&fields("..", "A", "ab", "hi")),
            Err(Rejection::AndrewIdInvalid)
        );
    }

    #[test]
    fn test_caption_length_boundary() {
        let at_limit = "a".repeat(MAX_CAPTION_CHARS);
        assert!(validate_fields(&fields("abc", "A", "ab", &at_limit)).is_ok());

        let over = "a".repeat(MAX_CAPTION_CHARS + 1);
        assert_eq!(
            validate_fields(&fields("abc", "A", "ab", &over)),
            Err(Rejection::CaptionTooLong)
        );
    }

    #[test]
    fn test_column_width_limits() {
        assert!(validate_fields(&fields("abcdefgh", &"n".repeat(30), "ab", "hi")).is_ok());
        assert_eq!(
            validate_fields(&fields("abcdefghi", "A", "ab", "hi")),
            Err(Rejection::AndrewIdTooLong)
        );
        assert_eq!(
            validate_fields(&fields("abc", &"n".repeat(31), "ab", "hi")),
            Err(Rejection::NameTooLong)
        );
        // Characters, not bytes
        assert!(validate_fields(&fields("abc", &"é".repeat(30), "ab", "hi")).is_ok());
    }

    #[test]
    fn test_caption_length_counts_characters() {
        let accented = "é".repeat(MAX_CAPTION_CHARS);
        assert!(validate_fields(&fields("abc", "A", "ab", &accented)).is_ok());
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            Rejection::CaptionTooLong.to_string(),
            "Caption exceeds 256 characters"
        );
        assert_eq!(
            Rejection::NoMedia.to_string(),
            "At least one image or video is required"
        );
    }

    #[test]
    fn test_extension_from_filename() {
        assert_eq!(resolve_extension(Some("Photo.JPG"), Some("image/png")), ".jpg");
        assert_eq!(resolve_extension(Some("dir/clip.mov"), None), ".mov");
        assert_eq!(resolve_extension(Some("v1.2/clip"), Some("video/mp4")), ".mp4");
    }

    #[test]
    fn test_extension_from_content_type() {
        assert_eq!(resolve_extension(Some("upload"), Some("image/png")), ".png");
        assert_eq!(resolve_extension(None, Some("image/jpeg")), ".jpg");
        assert_eq!(resolve_extension(None, Some("video/quicktime")), ".mov");
        assert_eq!(
            resolve_extension(None, Some("video/webm; codecs=vp9")),
            ".webm"
        );
        assert_eq!(resolve_extension(None, Some("application/pdf")), ".bin");
        assert_eq!(resolve_extension(None, None), ".bin");
    }

    #[test]
    fn test_accepted_extension() {
        assert_eq!(
            accepted_extension(&part(Some("a.avi"), None)),
            Some(".avi".to_string())
        );
        assert_eq!(
            accepted_extension(&part(Some("a.jpeg"), None)),
            Some(".jpeg".to_string())
        );
        assert_eq!(accepted_extension(&part(Some("notes.txt"), None)), None);
        assert_eq!(accepted_extension(&part(None, Some("text/plain"))), None);
        assert_eq!(accepted_extension(&part(Some("trailing."), None)), None);
    }
}
