//! Platform API language codes.

/// Language used when no other language is requested.
pub const DEFAULT_LANGUAGE: &str = "english";

/// Every language code the platform accepts, with its English display name.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("arabic", "Arabic"),
    ("bulgarian", "Bulgarian"),
    ("schinese", "Chinese (Simplified)"),
    ("tchinese", "Chinese (Traditional)"),
    ("czech", "Czech"),
    ("danish", "Danish"),
    ("dutch", "Dutch"),
    ("english", "English"),
    ("finnish", "Finnish"),
    ("french", "French"),
    ("german", "German"),
    ("greek", "Greek"),
    ("hungarian", "Hungarian"),
    ("indonesian", "Indonesian"),
    ("italian", "Italian"),
    ("japanese", "Japanese"),
    ("koreana", "Korean"),
    ("norwegian", "Norwegian"),
    ("polish", "Polish"),
    ("portuguese", "Portuguese"),
    ("brazilian", "Portuguese (Brazil)"),
    ("romanian", "Romanian"),
    ("russian", "Russian"),
    ("spanish", "Spanish (Spain)"),
    ("latam", "Spanish (Latin America)"),
    ("swedish", "Swedish"),
    ("thai", "Thai"),
    ("turkish", "Turkish"),
    ("ukrainian", "Ukrainian"),
    ("vietnamese", "Vietnamese"),
];

/// Whether `code` is a language code the platform accepts. Case-sensitive.
#[must_use]
pub fn is_valid_language_code(code: &str) -> bool {
    LANGUAGES.iter().any(|(api_code, _)| *api_code == code)
}
