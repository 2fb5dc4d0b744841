/// ImageType value as it arrives from a decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RawImageType {
    /// Native multi-valued element.
    Sequence(Vec<String>),
    /// Single string: either backslash-delimited (`ORIGINAL\PRIMARY\M`) or a
    /// rendered list (`['ORIGINAL', 'PRIMARY', 'M']`).
    Text(String),
    #[default]
    Missing,
}

const MAGNITUDE_IMAGE_TYPE: [&str; 5] = ["ORIGINAL", "PRIMARY", "M", "ND", "NORM"];
const PHASE_IMAGE_TYPE: [&str; 5] = ["ORIGINAL", "PRIMARY", "P", "ND", "NORM"];

/// Ordered, trimmed ImageType components. Empty when nothing usable is present.
pub fn normalize(raw: &RawImageType) -> Vec<String> {
    match raw {
        RawImageType::Sequence(values) => values.iter().map(|v| v.trim().to_string()).collect(),
        RawImageType::Text(text) => normalize_text(text),
        RawImageType::Missing => Vec::new(),
    }
}

fn normalize_text(text: &str) -> Vec<String> {
    if text.contains('\\') {
        return text.split('\\').map(|p| p.trim().to_string()).collect();
    }
    let text = text.trim();
    if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        if inner.trim().is_empty() {
            return Vec::new();
        }
        return inner
            .split(',')
            .map(|p| p.trim().trim_matches(|c| c == '\'' || c == '"').trim().to_string())
            .collect();
    }
    if text.is_empty() {
        Vec::new()
    } else {
        vec![text.to_string()]
    }
}

/// `"M"` or `"P"` for the exact magnitude/phase field-map signatures, empty otherwise.
pub fn fieldmap_subtag(components: &[String]) -> &'static str {
    if components.iter().map(String::as_str).eq(MAGNITUDE_IMAGE_TYPE) {
        "M"
    } else if components.iter().map(String::as_str).eq(PHASE_IMAGE_TYPE) {
        "P"
    } else {
        ""
    }
}

/// Short image-type tag stored per series: the field-map sub-tag when one
/// applies, else the third component, else empty.
pub fn image_type_tag(raw: &RawImageType) -> String {
    let components = normalize(raw);
    match fieldmap_subtag(&components) {
        "" => components.get(2).cloned().unwrap_or_default(),
        tag => tag.to_string(),
    }
}
