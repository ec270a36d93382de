use deunicode::deunicode;

/// A normalized, non-empty search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    /// `None` for absent or whitespace-only input.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let needle = normalize(raw?.trim());
        if needle.is_empty() {
            None
        } else {
            Some(Self { needle })
        }
    }

    /// Case and diacritic insensitive substring match.
    pub fn matches(&self, name: &str) -> bool {
        normalize(name).contains(&self.needle)
    }
}

fn normalize(text: &str) -> String {
    deunicode(text).to_lowercase()
}
