/// Sortable fields, by document field name.
pub const VIDEO_SORT_FIELDS: &[&str] = &["createdAt", "updatedAt", "views", "duration", "title"];
pub const TWEET_SORT_FIELDS: &[&str] = &["createdAt", "updatedAt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: &'static str,
    pub descending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: "createdAt",
            descending: true,
        }
    }
}

impl SortSpec {
    /// Unknown fields fall back to newest first. Only `desc` sorts descending.
    pub fn parse(sort_by: Option<&str>, sort_type: Option<&str>, allowed: &[&'static str]) -> Self {
        let field = sort_by.and_then(|wanted| allowed.iter().copied().find(|f| *f == wanted));
        match field {
            Some(field) => Self {
                field,
                descending: sort_type.map(|t| t.eq_ignore_ascii_case("desc")).unwrap_or(false),
            },
            None => Self::default(),
        }
    }

    pub fn direction(&self) -> i32 {
        if self.descending {
            -1
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_field_with_direction() {
        let spec = SortSpec::parse(Some("views"), Some("desc"), VIDEO_SORT_FIELDS);
        assert_eq!(spec.field, "views");
        assert_eq!(spec.direction(), -1);
    }

    #[test]
    fn test_missing_direction_sorts_ascending() {
        let spec = SortSpec::parse(Some("title"), None, VIDEO_SORT_FIELDS);
        assert!(!spec.descending);
    }

    #[test]
    fn test_unknown_field_falls_back_to_newest_first() {
        let spec = SortSpec::parse(Some("password"), Some("asc"), VIDEO_SORT_FIELDS);
        assert_eq!(spec, SortSpec::default());
    }
}
