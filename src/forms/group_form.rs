use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{add_error, clean_text, FormErrors, REQUIRED};
use crate::entities::NewGroup;

pub const TITLE_MAX_CHARS: usize = 200;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("static regex"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupFormData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Validation for the group admin workflow. Slug uniqueness is left to the store.
#[derive(Debug, Clone, Serialize)]
pub struct GroupForm {
    pub data: GroupFormData,
    pub errors: FormErrors,
    #[serde(skip)]
    cleaned: Option<NewGroup>,
}

impl GroupForm {
    pub fn bind(data: GroupFormData) -> Self {
        let mut errors = FormErrors::new();

        let title = clean_text(data.title.as_deref());
        match &title {
            None => add_error(&mut errors, "title", REQUIRED),
            Some(title) if title.chars().count() > TITLE_MAX_CHARS => add_error(
                &mut errors,
                "title",
                format!("Ensure this value has at most {} characters.", TITLE_MAX_CHARS),
            ),
            Some(_) => {}
        }

        let slug = clean_text(data.slug.as_deref());
        match &slug {
            None => add_error(&mut errors, "slug", REQUIRED),
            Some(slug) if !SLUG_RE.is_match(slug) => add_error(
                &mut errors,
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            ),
            Some(_) => {}
        }

        let cleaned = match (title, slug) {
            (Some(title), Some(slug)) if errors.is_empty() => Some(NewGroup {
                title,
                slug,
                description: clean_text(data.description.as_deref()),
            }),
            _ => None,
        };

        Self {
            data,
            errors,
            cleaned,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_new_group(self) -> Option<NewGroup> {
        self.cleaned
    }
}
