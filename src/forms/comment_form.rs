use serde::{Deserialize, Serialize};

use super::{add_error, clean_text, FormErrors, REQUIRED};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentFormData {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentForm {
    pub is_bound: bool,
    pub data: CommentFormData,
    pub errors: FormErrors,
    #[serde(skip)]
    cleaned_text: Option<String>,
}

impl CommentForm {
    pub fn unbound() -> Self {
        Self::default()
    }

    pub fn bind(data: CommentFormData) -> Self {
        let mut errors = FormErrors::new();
        let cleaned_text = clean_text(data.text.as_deref());
        if cleaned_text.is_none() {
            add_error(&mut errors, "text", REQUIRED);
        }
        Self {
            is_bound: true,
            data,
            errors,
            cleaned_text,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_bound && self.errors.is_empty()
    }

    /// Validated text; `None` unless the form is valid.
    pub fn cleaned_text(&self) -> Option<&str> {
        if self.is_valid() {
            self.cleaned_text.as_deref()
        } else {
            None
        }
    }
}
