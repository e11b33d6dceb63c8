// Form binding and validation for submitted data

pub mod comment_form;
pub mod group_form;
pub mod post_form;

pub use comment_form::{CommentForm, CommentFormData};
pub use group_form::{GroupForm, GroupFormData};
pub use post_form::{decode_image, CleanedPostForm, PostForm, PostFormData, UploadedFile};

use std::collections::BTreeMap;

pub const REQUIRED: &str = "This field is required.";

/// Field name to error messages, serialised as-is for presentation.
pub type FormErrors = BTreeMap<String, Vec<String>>;

pub(crate) fn add_error(errors: &mut FormErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

/// Trimmed value, or `None` when missing or blank.
pub(crate) fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
