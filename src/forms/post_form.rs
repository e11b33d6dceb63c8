use image::ImageFormat;
use serde::{Deserialize, Serialize};

use super::{add_error, clean_text, FormErrors, REQUIRED};
use crate::entities::{EntGroup, GroupId, PostRecord};

pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const EMPTY_FILE: &str = "The submitted file is empty.";

/// Raw text fields as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostFormData {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Decodes an upload and returns its format; `None` when it is not a readable image.
pub fn decode_image(data: &[u8]) -> Option<ImageFormat> {
    let format = image::guess_format(data).ok()?;
    image::load_from_memory_with_format(data, format).ok()?;
    Some(format)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PostFormInitial {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupChoice {
    pub id: GroupId,
    pub title: String,
}

/// Validated form values. `image` is a new upload still to be stored.
#[derive(Debug, Clone)]
pub struct CleanedPostForm {
    pub text: String,
    pub group_id: Option<GroupId>,
    pub image: Option<UploadedFile>,
}

/// Create/edit form for a post: `text` required, `group` and `image` optional.
#[derive(Debug, Clone, Serialize)]
pub struct PostForm {
    pub is_bound: bool,
    pub data: PostFormData,
    pub initial: PostFormInitial,
    pub errors: FormErrors,
    pub group_choices: Vec<GroupChoice>,
    #[serde(skip)]
    cleaned: Option<CleanedPostForm>,
}

impl PostForm {
    /// Empty form for a new post.
    pub fn unbound(groups: &[EntGroup]) -> Self {
        Self {
            is_bound: false,
            data: PostFormData::default(),
            initial: PostFormInitial::default(),
            errors: FormErrors::new(),
            group_choices: group_choices(groups),
            cleaned: None,
        }
    }

    /// Form pre-filled from an existing post.
    pub fn for_instance(post: &PostRecord, groups: &[EntGroup]) -> Self {
        Self {
            initial: initial_from(post),
            ..Self::unbound(groups)
        }
    }

    /// Binds submitted values and validates them against the group choices.
    pub fn bind(data: PostFormData, image: Option<UploadedFile>, groups: &[EntGroup]) -> Self {
        let mut errors = FormErrors::new();

        let text = clean_text(data.text.as_deref());
        if text.is_none() {
            add_error(&mut errors, "text", REQUIRED);
        }

        let group_id = match clean_text(data.group.as_deref()) {
            None => None,
            Some(raw) => match raw.parse::<GroupId>() {
                Ok(id) if groups.iter().any(|group| group.id == id) => Some(id),
                _ => {
                    add_error(&mut errors, "group", INVALID_CHOICE);
                    None
                }
            },
        };

        // Browsers send an empty, nameless part when no file was picked.
        let image = image.filter(|file| !(file.file_name.is_empty() && file.data.is_empty()));
        if let Some(file) = &image {
            if file.data.is_empty() {
                add_error(&mut errors, "image", EMPTY_FILE);
            } else if decode_image(&file.data).is_none() {
                add_error(&mut errors, "image", INVALID_IMAGE);
            }
        }

        let cleaned = match text {
            Some(text) if errors.is_empty() => Some(CleanedPostForm {
                text,
                group_id,
                image,
            }),
            _ => None,
        };

        Self {
            is_bound: true,
            data,
            initial: PostFormInitial::default(),
            errors,
            group_choices: group_choices(groups),
            cleaned,
        }
    }

    /// Bound form for editing `post`; keeps the post's values as initial.
    pub fn bind_instance(
        post: &PostRecord,
        data: PostFormData,
        image: Option<UploadedFile>,
        groups: &[EntGroup],
    ) -> Self {
        Self {
            initial: initial_from(post),
            ..Self::bind(data, image, groups)
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_bound && self.errors.is_empty()
    }

    pub fn cleaned(&self) -> Option<&CleanedPostForm> {
        self.cleaned.as_ref()
    }
}

fn group_choices(groups: &[EntGroup]) -> Vec<GroupChoice> {
    groups
        .iter()
        .map(|group| GroupChoice {
            id: group.id,
            title: group.title.clone(),
        })
        .collect()
}

fn initial_from(post: &PostRecord) -> PostFormInitial {
    PostFormInitial {
        text: Some(post.text.clone()),
        group: post.group_id,
        image: post.image.clone(),
    }
}
