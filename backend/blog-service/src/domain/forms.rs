//! Input validation for everything authors submit.
//!
//! Each form is a plain deserializable struct with a `clean` method that
//! either produces the typed store input or a [`ValidationErrors`] listing
//! every offending field.

use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationError};

use super::models::{NewAuthor, NewComment, NewGroup, NewPost, PostChanges};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Field-level validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub fields: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|e| e.field == field)
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut by_field: Vec<_> = errors.field_errors().into_iter().collect();
        by_field.sort_by(|a, b| a.0.cmp(&b.0));

        let mut out = ValidationErrors::new();
        for (field, field_errors) in by_field {
            for error in field_errors {
                out.add(&field, describe(error));
            }
        }
        out
    }
}

fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    match (&*error.code, error.params.get("max")) {
        ("length", Some(max)) => format!("Ensure this value has at most {} characters.", max),
        _ => format!("Enter a valid value ({}).", error.code),
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Forms are validated after trimming, so blank means empty here.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid("required", REQUIRED));
    }
    Ok(())
}

fn username_shape(username: &str) -> Result<(), ValidationError> {
    let valid = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if username.is_empty() {
        Err(invalid("required", REQUIRED))
    } else if valid {
        Ok(())
    } else {
        Err(invalid(
            "invalid_username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ))
    }
}

fn slug_shape(slug: &str) -> Result<(), ValidationError> {
    let valid = slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
    if slug.is_empty() {
        Err(invalid("required", REQUIRED))
    } else if valid {
        Ok(())
    } else {
        Err(invalid(
            "invalid_slug",
            "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
        ))
    }
}

/// Email is optional at signup; only a non-empty value is checked.
fn optional_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || email.validate_email() {
        Ok(())
    } else {
        Err(invalid("email", "Enter a valid email address."))
    }
}

fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

/// Blank references mean "no image".
fn trimmed_image(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Text of a post or comment must contain something besides whitespace.
/// Both stores apply this before writing.
pub fn ensure_text(text: &str) -> Result<(), ValidationErrors> {
    if text.trim().is_empty() {
        return Err(ValidationErrors::single("text", REQUIRED));
    }
    Ok(())
}

/// Text of a post or comment: required and non-blank, returned trimmed.
pub fn clean_text(value: &str) -> Result<String, ValidationErrors> {
    ensure_text(value)?;
    Ok(trimmed(value))
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub text: String,
    #[serde(default)]
    pub group_id: Option<Uuid>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub image: Option<String>,
}

impl PostForm {
    pub fn clean(&self, author_id: Uuid) -> Result<NewPost, ValidationErrors> {
        let form = PostForm {
            text: trimmed(&self.text),
            group_id: self.group_id,
            image: trimmed_image(self.image.as_deref()),
        };
        form.validate()?;

        Ok(NewPost {
            author_id,
            text: form.text,
            group_id: form.group_id,
            image: form.image,
        })
    }
}

/// Edit of an existing post: absent fields are left untouched, `null`
/// clears the group or image.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EditPostForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub group_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 255))]
    pub image: Option<Option<String>>,
}

impl EditPostForm {
    pub fn clean(&self) -> Result<PostChanges, ValidationErrors> {
        let form = EditPostForm {
            text: self.text.as_deref().map(trimmed),
            group_id: self.group_id,
            image: self
                .image
                .as_ref()
                .map(|img| trimmed_image(img.as_deref())),
        };
        form.validate()?;

        Ok(PostChanges {
            text: form.text,
            group_id: form.group_id,
            image: form.image,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn clean(&self, post_id: Uuid, author_id: Uuid) -> Result<NewComment, ValidationErrors> {
        let text = clean_text(&self.text)?;
        Ok(NewComment {
            post_id,
            author_id,
            text,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SignupForm {
    #[serde(default)]
    #[validate(length(max = 150), custom(function = "username_shape"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(max = 254), custom(function = "optional_email"))]
    pub email: String,
}

impl SignupForm {
    pub fn clean(&self) -> Result<NewAuthor, ValidationErrors> {
        let form = SignupForm {
            username: trimmed(&self.username),
            first_name: trimmed(&self.first_name),
            last_name: trimmed(&self.last_name),
            email: trimmed(&self.email),
        };
        form.validate()?;

        Ok(NewAuthor {
            username: form.username,
            first_name: form.first_name,
            last_name: form.last_name,
            email: form.email,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GroupForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 100), custom(function = "slug_shape"))]
    pub slug: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub description: String,
}

impl GroupForm {
    pub fn clean(&self) -> Result<NewGroup, ValidationErrors> {
        let form = GroupForm {
            title: trimmed(&self.title),
            slug: trimmed(&self.slug),
            description: trimmed(&self.description),
        };
        form.validate()?;

        Ok(NewGroup {
            title: form.title,
            slug: form.slug,
            description: form.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_form_requires_non_blank_text() {
        let form = PostForm {
            text: "   \n".to_string(),
            ..Default::default()
        };
        let errors = form.clean(Uuid::new_v4()).unwrap_err();
        assert!(errors.has_field("text"));
    }

    #[test]
    fn post_form_trims_and_drops_empty_image() {
        let author_id = Uuid::new_v4();
        let form = PostForm {
            text: "  hello  ".to_string(),
            group_id: None,
            image: Some("   ".to_string()),
        };
        let new_post = form.clean(author_id).unwrap();
        assert_eq!(new_post.text, "hello");
        assert_eq!(new_post.author_id, author_id);
        assert!(new_post.image.is_none());
    }

    #[test]
    fn edit_form_distinguishes_missing_and_null() {
        let form: EditPostForm = serde_json::from_str(r#"{"group_id": null}"#).unwrap();
        let changes = form.clean().unwrap();
        assert!(changes.text.is_none());
        assert_eq!(changes.group_id, Some(None));
        assert!(changes.image.is_none());

        let form: EditPostForm = serde_json::from_str(r#"{"text": "new"}"#).unwrap();
        let changes = form.clean().unwrap();
        assert_eq!(changes.text.as_deref(), Some("new"));
        assert!(changes.group_id.is_none());
    }

    #[test]
    fn edit_form_rejects_blank_text() {
        let form: EditPostForm = serde_json::from_str(r#"{"text": ""}"#).unwrap();
        assert!(form.clean().unwrap_err().has_field("text"));
    }

    #[test]
    fn comment_form_requires_text() {
        let form = CommentForm {
            text: String::new(),
        };
        assert!(form.clean(Uuid::new_v4(), Uuid::new_v4()).is_err());
    }

    #[test]
    fn signup_form_reports_every_bad_field() {
        let form = SignupForm {
            username: "bad name!".to_string(),
            email: "nope".to_string(),
            ..Default::default()
        };
        let errors = form.clean().unwrap_err();
        assert!(errors.has_field("username"));
        assert!(errors.has_field("email"));
        assert_eq!(errors.fields.len(), 2);
    }

    #[test]
    fn signup_form_accepts_django_style_usernames() {
        let form = SignupForm {
            username: "leo.tolstoy+1@ya_ru-x".to_string(),
            email: "leo@example.com".to_string(),
            ..Default::default()
        };
        assert!(form.clean().is_ok());
    }

    #[test]
    fn signup_form_rejects_malformed_emails() {
        for email in ["a@@b.com", "a@b .com", "a b@c.com", "nope@"] {
            let form = SignupForm {
                username: "leo".to_string(),
                email: email.to_string(),
                ..Default::default()
            };
            let errors = form.clean().unwrap_err();
            assert!(errors.has_field("email"), "{} was accepted", email);
        }
    }

    #[test]
    fn signup_form_email_is_optional() {
        let form = SignupForm {
            username: "leo".to_string(),
            email: "   ".to_string(),
            ..Default::default()
        };
        assert_eq!(form.clean().unwrap().email, "");
    }

    #[test]
    fn username_and_slug_are_ascii_only() {
        let form = SignupForm {
            username: "лев".to_string(),
            ..Default::default()
        };
        assert!(form.clean().unwrap_err().has_field("username"));

        let form = GroupForm {
            title: "Котики".to_string(),
            slug: "котики".to_string(),
            description: "About cats".to_string(),
        };
        let errors = form.clean().unwrap_err();
        assert!(errors.has_field("slug"));
        assert!(!errors.has_field("title"));
    }

    #[test]
    fn blank_fields_report_required() {
        let errors = GroupForm::default().clean().unwrap_err();
        for field in ["description", "slug", "title"] {
            assert!(errors.has_field(field));
        }
        assert!(errors.fields.iter().all(|e| e.message == REQUIRED));
    }

    #[test]
    fn edit_form_bounds_image_reference() {
        let form = EditPostForm {
            image: Some(Some("x".repeat(256))),
            ..Default::default()
        };
        assert!(form.clean().unwrap_err().has_field("image"));

        let form = EditPostForm {
            image: Some(Some("  ".to_string())),
            ..Default::default()
        };
        assert_eq!(form.clean().unwrap().image, Some(None));
    }

    #[test]
    fn group_form_validates_slug() {
        let form = GroupForm {
            title: "Cats".to_string(),
            slug: "cats and dogs".to_string(),
            description: "About cats".to_string(),
        };
        assert!(form.clean().unwrap_err().has_field("slug"));

        let form = GroupForm {
            title: "Cats".to_string(),
            slug: "cats-and_dogs".to_string(),
            description: "About cats".to_string(),
        };
        assert!(form.clean().is_ok());
    }

    #[test]
    fn group_title_length_is_bounded() {
        let form = GroupForm {
            title: "x".repeat(201),
            slug: "x".to_string(),
            description: "d".to_string(),
        };
        assert!(form.clean().unwrap_err().has_field("title"));
    }
}
