//! Request validation. Every rule failure is collected per field so a client
//! sees all problems at once.

use tipline_types::api::{
    AddCommentRequest, CreatePostRequest, CreateReportRequest, LoginRequest, PostMessageRequest,
    RegisterRequest,
};

use crate::error::{ApiError, FieldErrors};
use crate::extract::JsonBody;

#[derive(Debug)]
pub struct NewReport {
    pub title: String,
    pub category: Option<String>,
    pub body: String,
}

#[derive(Debug)]
pub struct Registration {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct NewPost {
    pub image_url: String,
    pub caption: Option<String>,
}

#[derive(Default)]
struct Validator {
    errors: FieldErrors,
}

impl Validator {
    /// Starts with a type error for every field the body carried with the
    /// wrong JSON type.
    fn for_body<T>(body: &JsonBody<T>) -> Self {
        let mut v = Self::default();
        for field in &body.mistyped {
            v.fail(field, "Not a valid string.");
        }
        v
    }

    fn fail(&mut self, field: &str, msg: impl Into<String>) {
        self.errors.entry(field.to_string()).or_default().push(msg.into());
    }

    /// A field that was sent with the wrong type is not also "missing".
    fn missing(&mut self, field: &str) {
        if !self.errors.contains_key(field) {
            self.fail(field, "Missing data for required field.");
        }
    }

    /// Trimmed value, or a "required" error when absent or blank.
    fn required(&mut self, field: &str, value: Option<&str>) -> String {
        let value = value.map(str::trim).unwrap_or_default();
        if value.is_empty() {
            self.missing(field);
        }
        value.to_string()
    }

    fn length(&mut self, field: &str, value: &str, min: usize, max: Option<usize>) {
        if value.is_empty() {
            return; // already reported as missing
        }
        let len = value.chars().count();
        match max {
            Some(max) if len < min || len > max => {
                self.fail(field, format!("Length must be between {min} and {max}."))
            }
            None if len < min => self.fail(field, format!("Shorter than minimum length {min}.")),
            _ => {}
        }
    }

    fn email(&mut self, field: &str, value: &str) {
        if !value.is_empty() && !is_valid_email(value) {
            self.fail(field, "Not a valid email address.");
        }
    }

    fn finish<T>(self, value: T) -> Result<T, ApiError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn new_report(body: &JsonBody<CreateReportRequest>) -> Result<NewReport, ApiError> {
    let req = &body.value;
    let mut v = Validator::for_body(body);
    let title = v.required("title", req.title.as_deref());
    v.length("title", &title, 2, Some(200));
    let body = v.required("body", req.body.as_deref());
    let category = optional(req.category.as_deref());
    if let Some(c) = &category {
        v.length("category", c, 1, Some(120));
    }
    v.finish(NewReport { title, category, body })
}

pub fn message_body(body: &JsonBody<PostMessageRequest>) -> Result<String, ApiError> {
    let req = &body.value;
    let mut v = Validator::for_body(body);
    let body = v.required("body", req.body.as_deref());
    v.finish(body)
}

pub fn registration(body: &JsonBody<RegisterRequest>) -> Result<Registration, ApiError> {
    let req = &body.value;
    let mut v = Validator::for_body(body);
    let email = v.required("email", req.email.as_deref()).to_lowercase();
    v.email("email", &email);
    let name = v.required("name", req.name.as_deref());
    v.length("name", &name, 2, Some(120));

    // Passwords are taken verbatim, never trimmed.
    let password = req.password.clone().unwrap_or_default();
    if password.is_empty() {
        v.missing("password");
    } else {
        v.length("password", &password, 6, None);
    }

    v.finish(Registration { email, name, password })
}

pub fn credentials(body: &JsonBody<LoginRequest>) -> Result<Credentials, ApiError> {
    let req = &body.value;
    let mut v = Validator::for_body(body);
    let email = v.required("email", req.email.as_deref()).to_lowercase();
    v.email("email", &email);
    let password = req.password.clone().unwrap_or_default();
    if password.is_empty() {
        v.missing("password");
    }
    v.finish(Credentials { email, password })
}

pub fn new_post(body: &JsonBody<CreatePostRequest>) -> Result<NewPost, ApiError> {
    let req = &body.value;
    let mut v = Validator::for_body(body);
    let image_url = v.required("image_url", req.image_url.as_deref());
    let caption = optional(req.caption.as_deref());
    v.finish(NewPost { image_url, caption })
}

pub fn comment_body(body: &JsonBody<AddCommentRequest>) -> Result<String, ApiError> {
    let req = &body.value;
    let mut v = Validator::for_body(body);
    let body = v.required("body", req.body.as_deref());
    v.finish(body)
}
