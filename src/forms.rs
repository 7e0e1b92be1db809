//! Client-side form checks run before any request is sent.
//!
//! Each validator returns the request payload on success or the message the
//! webview shows as an error toast.

use hcms_api::models::{ChangePasswordRequest, LoginRequest, RevisionRequest};
use hcms_api::{FileUpload, NewComment, NewInquiry, NewInquiryAnswer, NewMaintenanceRequest, NewTask};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::status::task_type_label;

static HTML_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("invalid html tag regex"));

const PASSWORD_SPECIALS: &str = "@$!%*#?&";
pub const MIN_LOGIN_ID_CHARS: usize = 2;
pub const MIN_PASSWORD_CHARS: usize = 4;
pub const MIN_NEW_PASSWORD_CHARS: usize = 8;

/// Text left after removing markup, trimmed.
pub fn strip_html(value: &str) -> String {
    HTML_TAG_REGEX.replace_all(value, "").trim().to_string()
}

fn require(value: &str, message: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(message.to_string())
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub login_id: String,
    pub password: String,
}

/// Site key precedence: the `key` query parameter, then the configured default.
pub fn validate_login(form: LoginForm, query_site_key: Option<&str>, default_site_key: Option<&str>) -> Result<LoginRequest, String> {
    if form.login_id.chars().count() < MIN_LOGIN_ID_CHARS {
        return Err("아이디를 2자 이상 입력해주세요".to_string());
    }
    if form.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err("비밀번호를 4자 이상 입력해주세요".to_string());
    }
    let site_key = query_site_key
        .or(default_site_key)
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string);
    Ok(LoginRequest {
        login_id: form.login_id,
        password: form.password,
        site_key,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

fn is_strong_password(value: &str) -> bool {
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c));
    allowed
        && value.chars().count() >= MIN_NEW_PASSWORD_CHARS
        && value.chars().any(|c| c.is_ascii_alphabetic())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

pub fn validate_change_password(form: ChangePasswordForm) -> Result<ChangePasswordRequest, String> {
    if form.current_password.is_empty() {
        return Err("현재 비밀번호를 입력해주세요".to_string());
    }
    if form.new_password.chars().count() < MIN_NEW_PASSWORD_CHARS {
        return Err("비밀번호는 최소 8자 이상이어야 합니다".to_string());
    }
    if !is_strong_password(&form.new_password) {
        return Err("영문자, 숫자, 특수문자(@$!%*#?&)를 모두 포함해야 합니다".to_string());
    }
    if form.confirm_password.is_empty() {
        return Err("비밀번호 확인을 입력해주세요".to_string());
    }
    if form.new_password != form.confirm_password {
        return Err("새 비밀번호와 확인 비밀번호가 일치하지 않습니다".to_string());
    }
    Ok(ChangePasswordRequest {
        current_password: form.current_password,
        new_password: form.new_password,
        confirm_password: form.confirm_password,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceForm {
    pub project_id: Option<i64>,
    pub title: String,
    /// Editor HTML.
    pub contents: String,
}

pub fn validate_maintenance(form: MaintenanceForm, files: Vec<FileUpload>) -> Result<NewMaintenanceRequest, String> {
    let project_id = form
        .project_id
        .ok_or_else(|| "프로젝트를 선택해주세요.".to_string())?;
    require(&form.title, "제목을 입력해주세요.")?;
    if strip_html(&form.contents).is_empty() {
        return Err("내용을 입력해주세요.".to_string());
    }
    Ok(NewMaintenanceRequest {
        project_id,
        title: form.title,
        contents: form.contents,
        files,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskForm {
    pub task_type: Option<u8>,
    pub title: String,
    pub content: String,
}

pub fn validate_task(form: TaskForm, files: Vec<FileUpload>) -> Result<NewTask, String> {
    let task_type = form
        .task_type
        .filter(|code| task_type_label(*code).is_some())
        .ok_or_else(|| "작업 유형을 선택해주세요.".to_string())?;
    require(&form.title, "제목을 입력해주세요.")?;
    require(&form.content, "내용을 입력해주세요.")?;
    Ok(NewTask {
        task_type,
        title: form.title,
        content: form.content,
        files,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct InquiryForm {
    pub inquiry_type: Option<i32>,
    pub title: String,
    pub contents: String,
}

pub fn validate_inquiry(form: InquiryForm, files: Vec<FileUpload>) -> Result<NewInquiry, String> {
    require(&form.title, "제목을 입력해주세요.")?;
    require(&form.contents, "내용을 입력해주세요.")?;
    let inquiry_type = form
        .inquiry_type
        .ok_or_else(|| "문의 유형을 선택해주세요.".to_string())?;
    Ok(NewInquiry {
        inquiry_type,
        title: form.title.trim().to_string(),
        contents: form.contents.trim().to_string(),
        files,
    })
}

pub fn validate_comment(content: String, parent_id: Option<i64>, attachment: Option<FileUpload>) -> Result<NewComment, String> {
    require(&content, "댓글 내용을 입력해주세요.")?;
    Ok(NewComment {
        content,
        parent_id,
        attachment,
    })
}

pub fn validate_answer(content: String, parent_answer_id: Option<i64>) -> Result<NewInquiryAnswer, String> {
    require(&content, "답변 내용을 입력해주세요.")?;
    Ok(NewInquiryAnswer {
        content,
        parent_answer_id,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevisionForm {
    #[serde(default)]
    pub requester_name: String,
    pub title: String,
    pub content: String,
}

pub fn validate_revision(form: RevisionForm) -> Result<RevisionRequest, String> {
    if form.title.trim().is_empty() || form.content.trim().is_empty() {
        return Err("수정 제목과 내용을 모두 입력해 주세요.".to_string());
    }
    Ok(RevisionRequest {
        requester_name: form.requester_name.trim().to_string(),
        title: form.title.trim().to_string(),
        content: form.content.trim().to_string(),
    })
}
