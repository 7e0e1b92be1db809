//! Attachment selection rules: per-form allow-lists, size and count caps.

use std::path::{Path, PathBuf};

use hcms_api::FileUpload;
use serde::Deserialize;
use tokio::fs as async_fs;

use crate::bridge::{FileSelectionView, SelectedFileView, Toast};

pub const MAX_FILES: usize = 10;
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

const TASK_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "pdf", "doc", "docx", "xls", "xlsx", "ppt",
    "pptx", "hwp", "hwpx", "txt", "csv", "zip", "rar", "7z",
];

const INQUIRY_DOCUMENT_EXTENSIONS: &[&str] =
    &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "zip"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileTypeRule {
    Any,
    Extensions(&'static [&'static str]),
    /// Any `image/*` type plus the listed extensions.
    ImagesOr(&'static [&'static str]),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_files: usize,
    pub max_file_bytes: u64,
    pub file_types: FileTypeRule,
}

impl UploadPolicy {
    pub const TASK: UploadPolicy = UploadPolicy {
        max_files: MAX_FILES,
        max_file_bytes: MAX_FILE_BYTES,
        file_types: FileTypeRule::Extensions(TASK_EXTENSIONS),
    };

    pub const INQUIRY: UploadPolicy = UploadPolicy {
        max_files: MAX_FILES,
        max_file_bytes: MAX_FILE_BYTES,
        file_types: FileTypeRule::ImagesOr(INQUIRY_DOCUMENT_EXTENSIONS),
    };

    pub const MAINTENANCE: UploadPolicy = UploadPolicy {
        max_files: MAX_FILES,
        max_file_bytes: MAX_FILE_BYTES,
        file_types: FileTypeRule::Any,
    };

    /// Comments carry a single attachment.
    pub const COMMENT: UploadPolicy = UploadPolicy {
        max_files: 1,
        max_file_bytes: MAX_FILE_BYTES,
        file_types: FileTypeRule::Any,
    };

    pub fn accepts_type(&self, file_name: &str) -> bool {
        let extension = file_extension(file_name);
        match self.file_types {
            FileTypeRule::Any => true,
            FileTypeRule::Extensions(allowed) => allowed.contains(&extension.as_str()),
            FileTypeRule::ImagesOr(allowed) => {
                allowed.contains(&extension.as_str()) || guess_mime(file_name).starts_with("image/")
            }
        }
    }
}

/// Which submission a file pick belongs to.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadForm {
    Task,
    Inquiry,
    Maintenance,
    Comment,
}

impl UploadForm {
    pub fn policy(self) -> UploadPolicy {
        match self {
            UploadForm::Task => UploadPolicy::TASK,
            UploadForm::Inquiry => UploadPolicy::INQUIRY,
            UploadForm::Maintenance => UploadPolicy::MAINTENANCE,
            UploadForm::Comment => UploadPolicy::COMMENT,
        }
    }
}

fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

pub fn guess_mime(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Something the user picked that may end up in a multipart submission.
pub trait UploadCandidate {
    fn file_name(&self) -> &str;
    fn size(&self) -> u64;

    /// Local path the webview hands back on submit, when there is one.
    fn source_path(&self) -> Option<String> {
        None
    }
}

impl UploadCandidate for FileUpload {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// File chosen through the native picker; bytes are read only when submitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

impl UploadCandidate for PickedFile {
    fn file_name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn source_path(&self) -> Option<String> {
        Some(self.path.display().to_string())
    }
}

impl PickedFile {
    pub async fn from_path(path: impl Into<PathBuf>) -> Result<Self, String> {
        let path = path.into();
        let metadata = async_fs::metadata(&path)
            .await
            .map_err(|err| format!("Failed to inspect {}: {}", path.display(), err))?;
        if !metadata.is_file() {
            return Err(format!("{} is not a file", path.display()));
        }
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| format!("{} has no usable file name", path.display()))?;
        Ok(PickedFile {
            path,
            name,
            size: metadata.len(),
        })
    }

    pub async fn load(self) -> Result<FileUpload, String> {
        let bytes = async_fs::read(&self.path)
            .await
            .map_err(|err| format!("Failed to read {}: {}", self.name, err))?;
        Ok(FileUpload {
            mime_type: guess_mime(&self.name),
            file_name: self.name,
            bytes,
        })
    }
}

pub async fn load_all(files: Vec<PickedFile>) -> Result<Vec<FileUpload>, String> {
    let mut uploads = Vec::with_capacity(files.len());
    for file in files {
        uploads.push(file.load().await?);
    }
    Ok(uploads)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileSelection<C> {
    pub accepted: Vec<C>,
    pub toasts: Vec<Toast>,
}

impl<C: UploadCandidate> FileSelection<C> {
    pub fn view(&self) -> FileSelectionView {
        FileSelectionView {
            accepted: self
                .accepted
                .iter()
                .map(|file| SelectedFileView {
                    path: file.source_path(),
                    name: file.file_name().to_string(),
                    size: file.size(),
                    size_label: format_file_size(file.size()),
                })
                .collect(),
            toasts: self.toasts.clone(),
        }
    }
}

/// Adds `picked` to the files already attached.
///
/// Disallowed or oversize files are dropped with an error toast each. When the
/// result would exceed the cap it is truncated to the cap with a warning.
pub fn select_files<C: UploadCandidate>(policy: &UploadPolicy, existing: Vec<C>, picked: Vec<C>) -> FileSelection<C> {
    let mut toasts = Vec::new();
    let mut accepted = existing;

    for file in picked {
        if !policy.accepts_type(file.file_name()) {
            toasts.push(Toast::error(format!(
                "{}은(는) 허용되지 않는 파일 형식입니다.",
                file.file_name()
            )));
            continue;
        }
        if file.size() > policy.max_file_bytes {
            toasts.push(Toast::error(format!(
                "{}은(는) {}를 초과합니다.",
                file.file_name(),
                format_file_size(policy.max_file_bytes).replace(' ', "")
            )));
            continue;
        }
        accepted.push(file);
    }

    if accepted.len() > policy.max_files {
        accepted.truncate(policy.max_files);
        toasts.push(Toast::warning(format!(
            "최대 {}개까지만 첨부할 수 있습니다.",
            policy.max_files
        )));
    }

    FileSelection { accepted, toasts }
}

/// `512 B`, `1.5 KB`, `10 MB`: one decimal, trailing `.0` dropped.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 10.0).round() / 10.0;
    let mut text = format!("{:.1}", rounded);
    if text.ends_with(".0") {
        text.truncate(text.len() - 2);
    }
    format!("{} {}", text, UNITS[unit])
}
