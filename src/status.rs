//! Display labels for backend status and type codes.

/// Estimates can be approved, rejected or sent back only while submitted.
pub const ESTIMATE_ACTIONABLE_STATUS: &str = "2";

pub const TASK_TYPES: [(u8, &str); 7] = [
    (1, "계약"),
    (2, "기획"),
    (3, "디자인"),
    (4, "프론트엔드"),
    (5, "백엔드"),
    (6, "유지보수"),
    (7, "기타"),
];

pub fn maintenance_status_label(code: &str) -> &str {
    let label = match code.trim() {
        "1" => Some("접수"),
        "2" => Some("알림"),
        "3" => Some("처리중"),
        "4" => Some("완료"),
        _ => None,
    };
    label.unwrap_or(code)
}

pub fn maintenance_in_progress(code: &str) -> bool {
    matches!(code.trim(), "2" | "3")
}

pub fn task_status_label(code: &str) -> &str {
    let label = match code.trim() {
        "1" => Some("대기"),
        "2" => Some("진행중"),
        "3" => Some("완료"),
        "4" => Some("보류"),
        _ => None,
    };
    label.unwrap_or(code)
}

pub fn task_in_progress(code: &str) -> bool {
    code.trim() == "2"
}

pub fn estimate_status_label(code: &str) -> &str {
    let label = match code.trim() {
        "1" => Some("작성중"),
        "2" => Some("제출"),
        "3" => Some("승인"),
        "4" => Some("반려"),
        "5" => Some("계약전환"),
        _ => None,
    };
    label.unwrap_or(code)
}

pub fn estimate_actions_allowed(code: &str) -> bool {
    code.trim() == ESTIMATE_ACTIONABLE_STATUS
}

pub fn task_type_label(code: u8) -> Option<&'static str> {
    TASK_TYPES
        .iter()
        .find(|(value, _)| *value == code)
        .map(|(_, label)| *label)
}
