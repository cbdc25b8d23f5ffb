//! 추론 응답 기록.
//!
//! 실행마다 하나씩 추가되는 [`ResponseEntry`]와 메모리 내 기록.
//! 개별 삭제는 없고 전체 삭제만 있으며, 프로세스 재시작 시 사라진다.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// 표시용 프롬프트 최대 글자 수
pub const PROMPT_DISPLAY_CHARS: usize = 50;

/// 응답 기록 항목 (`newResponse` 페이로드)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEntry {
    /// 1부터 1씩 증가 (전체 삭제 시 초기화)
    pub id: u64,
    /// 표시용 시각 문자열
    pub timestamp: String,
    /// 프레임 파일 이름 (추론 요청의 `file` 식별자)
    pub file_name: String,
    /// 저장된 사진 경로 (저장하지 않았으면 None)
    pub file_path: Option<String>,
    /// 표시용으로 잘린 프롬프트
    pub prompt: String,
    /// 응답 텍스트
    pub response: String,
    /// 전체 응답 텍스트
    pub full_response: String,
}

/// 표시용 프롬프트: 50자 초과 시 잘라서 `...` 추가
pub fn truncate_prompt(prompt: &str) -> String {
    if prompt.chars().count() > PROMPT_DISPLAY_CHARS {
        let head: String = prompt.chars().take(PROMPT_DISPLAY_CHARS).collect();
        format!("{head}...")
    } else {
        prompt.to_string()
    }
}

/// 메모리 내 응답 기록 (추가 전용, 상한 초과 시 오래된 항목부터 제거)
#[derive(Debug)]
pub struct ResponseHistory {
    entries: VecDeque<ResponseEntry>,
    next_id: u64,
    limit: usize,
}

impl ResponseHistory {
    /// 새 기록 (limit 0 → 무제한)
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            next_id: 1,
            limit,
        }
    }

    /// 새 항목 추가 후 반환
    pub fn push(
        &mut self,
        timestamp: String,
        file_name: String,
        file_path: Option<String>,
        prompt: &str,
        response: String,
    ) -> ResponseEntry {
        let entry = ResponseEntry {
            id: self.next_id,
            timestamp,
            file_name,
            file_path,
            prompt: truncate_prompt(prompt),
            full_response: response.clone(),
            response,
        };
        self.next_id += 1;
        self.entries.push_back(entry.clone());

        if self.limit > 0 {
            while self.entries.len() > self.limit {
                self.entries.pop_front();
            }
        }
        entry
    }

    /// 전체 삭제 (다음 id는 1)
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_id = 1;
    }

    /// 순서대로 복제한 스냅샷
    pub fn snapshot(&self) -> Vec<ResponseEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
