//! 확장 정규식 전처리
//!
//! `regex` 크레이트 문법에 공백과 `#` 주석을 허용하는 작성 규칙을 적용합니다.
//! 컴파일 전에 다음 순서로 평탄화합니다.
//!
//! 1. 모든 공백 문자(` `) 제거 (문자 클래스 내부 포함)
//! 2. 두 글자 이스케이프 `\n`을 기준으로 논리 라인 분리
//! 3. 각 라인에서 첫 `#`부터 라인 끝까지 제거
//! 4. 구분자 없이 다시 연결
//!
//! `#` 문자 자체는 이 방식으로 매칭할 수 없습니다.

use regex::Regex;

use crate::error::LogMetricsError;

/// 확장 문법 패턴을 평탄화한 문자열을 반환합니다.
pub fn clean_extended_regex(raw: &str) -> String {
    let no_spaces = raw.replace(' ', "");

    no_spaces
        .split("\\n")
        .map(|line| line.split('#').next().unwrap_or_default())
        .collect()
}

/// 확장 문법 패턴을 평탄화하고 컴파일합니다.
///
/// # Errors
/// 평탄화된 패턴이 유효하지 않으면 `Regex` 에러를 반환합니다.
pub fn compile_extended(group: &str, raw: &str) -> Result<Regex, LogMetricsError> {
    let clean = clean_extended_regex(raw);

    tracing::debug!(group = %group, pattern = %clean, "cleaned regex");

    Regex::new(&clean).map_err(|source| LogMetricsError::Regex {
        group: group.to_owned(),
        source,
    })
}
