//! 설정 컴파일러 에러 타입
//!
//! [`LogMetricsError`]는 설정 파일 로딩부터 로그 그룹 컴파일까지의
//! 모든 실패를 표현합니다. 첫 번째 위반에서 컴파일이 중단되며,
//! 프로세스 종료 여부는 호출자(CLI)가 결정합니다.

/// 설정 컴파일 도메인 에러
///
/// `path` 필드는 문서 내 위치를 점(.)으로 연결한 경로입니다.
/// 예: `settings.bogus`, `web.date.zone`, `web.metrics.counters.data[0]`
#[derive(Debug, thiserror::Error)]
pub enum LogMetricsError {
    /// 설정 파일 읽기 실패
    #[error("io error: {path}: {source}")]
    Io {
        /// 설정 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 설정 파일 크기 초과
    #[error("config file too large: {path}: {size} bytes (max: {max})")]
    FileTooLarge {
        /// 설정 파일 경로
        path: String,
        /// 실제 크기
        size: u64,
        /// 허용 최대 크기
        max: u64,
    },

    /// YAML 문법 오류
    #[error("parse error: {path}: {reason}")]
    Parse {
        /// 입력 소스 (파일 경로 또는 식별자)
        path: String,
        /// 파서 에러 메시지
        reason: String,
    },

    /// 문서 구조 오류 (루트가 매핑이 아님, 필수 필드 누락, 규칙 길이 부족 등)
    #[error("malformed config at {path}: {reason}")]
    Malformed {
        /// 문서 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 인식할 수 없는 키
    #[error("Unknown key {path}")]
    UnknownKey {
        /// 문서 경로
        path: String,
    },

    /// 알려진 키지만 값의 타입이 다름
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// 문서 경로
        path: String,
        /// 기대 타입
        expected: &'static str,
        /// 실제 타입
        found: &'static str,
    },

    /// 지원하지 않는 메트릭 연산 (add, sub 외)
    #[error("Operation {operation} no supported at {path}")]
    UnsupportedOperation {
        /// 문서 경로
        path: String,
        /// 연산 이름
        operation: String,
    },

    /// 정규식 컴파일 실패
    #[error("regex error in group '{group}': {source}")]
    Regex {
        /// 로그 그룹 이름
        group: String,
        /// 원본 regex 에러
        source: regex::Error,
    },

    /// 알 수 없는 syslog facility 이름
    #[error("Unable to map log_facility: {0}")]
    UnknownFacility(String),

    /// 범위를 벗어난 값 (음수, 타입 범위 초과 등)
    #[error("invalid value at {path}: {reason}")]
    InvalidValue {
        /// 문서 경로
        path: String,
        /// 실패 사유
        reason: String,
    },
}

impl LogMetricsError {
    /// 설정 내용 자체의 문제인지 여부 (I/O 실패와 구분)
    pub fn is_config_error(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_display_names_full_path() {
        let err = LogMetricsError::UnknownKey {
            path: "settings.bogus".to_owned(),
        };
        assert_eq!(err.to_string(), "Unknown key settings.bogus");
    }

    #[test]
    fn unsupported_operation_display_names_operation() {
        let err = LogMetricsError::UnsupportedOperation {
            path: "web.metrics.counters.data[0]".to_owned(),
            operation: "mul".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("mul"));
        assert!(msg.contains("data[0]"));
    }

    #[test]
    fn type_mismatch_display() {
        let err = LogMetricsError::TypeMismatch {
            path: "web.goroutines".to_owned(),
            expected: "int",
            found: "bool",
        };
        let msg = err.to_string();
        assert!(msg.contains("web.goroutines"));
        assert!(msg.contains("int"));
        assert!(msg.contains("bool"));
    }

    #[test]
    fn io_error_is_not_config_error() {
        let err = LogMetricsError::Io {
            path: "/nonexistent.yml".to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(!err.is_config_error());
        assert!(LogMetricsError::UnknownFacility("bogus".to_owned()).is_config_error());
    }
}
