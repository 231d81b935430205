//! 설정 문서 로더 -- 파일을 읽어 동적 타입 YAML 트리로 역직렬화합니다.

use std::path::Path;

use serde_yaml::Value;

use crate::error::LogMetricsError;

/// 설정 파일 최대 크기
pub const MAX_CONFIG_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// 설정 문서 로더
pub struct DocumentLoader;

impl DocumentLoader {
    /// 파일 전체를 읽어 YAML 트리로 파싱합니다.
    ///
    /// # Errors
    /// - 파일 메타데이터 또는 내용을 읽을 수 없는 경우 `Io`
    /// - 파일이 `MAX_CONFIG_FILE_SIZE`를 초과하는 경우 `FileTooLarge`
    /// - YAML 문법 오류인 경우 `Parse`
    pub async fn read_file(path: impl AsRef<Path>) -> Result<Value, LogMetricsError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|source| LogMetricsError::Io {
                path: display.clone(),
                source,
            })?;

        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(LogMetricsError::FileTooLarge {
                path: display,
                size: metadata.len(),
                max: MAX_CONFIG_FILE_SIZE,
            });
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LogMetricsError::Io {
                path: display.clone(),
                source,
            })?;

        Self::parse_str(&content, &display)
    }

    /// YAML 문자열을 트리로 파싱합니다.
    pub fn parse_str(yaml_str: &str, source: &str) -> Result<Value, LogMetricsError> {
        serde_yaml::from_str(yaml_str).map_err(|e| LogMetricsError::Parse {
            path: source.to_owned(),
            reason: format!("YAML parse error: {e}"),
        })
    }
}
