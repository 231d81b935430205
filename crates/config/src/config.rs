//! 설정 컴파일러 -- YAML 트리를 [`Config`]로 변환합니다.
//!
//! 두 단계로 루트 매핑을 순회합니다.
//! 1. `settings` 섹션 검증 및 기본값 적용
//! 2. 나머지 모든 최상위 키를 로그 그룹으로 컴파일
//!
//! 첫 번째 위반에서 즉시 중단하며, 일부만 적용된 `Config`는 반환하지 않습니다.
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logmetrics_config::LogMetricsError> {
//! use logmetrics_config::Config;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = Config::load("/etc/logmetrics/logmetrics.yml").await?;
//! println!("pushers: {}", config.pusher_number());
//!
//! // YAML 문자열에서 직접 컴파일
//! let config = Config::parse("settings: {}\nweb:\n  re: '(\\d+)'\n", "inline")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_yaml::Value;

use crate::error::LogMetricsError;
use crate::group::LogGroup;
use crate::loader::DocumentLoader;
use crate::settings::Settings;
use crate::value::{self, ValueKind};

/// 전역 설정 섹션 키
pub const SETTINGS_KEY: &str = "settings";

/// 컴파일된 프로세스 전역 설정
///
/// 프로세스 시작(또는 리로드) 시 한 번 생성되어 하위 컴포넌트에 전달됩니다.
#[derive(Debug, Serialize)]
pub struct Config {
    /// 전역 설정
    pub settings: Settings,
    /// 그룹 이름 -> 로그 그룹
    pub log_groups: BTreeMap<String, LogGroup>,
}

impl Config {
    /// 설정 파일을 로드하고 컴파일한 뒤 환경변수 오버라이드를 적용합니다.
    ///
    /// 로딩 순서:
    /// 1. 파일 읽기 및 YAML 파싱
    /// 2. 컴파일 (검증 + 기본값 + 채널 할당)
    /// 3. `settings` 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogMetricsError> {
        let path = path.as_ref();
        let document = DocumentLoader::read_file(path).await?;
        let mut config = Self::compile(&document)?;
        config.settings.apply_env_overrides();

        tracing::info!(
            path = %path.display(),
            groups = config.log_groups.len(),
            pushers = config.settings.push_number,
            "loaded logmetrics config"
        );

        Ok(config)
    }

    /// YAML 문자열을 컴파일합니다 (환경변수 오버라이드 없음).
    pub fn parse(yaml_str: &str, source: &str) -> Result<Self, LogMetricsError> {
        let document = DocumentLoader::parse_str(yaml_str, source)?;
        Self::compile(&document)
    }

    /// 파싱된 문서 트리를 컴파일합니다.
    ///
    /// # Errors
    /// - 루트가 매핑이 아니거나 `settings`가 없으면 `Malformed`
    /// - 그 외 검증 실패는 [`Settings::from_mapping`], [`LogGroup::from_mapping`] 참고
    pub fn compile(document: &Value) -> Result<Self, LogMetricsError> {
        let root = document
            .as_mapping()
            .ok_or_else(|| LogMetricsError::Malformed {
                path: "(root)".to_owned(),
                reason: format!(
                    "document root must be a mapping, found {}",
                    ValueKind::of(document).name()
                ),
            })?;

        let settings = match root.get(SETTINGS_KEY) {
            Some(section) => Settings::from_mapping(value::mapping(section, SETTINGS_KEY)?)?,
            None => {
                return Err(LogMetricsError::Malformed {
                    path: "(root)".to_owned(),
                    reason: format!("missing required section '{SETTINGS_KEY}'"),
                });
            }
        };

        let mut log_groups = BTreeMap::new();
        for (name, content) in root {
            let name = value::key_str(name, "(root)")?;
            if name == SETTINGS_KEY {
                continue;
            }

            let group = LogGroup::from_mapping(name, value::mapping(content, name)?)?;
            tracing::debug!(
                group = %name,
                goroutines = group.goroutines,
                metrics = group.metrics.len(),
                tags = group.tag_count(),
                "compiled log group"
            );
            log_groups.insert(name.to_owned(), group);
        }

        Ok(Self {
            settings,
            log_groups,
        })
    }

    /// 병렬 메트릭 푸셔 수
    pub fn pusher_number(&self) -> usize {
        self.settings.push_number
    }

    /// 이름으로 로그 그룹을 조회합니다.
    pub fn group(&self, name: &str) -> Option<&LogGroup> {
        self.log_groups.get(name)
    }

    /// 이름으로 로그 그룹을 가변 조회합니다 (수신 채널 인계용).
    pub fn group_mut(&mut self, name: &str) -> Option<&mut LogGroup> {
        self.log_groups.get_mut(name)
    }

    /// 그룹 이름 목록 (정렬됨)
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.log_groups.keys().map(String::as_str)
    }

    /// 채널 인스턴스를 제외한 구조적 동등성
    pub fn same_definition(&self, other: &Self) -> bool {
        self.settings == other.settings
            && self.log_groups.len() == other.log_groups.len()
            && self.log_groups.iter().all(|(name, group)| {
                other
                    .log_groups
                    .get(name)
                    .is_some_and(|o| group.same_definition(o))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facility::Facility;
    use crate::metrics::Operation;

    const SAMPLE: &str = r#"
settings:
  poll_interval: 10
  push_host: tsdb
  push_number: 2
web:
  files: ["/var/log/web.log"]
  re: '^(\w+) \n # method\n (\d+)$'
  expected_matches: 2
  key_prefix: web
  tags: {method: 1}
  metrics:
    counters:
      key_suffix: status
      data:
        - [2, "status", {add: [1]}]
worker:
  goroutines: 3
"#;

    #[test]
    fn compile_sample_document() {
        let config = Config::parse(SAMPLE, "sample").unwrap();

        assert_eq!(config.settings.poll_interval, 10);
        assert_eq!(config.settings.push_host, "tsdb");
        assert_eq!(config.pusher_number(), 2);
        assert_eq!(config.settings.log_facility, Facility::Local0);

        assert_eq!(config.group_names().collect::<Vec<_>>(), vec!["web", "worker"]);

        let web = config.group("web").unwrap();
        assert_eq!(web.pattern(), Some("^(\\w+)(\\d+)$"));
        assert_eq!(web.metrics[&2].operations[&Operation::Add], vec![1]);
        assert_eq!(web.tail_data.len(), 1);

        let worker = config.group("worker").unwrap();
        assert_eq!(worker.goroutines, 3);
        assert_eq!(worker.tail_data.len(), 3);
    }

    #[test]
    fn compile_is_deterministic() {
        let a = Config::parse(SAMPLE, "a").unwrap();
        let b = Config::parse(SAMPLE, "b").unwrap();
        assert!(a.same_definition(&b));
    }

    #[test]
    fn missing_settings_is_malformed() {
        let err = Config::parse("web: {}\n", "no-settings").unwrap_err();
        assert!(matches!(err, LogMetricsError::Malformed { .. }));
    }

    #[test]
    fn non_mapping_root_is_malformed() {
        let err = Config::parse("- a\n- b\n", "list").unwrap_err();
        assert!(matches!(err, LogMetricsError::Malformed { .. }));
    }

    #[test]
    fn non_mapping_group_is_rejected() {
        let err = Config::parse("settings: {}\nweb: 3\n", "scalar-group").unwrap_err();
        assert!(matches!(err, LogMetricsError::TypeMismatch { ref path, .. } if path == "web"));
    }

    #[test]
    fn unknown_settings_key_aborts() {
        let err = Config::parse("settings:\n  bogus: 1\n", "bogus").unwrap_err();
        assert!(matches!(err, LogMetricsError::UnknownKey { ref path } if path == "settings.bogus"));
    }

    #[test]
    fn settings_only_document_has_no_groups() {
        let config = Config::parse("settings: {}\n", "empty").unwrap();
        assert!(config.log_groups.is_empty());
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn first_error_in_document_order_is_reported() {
        let err = Config::parse(
            "settings: {}\nalpha:\n  bogus_a: 1\nbeta:\n  bogus_b: 1\n",
            "order",
        )
        .unwrap_err();
        assert!(matches!(err, LogMetricsError::UnknownKey { ref path } if path == "alpha.bogus_a"));
    }
}
