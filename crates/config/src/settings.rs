//! 전역 `settings` 섹션
//!
//! 모든 키는 [`SETTINGS_SCHEMA`]에 정의된 타입과 일치해야 하며,
//! 지정되지 않은(또는 0/빈 문자열인) 항목에는 기본값이 적용됩니다.
//!
//! # 환경변수 오버라이드
//! `LOGMETRICS_SETTINGS_{FIELD}` 형식으로 전역 설정을 덮어쓸 수 있습니다.
//! 예: `LOGMETRICS_SETTINGS_PUSH_HOST=tsdb.internal`

use serde::Serialize;
use serde_yaml::Mapping;
use tracing::warn;

use crate::error::LogMetricsError;
use crate::facility::Facility;
use crate::value::{self, KeySchema, ValueKind};

pub const DEFAULT_POLL_INTERVAL: u64 = 15;
pub const DEFAULT_PUSH_HOST: &str = "localhost";
pub const DEFAULT_PUSH_PROTO: &str = "udp";
pub const DEFAULT_PUSH_TYPE: &str = "tcollector";
pub const DEFAULT_PUSH_NUMBER: usize = 1;
pub const DEFAULT_STATS_WAIT: u64 = 60;

/// `settings` 섹션에서 허용되는 키와 타입
pub const SETTINGS_SCHEMA: KeySchema = &[
    ("poll_interval", ValueKind::Int),
    ("push_port", ValueKind::Int),
    ("push_wait", ValueKind::Int),
    ("push_number", ValueKind::Int),
    ("stats_wait", ValueKind::Int),
    ("log_facility", ValueKind::Str),
    ("push_host", ValueKind::Str),
    ("push_proto", ValueKind::Str),
    ("push_type", ValueKind::Str),
];

/// 프로세스 전역 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// 폴링 주기 (초)
    pub poll_interval: u64,
    /// 메트릭 푸시 대상 호스트
    pub push_host: String,
    /// 메트릭 푸시 대상 포트 (기본값 없음)
    pub push_port: u16,
    /// 푸시 프로토콜 (udp, tcp 등)
    pub push_proto: String,
    /// 푸시 형식 (tcollector 등)
    pub push_type: String,
    /// 병렬 푸셔 인스턴스 수
    pub push_number: usize,
    pub push_wait: u64,
    pub stats_wait: u64,
    /// 로그 출력 syslog facility
    pub log_facility: Facility,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            push_host: DEFAULT_PUSH_HOST.to_owned(),
            push_port: 0,
            push_proto: DEFAULT_PUSH_PROTO.to_owned(),
            push_type: DEFAULT_PUSH_TYPE.to_owned(),
            push_number: DEFAULT_PUSH_NUMBER,
            push_wait: 0,
            stats_wait: DEFAULT_STATS_WAIT,
            log_facility: Facility::default(),
        }
    }
}

impl Settings {
    /// `settings` 매핑을 검증하고 기본값을 적용합니다.
    ///
    /// # Errors
    /// - 스키마에 없는 키: `UnknownKey`
    /// - 타입 불일치: `TypeMismatch`
    /// - 알 수 없는 facility 이름: `UnknownFacility`
    pub fn from_mapping(mapping: &Mapping) -> Result<Self, LogMetricsError> {
        let mut settings = Self {
            poll_interval: 0,
            push_host: String::new(),
            push_proto: String::new(),
            push_type: String::new(),
            push_number: 0,
            stats_wait: 0,
            ..Self::default()
        };

        for (key, val) in mapping {
            let key = value::key_str(key, "settings")?;
            let path = value::join("settings", key);
            value::check_key(SETTINGS_SCHEMA, key, val, &path)?;

            match key {
                "poll_interval" => settings.poll_interval = value::int(val, &path)?,
                "push_port" => settings.push_port = value::int(val, &path)?,
                "push_wait" => settings.push_wait = value::int(val, &path)?,
                "push_number" => settings.push_number = value::int(val, &path)?,
                "stats_wait" => settings.stats_wait = value::int(val, &path)?,
                "log_facility" => {
                    settings.log_facility = Facility::from_name(&value::string(val, &path)?)?;
                }
                "push_host" => settings.push_host = value::string(val, &path)?,
                "push_proto" => settings.push_proto = value::string(val, &path)?,
                "push_type" => settings.push_type = value::string(val, &path)?,
                _ => {
                    return Err(LogMetricsError::UnknownKey { path });
                }
            }
        }

        settings.apply_defaults();
        Ok(settings)
    }

    /// 0 또는 빈 문자열 항목에 기본값을 채웁니다.
    fn apply_defaults(&mut self) {
        if self.poll_interval == 0 {
            self.poll_interval = DEFAULT_POLL_INTERVAL;
        }
        if self.push_host.is_empty() {
            self.push_host = DEFAULT_PUSH_HOST.to_owned();
        }
        if self.push_proto.is_empty() {
            self.push_proto = DEFAULT_PUSH_PROTO.to_owned();
        }
        if self.push_type.is_empty() {
            self.push_type = DEFAULT_PUSH_TYPE.to_owned();
        }
        if self.push_number == 0 {
            self.push_number = DEFAULT_PUSH_NUMBER;
        }
        if self.stats_wait == 0 {
            self.stats_wait = DEFAULT_STATS_WAIT;
        }
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 파싱할 수 없는 값은 경고 로그를 남기고 무시합니다.
    pub fn apply_env_overrides(&mut self) {
        override_parse(&mut self.poll_interval, "LOGMETRICS_SETTINGS_POLL_INTERVAL");
        override_string(&mut self.push_host, "LOGMETRICS_SETTINGS_PUSH_HOST");
        override_parse(&mut self.push_port, "LOGMETRICS_SETTINGS_PUSH_PORT");
        override_string(&mut self.push_proto, "LOGMETRICS_SETTINGS_PUSH_PROTO");
        override_string(&mut self.push_type, "LOGMETRICS_SETTINGS_PUSH_TYPE");
        override_parse(&mut self.push_number, "LOGMETRICS_SETTINGS_PUSH_NUMBER");
        override_parse(&mut self.push_wait, "LOGMETRICS_SETTINGS_PUSH_WAIT");
        override_parse(&mut self.stats_wait, "LOGMETRICS_SETTINGS_STATS_WAIT");
        override_parse(&mut self.log_facility, "LOGMETRICS_SETTINGS_LOG_FACILITY");

        self.apply_defaults();
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_parse<T: std::str::FromStr>(target: &mut T, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse env var override, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn parse(yaml: &str) -> Result<Settings, LogMetricsError> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        Settings::from_mapping(value.as_mapping().unwrap())
    }

    #[test]
    fn empty_settings_get_defaults() {
        let settings = parse("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.log_facility, Facility::Local0);
        assert_eq!(settings.poll_interval, 15);
        assert_eq!(settings.stats_wait, 60);
        assert_eq!(settings.push_number, 1);
        assert_eq!(settings.push_port, 0);
    }

    #[test]
    fn explicit_values_are_kept() {
        let settings = parse(
            r#"
poll_interval: 30
push_port: 4242
push_wait: 5
push_number: 4
stats_wait: 120
log_facility: local3
push_host: tsdb.internal
push_proto: tcp
push_type: opentsdb
"#,
        )
        .unwrap();

        assert_eq!(settings.poll_interval, 30);
        assert_eq!(settings.push_port, 4242);
        assert_eq!(settings.push_wait, 5);
        assert_eq!(settings.push_number, 4);
        assert_eq!(settings.stats_wait, 120);
        assert_eq!(settings.log_facility, Facility::Local3);
        assert_eq!(settings.push_host, "tsdb.internal");
        assert_eq!(settings.push_proto, "tcp");
        assert_eq!(settings.push_type, "opentsdb");
    }

    #[test]
    fn zero_values_fall_back_to_defaults() {
        let settings = parse("poll_interval: 0\npush_number: 0\nstats_wait: 0").unwrap();
        assert_eq!(settings.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(settings.push_number, DEFAULT_PUSH_NUMBER);
        assert_eq!(settings.stats_wait, DEFAULT_STATS_WAIT);
    }

    #[test]
    fn explicit_kern_facility_is_kept() {
        let settings = parse("log_facility: kern").unwrap();
        assert_eq!(settings.log_facility, Facility::Kern);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = parse("bogus: 1").unwrap_err();
        assert!(matches!(err, LogMetricsError::UnknownKey { ref path } if path == "settings.bogus"));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = parse("push_host: 42").unwrap_err();
        assert!(matches!(err, LogMetricsError::TypeMismatch { expected: "string", .. }));
    }

    #[test]
    fn unknown_facility_is_rejected() {
        let err = parse("log_facility: local42").unwrap_err();
        assert!(matches!(err, LogMetricsError::UnknownFacility(_)));
    }

    #[test]
    #[serial]
    fn env_overrides_replace_values() {
        // SAFETY: serial 테스트로 환경변수 동시 접근 없음
        unsafe {
            std::env::set_var("LOGMETRICS_SETTINGS_PUSH_HOST", "override.local");
            std::env::set_var("LOGMETRICS_SETTINGS_PUSH_NUMBER", "3");
            std::env::set_var("LOGMETRICS_SETTINGS_LOG_FACILITY", "daemon");
        }

        let mut settings = Settings::default();
        settings.apply_env_overrides();

        unsafe {
            std::env::remove_var("LOGMETRICS_SETTINGS_PUSH_HOST");
            std::env::remove_var("LOGMETRICS_SETTINGS_PUSH_NUMBER");
            std::env::remove_var("LOGMETRICS_SETTINGS_LOG_FACILITY");
        }

        assert_eq!(settings.push_host, "override.local");
        assert_eq!(settings.push_number, 3);
        assert_eq!(settings.log_facility, Facility::Daemon);
    }

    #[test]
    #[serial]
    fn invalid_env_override_is_ignored() {
        unsafe {
            std::env::set_var("LOGMETRICS_SETTINGS_PUSH_PORT", "not-a-port");
            std::env::set_var("LOGMETRICS_SETTINGS_POLL_INTERVAL", "0");
        }

        let mut settings = Settings::default();
        settings.push_port = 4242;
        settings.apply_env_overrides();

        unsafe {
            std::env::remove_var("LOGMETRICS_SETTINGS_PUSH_PORT");
            std::env::remove_var("LOGMETRICS_SETTINGS_POLL_INTERVAL");
        }

        assert_eq!(settings.push_port, 4242);
        assert_eq!(settings.poll_interval, DEFAULT_POLL_INTERVAL);
    }
}
