//! 로그 그룹 정의
//!
//! 최상위 키 중 `settings`를 제외한 모든 키는 하나의 [`LogGroup`]입니다.
//!
//! # YAML 스키마
//! ```yaml
//! nginx_access:
//!   files: ["/var/log/nginx/access.log*"]
//!   re: '^(\S+) \s+ # client ip \n \[([^\]]+)\] \s+ "(\w+) \s+ ([^"]+)" \s+ (\d+)'
//!   expected_matches: 5
//!   date:
//!     position: 2
//!     format: "%d/%b/%Y:%H:%M:%S %z"
//!   key_prefix: nginx
//!   tags: {method: 3}
//!   metrics:
//!     counters:
//!       key_suffix: requests
//!       data:
//!         - [5, "status"]
//!   goroutines: 2
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Serialize, Serializer};
use serde_yaml::Mapping;
use tokio::sync::mpsc;

use crate::channel::{self, MatchedFields, TailChannel};
use crate::error::LogMetricsError;
use crate::metrics::{self, KeyExtract};
use crate::pattern;
use crate::value::{self, KeySchema, ValueKind};

pub const DEFAULT_GOROUTINES: usize = 1;
/// 그룹당 tail 채널 수 상한
pub const MAX_GOROUTINES: usize = 4096;
pub const DEFAULT_HISTOGRAM_SIZE: usize = 512;
pub const DEFAULT_HISTOGRAM_ALPHA_DECAY: f64 = 0.15;
pub const DEFAULT_HISTOGRAM_RESCALE_THRESHOLD_MIN: u64 = 60;

/// 로그 그룹 매핑에서 허용되는 키와 타입
pub const GROUP_SCHEMA: KeySchema = &[
    ("re", ValueKind::Str),
    ("key_prefix", ValueKind::Str),
    ("interval", ValueKind::Int),
    ("ewma_interval", ValueKind::Int),
    ("expected_matches", ValueKind::Int),
    ("histogram_size", ValueKind::Int),
    ("goroutines", ValueKind::Int),
    ("histogram_rescale_threshold_min", ValueKind::Int),
    ("workload_split_on", ValueKind::Int),
    ("histogram_alpha_decay", ValueKind::Float),
    ("warn_on_regex_fail", ValueKind::Bool),
    ("parse_from_start", ValueKind::Bool),
    ("warn_on_operation_fail", ValueKind::Bool),
    ("files", ValueKind::Seq),
    ("tags", ValueKind::Map),
    ("metrics", ValueKind::Map),
    ("date", ValueKind::Map),
];

const DATE_SCHEMA: KeySchema = &[("position", ValueKind::Int), ("format", ValueKind::Str)];

/// 하나의 이름 있는 모니터링 단위
///
/// `tail_data`에는 항상 `goroutines`개의 채널이 순서대로 들어 있습니다.
/// `last_date_str`, `last_date`는 하위 매처 전용 작업 필드입니다.
#[derive(Debug, Serialize)]
pub struct LogGroup {
    /// 그룹 이름 (문서 키)
    pub name: String,
    /// tail 대상 glob 패턴 목록
    pub glob_files: Vec<String>,
    /// 전처리 후 컴파일된 정규식
    #[serde(serialize_with = "serialize_regex")]
    pub re: Option<Regex>,
    /// 기대 캡처 그룹 수
    pub expected_matches: usize,

    /// 타임스탬프 캡처 위치
    pub date_position: usize,
    /// 타임스탬프 파싱 형식
    pub date_format: String,

    /// 메트릭 키 네임스페이스
    pub key_prefix: String,
    /// 태그 이름 -> 캡처 위치
    pub tags: BTreeMap<String, usize>,
    /// 캡처 위치 -> 추출 규칙
    pub metrics: BTreeMap<usize, KeyExtract>,

    pub histogram_size: usize,
    pub histogram_alpha_decay: f64,
    pub histogram_rescale_threshold_min: u64,
    pub ewma_interval: u64,

    /// 하위 tail 워커 fan-out 수
    pub goroutines: usize,
    pub workload_split_on: usize,
    pub interval: u64,

    pub fail_operation_warn: bool,
    pub parse_from_start: bool,
    pub fail_regex_warn: bool,

    #[serde(skip)]
    pub tail_data: Vec<TailChannel>,

    #[serde(skip)]
    pub last_date_str: String,
    #[serde(skip)]
    pub last_date: Option<DateTime<Utc>>,
}

fn serialize_regex<S: Serializer>(re: &Option<Regex>, serializer: S) -> Result<S::Ok, S::Error> {
    match re {
        Some(re) => serializer.serialize_some(re.as_str()),
        None => serializer.serialize_none(),
    }
}

impl LogGroup {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            glob_files: Vec::new(),
            re: None,
            expected_matches: 0,
            date_position: 0,
            date_format: String::new(),
            key_prefix: String::new(),
            tags: BTreeMap::new(),
            metrics: BTreeMap::new(),
            histogram_size: 0,
            histogram_alpha_decay: 0.0,
            histogram_rescale_threshold_min: 0,
            ewma_interval: 0,
            goroutines: 0,
            workload_split_on: 0,
            interval: 0,
            fail_operation_warn: false,
            parse_from_start: false,
            fail_regex_warn: false,
            tail_data: Vec::new(),
            last_date_str: String::new(),
            last_date: None,
        }
    }

    /// 그룹 매핑을 검증하고 기본값 적용 후 tail 채널을 할당합니다.
    ///
    /// # Errors
    /// - 스키마에 없는 키 (`date` 하위 키 포함): `UnknownKey`
    /// - 타입 불일치: `TypeMismatch`
    /// - `goroutines`가 [`MAX_GOROUTINES`] 초과: `InvalidValue`
    /// - 정규식 컴파일 실패: `Regex`
    /// - `metrics` 규칙 오류: [`metrics::parse_metrics`] 참고
    pub fn from_mapping(name: &str, mapping: &Mapping) -> Result<Self, LogMetricsError> {
        let mut group = Self::empty(name);

        for (key, val) in mapping {
            let key = value::key_str(key, name)?;
            let path = value::join(name, key);
            value::check_key(GROUP_SCHEMA, key, val, &path)?;

            match key {
                "re" => group.re = Some(pattern::compile_extended(name, &value::string(val, &path)?)?),
                "key_prefix" => group.key_prefix = value::string(val, &path)?,
                "interval" => group.interval = value::int(val, &path)?,
                "ewma_interval" => group.ewma_interval = value::int(val, &path)?,
                "expected_matches" => group.expected_matches = value::int(val, &path)?,
                "histogram_size" => group.histogram_size = value::int(val, &path)?,
                "goroutines" => group.goroutines = value::int(val, &path)?,
                "histogram_rescale_threshold_min" => {
                    group.histogram_rescale_threshold_min = value::int(val, &path)?;
                }
                "workload_split_on" => group.workload_split_on = value::int(val, &path)?,
                "histogram_alpha_decay" => group.histogram_alpha_decay = value::float(val, &path)?,
                "warn_on_regex_fail" => group.fail_regex_warn = value::boolean(val, &path)?,
                "parse_from_start" => group.parse_from_start = value::boolean(val, &path)?,
                "warn_on_operation_fail" => group.fail_operation_warn = value::boolean(val, &path)?,
                "files" => {
                    for (idx, file) in value::seq(val, &path)?.iter().enumerate() {
                        group
                            .glob_files
                            .push(value::string(file, &format!("{path}[{idx}]"))?);
                    }
                }
                "tags" => {
                    for (tag, pos) in value::mapping(val, &path)? {
                        let tag = value::key_str(tag, &path)?;
                        let position = value::int(pos, &value::join(&path, tag))?;
                        group.tags.insert(tag.to_owned(), position);
                    }
                }
                "metrics" => group.metrics = metrics::parse_metrics(value::mapping(val, &path)?, &path)?,
                "date" => group.parse_date(value::mapping(val, &path)?, &path)?,
                _ => {
                    return Err(LogMetricsError::UnknownKey { path });
                }
            }
        }

        group.apply_defaults();
        if group.goroutines > MAX_GOROUTINES {
            return Err(LogMetricsError::InvalidValue {
                path: value::join(name, "goroutines"),
                reason: format!(
                    "{} exceeds the maximum of {MAX_GOROUTINES} tail channels",
                    group.goroutines
                ),
            });
        }
        group.tail_data = channel::allocate(group.goroutines);

        Ok(group)
    }

    fn parse_date(&mut self, date: &Mapping, path: &str) -> Result<(), LogMetricsError> {
        for (key, val) in date {
            let key = value::key_str(key, path)?;
            let key_path = value::join(path, key);
            value::check_key(DATE_SCHEMA, key, val, &key_path)?;

            match key {
                "position" => self.date_position = value::int(val, &key_path)?,
                "format" => self.date_format = value::string(val, &key_path)?,
                _ => return Err(LogMetricsError::UnknownKey { path: key_path }),
            }
        }
        Ok(())
    }

    fn apply_defaults(&mut self) {
        if self.goroutines == 0 {
            self.goroutines = DEFAULT_GOROUTINES;
        }
        if self.histogram_alpha_decay == 0.0 {
            self.histogram_alpha_decay = DEFAULT_HISTOGRAM_ALPHA_DECAY;
        }
        if self.histogram_size == 0 {
            self.histogram_size = DEFAULT_HISTOGRAM_SIZE;
        }
        if self.histogram_rescale_threshold_min == 0 {
            self.histogram_rescale_threshold_min = DEFAULT_HISTOGRAM_RESCALE_THRESHOLD_MIN;
        }
    }

    /// 태그 수
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// 정규식 원문 (평탄화 후)
    pub fn pattern(&self) -> Option<&str> {
        self.re.as_ref().map(Regex::as_str)
    }

    /// tail 워커용 송신 핸들을 채널 순서대로 반환합니다.
    ///
    /// [`close_tail_senders`](Self::close_tail_senders) 이후에는 빈 목록입니다.
    pub fn tail_senders(&self) -> Vec<mpsc::Sender<MatchedFields>> {
        self.tail_data.iter().filter_map(TailChannel::sender).collect()
    }

    /// 그룹이 보관한 송신 핸들을 모두 해제합니다.
    ///
    /// 워커에 핸들을 나눠준 뒤 호출하면, 워커가 모두 종료되었을 때
    /// 매처의 `recv()`가 `None`을 반환합니다.
    pub fn close_tail_senders(&mut self) {
        self.tail_data.iter_mut().for_each(TailChannel::close);
    }

    /// 매처용 수신 핸들을 꺼냅니다. 이미 꺼낸 채널은 건너뜁니다.
    ///
    /// 그룹이 송신 핸들을 보관하는 동안 수신 측은 채널 종료를 관찰하지 못합니다.
    /// [`close_tail_senders`](Self::close_tail_senders) 참고.
    pub fn take_tail_receivers(&mut self) -> Vec<mpsc::Receiver<MatchedFields>> {
        self.tail_data
            .iter_mut()
            .filter_map(TailChannel::take_receiver)
            .collect()
    }

    /// 채널 인스턴스와 작업 필드를 제외한 구조적 동등성
    pub fn same_definition(&self, other: &Self) -> bool {
        self.name == other.name
            && self.glob_files == other.glob_files
            && self.pattern() == other.pattern()
            && self.expected_matches == other.expected_matches
            && self.date_position == other.date_position
            && self.date_format == other.date_format
            && self.key_prefix == other.key_prefix
            && self.tags == other.tags
            && self.metrics == other.metrics
            && self.histogram_size == other.histogram_size
            && self.histogram_alpha_decay == other.histogram_alpha_decay
            && self.histogram_rescale_threshold_min == other.histogram_rescale_threshold_min
            && self.ewma_interval == other.ewma_interval
            && self.goroutines == other.goroutines
            && self.workload_split_on == other.workload_split_on
            && self.interval == other.interval
            && self.fail_operation_warn == other.fail_operation_warn
            && self.parse_from_start == other.parse_from_start
            && self.fail_regex_warn == other.fail_regex_warn
            && self.tail_data.len() == other.tail_data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::TAIL_CHANNEL_CAPACITY;

    fn parse(name: &str, yaml: &str) -> Result<LogGroup, LogMetricsError> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        LogGroup::from_mapping(name, value.as_mapping().unwrap())
    }

    #[test]
    fn empty_group_gets_defaults() {
        let group = parse("web", "{}").unwrap();
        assert_eq!(group.goroutines, DEFAULT_GOROUTINES);
        assert_eq!(group.histogram_size, DEFAULT_HISTOGRAM_SIZE);
        assert_eq!(group.histogram_alpha_decay, DEFAULT_HISTOGRAM_ALPHA_DECAY);
        assert_eq!(
            group.histogram_rescale_threshold_min,
            DEFAULT_HISTOGRAM_RESCALE_THRESHOLD_MIN
        );
        assert_eq!(group.tail_data.len(), 1);
        assert!(group.re.is_none());
        assert!(!group.fail_regex_warn);
        assert!(group.last_date.is_none());
        assert!(group.last_date_str.is_empty());
    }

    #[test]
    fn full_group_is_parsed() {
        let group = parse(
            "nginx",
            r#"
files: ["/var/log/nginx/access.log", "/var/log/nginx/*.log"]
re: '^(\S+) \n # client\n (\d+)$'
expected_matches: 2
key_prefix: nginx
interval: 10
ewma_interval: 30
histogram_size: 1028
histogram_alpha_decay: 0.5
histogram_rescale_threshold_min: 30
workload_split_on: 1
goroutines: 3
warn_on_regex_fail: true
parse_from_start: true
warn_on_operation_fail: true
tags: {client: 1}
date: {position: 2, format: "%s"}
"#,
        )
        .unwrap();

        assert_eq!(group.name, "nginx");
        assert_eq!(group.glob_files.len(), 2);
        assert_eq!(group.pattern(), Some("^(\\S+)(\\d+)$"));
        assert_eq!(group.expected_matches, 2);
        assert_eq!(group.key_prefix, "nginx");
        assert_eq!(group.interval, 10);
        assert_eq!(group.ewma_interval, 30);
        assert_eq!(group.histogram_size, 1028);
        assert_eq!(group.histogram_alpha_decay, 0.5);
        assert_eq!(group.histogram_rescale_threshold_min, 30);
        assert_eq!(group.workload_split_on, 1);
        assert_eq!(group.goroutines, 3);
        assert!(group.fail_regex_warn);
        assert!(group.parse_from_start);
        assert!(group.fail_operation_warn);
        assert_eq!(group.tags.get("client"), Some(&1));
        assert_eq!(group.tag_count(), 1);
        assert_eq!(group.date_position, 2);
        assert_eq!(group.date_format, "%s");
    }

    #[test]
    fn channels_match_goroutines() {
        let mut group = parse("web", "goroutines: 4").unwrap();
        assert_eq!(group.tail_data.len(), 4);
        assert!(group.tail_data.iter().all(|c| c.capacity() == TAIL_CHANNEL_CAPACITY));
        assert_eq!(group.tail_senders().len(), 4);
        assert_eq!(group.take_tail_receivers().len(), 4);
        assert!(group.take_tail_receivers().is_empty());
    }

    #[test]
    fn bool_for_int_key_is_rejected() {
        let err = parse("web", "goroutines: true").unwrap_err();
        assert!(matches!(
            err,
            LogMetricsError::TypeMismatch { ref path, expected: "int", found: "bool" } if path == "web.goroutines"
        ));
    }

    #[test]
    fn int_alpha_decay_is_rejected() {
        let err = parse("web", "histogram_alpha_decay: 1").unwrap_err();
        assert!(matches!(err, LogMetricsError::TypeMismatch { expected: "float", .. }));
    }

    #[test]
    fn unknown_group_key_is_rejected() {
        let err = parse("web", "bogus: 1").unwrap_err();
        assert!(matches!(err, LogMetricsError::UnknownKey { ref path } if path == "web.bogus"));
    }

    #[test]
    fn unknown_date_key_is_rejected() {
        let err = parse("web", "date: {position: 1, zone: UTC}").unwrap_err();
        assert!(matches!(err, LogMetricsError::UnknownKey { ref path } if path == "web.date.zone"));
    }

    #[test]
    fn non_int_tag_position_is_rejected() {
        let err = parse("web", "tags: {host: first}").unwrap_err();
        assert!(matches!(err, LogMetricsError::TypeMismatch { ref path, .. } if path == "web.tags.host"));
    }

    #[test]
    fn non_string_file_is_rejected() {
        let err = parse("web", "files: [1]").unwrap_err();
        assert!(matches!(err, LogMetricsError::TypeMismatch { ref path, .. } if path == "web.files[0]"));
    }

    #[test]
    fn negative_goroutines_is_rejected() {
        let err = parse("web", "goroutines: -2").unwrap_err();
        assert!(matches!(err, LogMetricsError::InvalidValue { .. }));
    }

    #[test]
    fn goroutines_above_limit_is_rejected() {
        let err = parse("web", "goroutines: 1000000000000").unwrap_err();
        assert!(matches!(
            err,
            LogMetricsError::InvalidValue { ref path, .. } if path == "web.goroutines"
        ));

        let group = parse("web", &format!("goroutines: {MAX_GOROUTINES}")).unwrap();
        assert_eq!(group.tail_data.len(), MAX_GOROUTINES);
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let err = parse("web", "re: '(unclosed'").unwrap_err();
        assert!(matches!(err, LogMetricsError::Regex { .. }));
    }

    #[test]
    fn tag_positions_may_overlap_metric_positions() {
        let group = parse(
            "web",
            r#"
tags: {status: 1}
metrics:
  counters:
    key_suffix: hits
    data:
      - [1, "status"]
"#,
        )
        .unwrap();
        assert_eq!(group.tags["status"], 1);
        assert!(group.metrics.contains_key(&1));
    }

    #[test]
    fn same_definition_ignores_channels() {
        let a = parse("web", "goroutines: 2\nkey_prefix: w").unwrap();
        let b = parse("web", "goroutines: 2\nkey_prefix: w").unwrap();
        let c = parse("web", "goroutines: 2\nkey_prefix: x").unwrap();
        assert!(a.same_definition(&b));
        assert!(!a.same_definition(&c));
    }
}
