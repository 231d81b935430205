//! 메트릭 추출 규칙 파싱
//!
//! 로그 그룹의 `metrics` 서브트리를 캡처 그룹 위치 -> [`KeyExtract`] 매핑으로 변환합니다.
//!
//! # YAML 스키마
//! ```yaml
//! metrics:
//!   counters:
//!     key_suffix: requests
//!     format: int        # 선택, 기본값 "int"
//!     multiply: 1        # 선택, 기본값 1
//!     data:
//!       - [3, "requests", {add: [10]}]
//!       - [4, "errors"]
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::error::LogMetricsError;
use crate::value::{self, KeySchema, ValueKind};

/// 기본 값 포맷
pub const DEFAULT_FORMAT: &str = "int";
/// 기본 배율
pub const DEFAULT_MULTIPLY: i64 = 1;

const BLOCK_SCHEMA: KeySchema = &[
    ("key_suffix", ValueKind::Str),
    ("format", ValueKind::Str),
    ("multiply", ValueKind::Int),
    ("data", ValueKind::Seq),
];

/// 추출 값에 적용하는 산술 연산
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Sub,
}

impl Operation {
    /// 연산 이름으로 조회합니다. `add`, `sub`만 허용됩니다.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "add" => Some(Self::Add),
            "sub" => Some(Self::Sub),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 하나의 캡처 그룹 위치에 바인딩된 메트릭 파생 규칙
///
/// 하위 엔진은 캡처 텍스트를 `format`으로 파싱하고 `multiply`를 곱한 뒤
/// `operations`의 피연산자를 문서 순서대로 적용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyExtract {
    /// 출력 메트릭 이름
    pub tag: String,
    /// 규칙이 선언된 블록 이름 (counters, gauges 등)
    pub metric_type: String,
    /// 메트릭 키 접미사
    pub key_suffix: String,
    /// 캡처 텍스트 파싱 형식
    pub format: String,
    /// 파싱 후 배율
    pub multiply: i64,
    /// 연산 -> 피연산자 목록
    pub operations: BTreeMap<Operation, Vec<i64>>,
}

/// `metrics` 매핑을 위치별 추출 규칙으로 변환합니다.
///
/// 서로 다른 블록이 같은 위치를 선언하면 나중 블록이 덮어씁니다.
///
/// # Errors
/// - 블록에 `key_suffix` 또는 `data`가 없으면 `Malformed`
/// - `data` 항목의 원소가 2개 미만이면 `Malformed`
/// - `add`/`sub` 외의 연산 이름이면 `UnsupportedOperation`
/// - 원소 타입이 맞지 않으면 `TypeMismatch`
pub fn parse_metrics(
    metrics: &Mapping,
    path: &str,
) -> Result<BTreeMap<usize, KeyExtract>, LogMetricsError> {
    let mut extracts = BTreeMap::new();

    for (label, block) in metrics {
        let metric_type = value::key_str(label, path)?;
        let block_path = value::join(path, metric_type);
        let block = value::mapping(block, &block_path)?;

        for (key, val) in block {
            let key = value::key_str(key, &block_path)?;
            value::check_key(BLOCK_SCHEMA, key, val, &value::join(&block_path, key))?;
        }

        let key_suffix = match block.get("key_suffix") {
            Some(v) => value::string(v, &value::join(&block_path, "key_suffix"))?,
            None => return Err(missing(&block_path, "key_suffix")),
        };

        let format = match block.get("format") {
            Some(v) => value::string(v, &value::join(&block_path, "format"))?,
            None => DEFAULT_FORMAT.to_owned(),
        };

        let multiply = match block.get("multiply") {
            Some(v) => value::int(v, &value::join(&block_path, "multiply"))?,
            None => DEFAULT_MULTIPLY,
        };

        let data_path = value::join(&block_path, "data");
        let data = match block.get("data") {
            Some(v) => value::seq(v, &data_path)?,
            None => return Err(missing(&block_path, "data")),
        };

        for (idx, entry) in data.iter().enumerate() {
            let entry_path = format!("{data_path}[{idx}]");
            let (position, extract) =
                parse_rule(entry, &entry_path, metric_type, &key_suffix, &format, multiply)?;

            if let Some(previous) = extracts.insert(position, extract) {
                tracing::warn!(
                    path = %entry_path,
                    position,
                    previous = %previous.metric_type,
                    "metrics position redefined, later rule wins"
                );
            }
        }
    }

    Ok(extracts)
}

fn missing(block_path: &str, field: &str) -> LogMetricsError {
    LogMetricsError::Malformed {
        path: block_path.to_owned(),
        reason: format!("missing required field '{field}'"),
    }
}

/// `[position, tag, {op: [operands]}?]` 형태의 규칙 하나를 파싱합니다.
fn parse_rule(
    entry: &Value,
    path: &str,
    metric_type: &str,
    key_suffix: &str,
    format: &str,
    multiply: i64,
) -> Result<(usize, KeyExtract), LogMetricsError> {
    let items = value::seq(entry, path)?;
    if items.len() < 2 {
        return Err(LogMetricsError::Malformed {
            path: path.to_owned(),
            reason: format!(
                "rule needs at least [position, tag], found {} element(s)",
                items.len()
            ),
        });
    }

    let position = value::int(&items[0], &format!("{path}[0]"))?;
    let tag = value::string(&items[1], &format!("{path}[1]"))?;

    let mut operations: BTreeMap<Operation, Vec<i64>> = BTreeMap::new();
    if let Some(ops) = items.get(2) {
        let ops_path = format!("{path}[2]");
        for (name, operands) in value::mapping(ops, &ops_path)? {
            let name = value::key_str(name, &ops_path)?;
            let op = Operation::from_name(name).ok_or_else(|| {
                LogMetricsError::UnsupportedOperation {
                    path: ops_path.clone(),
                    operation: name.to_owned(),
                }
            })?;

            let operand_path = value::join(&ops_path, name);
            let target = operations.entry(op).or_default();
            for (idx, operand) in value::seq(operands, &operand_path)?.iter().enumerate() {
                target.push(value::int(operand, &format!("{operand_path}[{idx}]"))?);
            }
        }
    }

    Ok((
        position,
        KeyExtract {
            tag,
            metric_type: metric_type.to_owned(),
            key_suffix: key_suffix.to_owned(),
            format: format.to_owned(),
            multiply,
            operations,
        },
    ))
}
