//! 동적 타입 YAML 트리 접근 헬퍼
//!
//! 설정 문서는 `serde_yaml::Value` 트리로 역직렬화된 뒤 키별로
//! 기대 타입을 확인하며 소비됩니다. 정수와 실수는 YAML 표기 그대로
//! 구분합니다 (`1`은 int, `1.0`은 float).

use serde_yaml::Value;

use crate::error::LogMetricsError;

/// 설정 값의 동적 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    Bool,
    Str,
    Seq,
    Map,
    Null,
    Tagged,
}

impl ValueKind {
    /// 값의 동적 타입을 판별합니다.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Int,
            Value::Number(_) => Self::Float,
            Value::Bool(_) => Self::Bool,
            Value::String(_) => Self::Str,
            Value::Sequence(_) => Self::Seq,
            Value::Mapping(_) => Self::Map,
            Value::Null => Self::Null,
            Value::Tagged(_) => Self::Tagged,
        }
    }

    /// 에러 메시지용 타입 이름
    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Str => "string",
            Self::Seq => "sequence",
            Self::Map => "mapping",
            Self::Null => "null",
            Self::Tagged => "tagged value",
        }
    }
}

/// 키 스키마 한 항목: (키 이름, 기대 타입)
pub type KeySchema = &'static [(&'static str, ValueKind)];

/// 스키마에 따라 키와 값 타입을 확인합니다.
///
/// 스키마에 없는 키는 `UnknownKey`, 타입이 다르면 `TypeMismatch`를 반환합니다.
pub(crate) fn check_key(
    schema: KeySchema,
    key: &str,
    value: &Value,
    path: &str,
) -> Result<(), LogMetricsError> {
    let Some((_, expected)) = schema.iter().find(|(name, _)| *name == key) else {
        return Err(LogMetricsError::UnknownKey {
            path: path.to_owned(),
        });
    };

    let found = ValueKind::of(value);
    if found != *expected {
        return Err(LogMetricsError::TypeMismatch {
            path: path.to_owned(),
            expected: expected.name(),
            found: found.name(),
        });
    }

    Ok(())
}

/// 매핑 키를 문자열로 꺼냅니다.
pub(crate) fn key_str<'a>(key: &'a Value, parent: &str) -> Result<&'a str, LogMetricsError> {
    key.as_str().ok_or_else(|| LogMetricsError::Malformed {
        path: parent.to_owned(),
        reason: format!("mapping key must be a string, found {}", ValueKind::of(key).name()),
    })
}

/// 부모 경로와 키를 연결합니다.
pub(crate) fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_owned()
    } else {
        format!("{parent}.{key}")
    }
}

fn mismatch(value: &Value, path: &str, expected: ValueKind) -> LogMetricsError {
    LogMetricsError::TypeMismatch {
        path: path.to_owned(),
        expected: expected.name(),
        found: ValueKind::of(value).name(),
    }
}

/// 정수 값을 대상 타입으로 변환합니다.
///
/// 음수나 대상 타입 범위를 벗어나는 값은 `InvalidValue`로 거부합니다.
pub(crate) fn int<T>(value: &Value, path: &str) -> Result<T, LogMetricsError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    let Value::Number(n) = value else {
        return Err(mismatch(value, path, ValueKind::Int));
    };

    let converted = if let Some(i) = n.as_i64() {
        <T as TryFrom<i64>>::try_from(i).ok()
    } else if let Some(u) = n.as_u64() {
        <T as TryFrom<u64>>::try_from(u).ok()
    } else {
        return Err(mismatch(value, path, ValueKind::Int));
    };

    converted.ok_or_else(|| LogMetricsError::InvalidValue {
        path: path.to_owned(),
        reason: format!("integer {n} out of range"),
    })
}

/// 실수 값을 꺼냅니다. YAML 정수 표기는 거부합니다.
pub(crate) fn float(value: &Value, path: &str) -> Result<f64, LogMetricsError> {
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .ok_or_else(|| mismatch(value, path, ValueKind::Float)),
        _ => Err(mismatch(value, path, ValueKind::Float)),
    }
}

/// 문자열 값을 꺼냅니다.
pub(crate) fn string(value: &Value, path: &str) -> Result<String, LogMetricsError> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| mismatch(value, path, ValueKind::Str))
}

/// 불리언 값을 꺼냅니다.
pub(crate) fn boolean(value: &Value, path: &str) -> Result<bool, LogMetricsError> {
    value
        .as_bool()
        .ok_or_else(|| mismatch(value, path, ValueKind::Bool))
}

/// 시퀀스 값을 꺼냅니다.
pub(crate) fn seq<'a>(value: &'a Value, path: &str) -> Result<&'a [Value], LogMetricsError> {
    value
        .as_sequence()
        .map(Vec::as_slice)
        .ok_or_else(|| mismatch(value, path, ValueKind::Seq))
}

/// 매핑 값을 꺼냅니다.
pub(crate) fn mapping<'a>(
    value: &'a Value,
    path: &str,
) -> Result<&'a serde_yaml::Mapping, LogMetricsError> {
    value
        .as_mapping()
        .ok_or_else(|| mismatch(value, path, ValueKind::Map))
}
