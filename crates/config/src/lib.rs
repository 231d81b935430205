//! logmetrics 설정 컴파일러
//!
//! 반구조화된 YAML 설정 문서를 검증된 타입 모델로 컴파일합니다.
//! 파일 tail, 라인 매칭, 히스토그램/EWMA 계산, 메트릭 푸시는 이 모델을
//! 소비하는 외부 컴포넌트의 몫입니다.
//!
//! # 모듈 구성
//!
//! - [`loader`]: 설정 파일 읽기 및 YAML 트리 파싱
//! - [`pattern`]: 확장 정규식(공백/주석 허용) 전처리 및 컴파일
//! - [`metrics`]: `metrics` 서브트리 -> 위치별 [`KeyExtract`] 규칙
//! - [`settings`]: 전역 `settings` 섹션
//! - [`group`]: 로그 그룹 정의와 tail 채널 할당
//! - [`config`]: 전체 컴파일 오케스트레이션
//! - [`facility`]: syslog facility 이름 테이블
//! - [`channel`]: 그룹별 bounded tail 채널
//! - [`error`]: 도메인 에러 타입
//!
//! # 흐름
//!
//! ```text
//! DocumentLoader -> Config::compile -> Settings
//!                                   -> LogGroup (per key) -> pattern, metrics, channel
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod facility;
pub mod group;
pub mod loader;
pub mod metrics;
pub mod pattern;
pub mod settings;
pub mod value;

// --- 주요 타입 re-export ---

pub use channel::{MatchedFields, TAIL_CHANNEL_CAPACITY, TailChannel};
pub use config::Config;
pub use error::LogMetricsError;
pub use facility::Facility;
pub use group::LogGroup;
pub use loader::DocumentLoader;
pub use metrics::{KeyExtract, Operation, parse_metrics};
pub use pattern::{clean_extended_regex, compile_extended};
pub use settings::Settings;
