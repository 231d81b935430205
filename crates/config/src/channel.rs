//! 로그 그룹별 tail 채널
//!
//! 컴파일러는 그룹마다 `goroutines` 개수만큼 bounded 채널을 미리 할당합니다.
//! 송신(tail 워커)과 수신(매처)은 외부 컴포넌트의 몫이며,
//! 이 모듈은 채널 생성과 양 끝점 전달만 담당합니다.

use tokio::sync::mpsc;

/// tail 채널당 버퍼 용량
pub const TAIL_CHANNEL_CAPACITY: usize = 1000;

/// 정규식에 매칭된 한 라인의 캡처 필드 목록
pub type MatchedFields = Vec<String>;

/// 하나의 tail 워커/매처 쌍이 공유하는 bounded 채널
///
/// 채널은 자신의 송신 핸들 하나를 보관합니다. 보관 중인 송신 핸들이 살아 있는 동안
/// 수신 측 `recv()`는 `None`을 반환하지 않으므로, 워커에 핸들을 모두 나눠준 뒤
/// [`TailChannel::close`]로 보관 핸들을 해제해야 워커 종료가 수신 측에 전파됩니다.
#[derive(Debug)]
pub struct TailChannel {
    capacity: usize,
    sender: Option<mpsc::Sender<MatchedFields>>,
    receiver: Option<mpsc::Receiver<MatchedFields>>,
}

impl TailChannel {
    /// 지정된 용량으로 채널을 생성합니다.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            capacity,
            sender: Some(sender),
            receiver: Some(receiver),
        }
    }

    /// 송신 핸들을 복제합니다. [`close`](Self::close) 이후에는 `None`입니다.
    pub fn sender(&self) -> Option<mpsc::Sender<MatchedFields>> {
        self.sender.clone()
    }

    /// 보관 중인 송신 핸들을 해제합니다.
    ///
    /// 이미 복제된 핸들은 영향을 받지 않습니다. 마지막 복제본이 drop되면
    /// 수신 측 `recv()`가 `None`을 반환합니다.
    pub fn close(&mut self) {
        self.sender = None;
    }

    /// 보관 중인 송신 핸들이 해제되었는지 여부
    pub fn is_closed(&self) -> bool {
        self.sender.is_none()
    }

    /// 수신 핸들을 꺼냅니다. 두 번째 호출부터는 `None`을 반환합니다.
    pub fn take_receiver(&mut self) -> Option<mpsc::Receiver<MatchedFields>> {
        self.receiver.take()
    }

    /// 채널의 최대 용량
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for TailChannel {
    fn default() -> Self {
        Self::new(TAIL_CHANNEL_CAPACITY)
    }
}

/// `count`개의 tail 채널을 순서대로 할당합니다.
pub fn allocate(count: usize) -> Vec<TailChannel> {
    (0..count).map(|_| TailChannel::default()).collect()
}
