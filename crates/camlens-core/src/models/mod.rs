//! 도메인 모델.
//!
//! 모든 모델은 serde 직렬화를 지원하거나(구독자 페이로드),
//! 한 번의 실행 안에서만 쓰이는 값 타입이다.

pub mod frame;
pub mod response;
pub mod session;
