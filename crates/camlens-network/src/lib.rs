//! # camlens-network
//!
//! 네트워크 어댑터 크레이트.
//! 정규화된 프레임과 프롬프트를 원격 비전-언어 모델 엔드포인트로 보내고
//! 응답 텍스트를 돌려받는다.

pub mod inference_client;
