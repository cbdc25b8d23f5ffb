//! # camlens-vision
//!
//! 카메라 프레임 처리 크레이트.
//! 외부 캡처 프로그램으로 정지 이미지를 얻고,
//! 포맷 스니핑 → 디코딩 → 커버 리사이즈/중앙 크롭 → JPEG 인코딩으로
//! 추론 서비스가 기대하는 고정 크기 프레임을 만든다.

pub mod capture;
pub mod encoder;
pub mod format;
pub mod normalizer;
pub mod resize;
