//! # camlens-storage
//!
//! 로컬 저장소 어댑터.
//! 추론 요청에 사용된 정규화 프레임을 사진 디렉토리에 JPEG 파일로 남긴다.
//! 저장된 사진은 자동으로 삭제되지 않는다.

pub mod photo_store;
