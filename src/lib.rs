//! 바이오매스 혼소 발전소의 출력별 공헌이익을 계산하고 감발/정지 기준 SMP 를 찾는다.
//! 핵심 계산 로직을 라이브러리로 분리하여 CLI 외의 화면에서도 그대로 쓸 수 있게 한다.

pub mod analysis;
pub mod app;
pub mod chart;
pub mod config;
pub mod conversion;
pub mod curtailment;
pub mod formula;
pub mod i18n;
pub mod interpolation;
pub mod model;
pub mod quantity;
pub mod threshold;
pub mod ui_cli;
