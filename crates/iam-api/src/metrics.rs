//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭과 인증 메트릭을 수집하고 `/metrics` 엔드포인트로 노출합니다.
//! 레코더가 설치되지 않은 상태(테스트 등)에서는 기록 함수가 아무 일도 하지 않습니다.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Prometheus 메트릭 레코더를 전역으로 설치하고 핸들을 반환합니다.
///
/// 레코더가 이미 설치되어 있으면 에러를 반환합니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0],
        )?
        .install_recorder()
}

// ============================================================================
// HTTP 메트릭
// ============================================================================

/// HTTP 응답 카운터 증가.
pub fn record_http_response(method: &str, path: &str, status: u16) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// HTTP 요청 지속 시간 기록.
pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

// ============================================================================
// 인증 메트릭
// ============================================================================

/// 회원가입 성공 카운터.
pub fn record_registration() {
    counter!("iam_registrations_total").increment(1);
}

/// 로그인 시도 결과 카운터 (`success` | `failure`).
pub fn record_login(outcome: &'static str) {
    counter!("iam_logins_total", "outcome" => outcome).increment(1);
}

/// 인증/인가 거부 카운터 (사유 코드별).
pub fn record_auth_rejection(reason: &'static str) {
    counter!("iam_auth_rejections_total", "reason" => reason).increment(1);
}

// ============================================================================
// 경로 정규화
// ============================================================================

/// 라우트 매칭 정보가 없을 때 경로 라벨로 쓸 값을 만듭니다.
///
/// 알 수 없는 경로마다 라벨이 늘어나지 않도록 `/api/users/<name>/...` 형태의
/// 사용자 이름 세그먼트와 숫자 세그먼트를 치환합니다.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = Vec::new();
    let mut previous = "";
    for segment in path.split('/') {
        let is_numeric = !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit());
        if is_numeric {
            normalized.push(":id");
        } else if previous == "users" && !segment.is_empty() {
            normalized.push(":username");
        } else {
            normalized.push(segment);
        }
        previous = segment;
    }
    normalized.join("/")
}
