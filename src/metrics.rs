use std::sync::LazyLock;

use prometheus::*;

static METRIC_SEARCH_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "im_cbir_search_count",
        "count of the search rounds",
        &["round"]
    )
    .unwrap()
});

static METRIC_SEARCH_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "im_cbir_search_duration",
        "duration of the full catalog scan in seconds"
    )
    .unwrap()
});

static METRIC_SEARCH_MAX_SCORE: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "im_cbir_search_max_score",
        "max score of the per-query search",
        (1..=16).map(|x| x as f64 * 0.25).collect()
    )
    .unwrap()
});

static METRIC_FEEDBACK_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "im_cbir_feedback_count",
        "count of the relevance feedback submissions",
        &["result"]
    )
    .unwrap()
});

static METRIC_CATALOG_SIZE: LazyLock<IntGauge> = LazyLock::new(|| {
    register_int_gauge!("im_cbir_catalog_size", "number of images scanned by the last search")
        .unwrap()
});

/// 记录一轮搜索，区分新查询与继续上一轮
pub fn inc_search_count(reset: bool) {
    let round = if reset { "new" } else { "continue" };
    METRIC_SEARCH_COUNT.with_label_values(&[round]).inc();
}

pub fn observe_search(duration: f32, catalog_size: usize, max_score: Option<f32>) {
    METRIC_SEARCH_DURATION.observe(duration as f64);
    METRIC_CATALOG_SIZE.set(catalog_size as i64);
    if let Some(score) = max_score {
        METRIC_SEARCH_MAX_SCORE.observe(score as f64);
    }
}

/// 记录一次反馈，`committed` 为权重是否成功写回
pub fn inc_feedback_count(committed: bool) {
    let result = if committed { "committed" } else { "superseded" };
    METRIC_FEEDBACK_COUNT.with_label_values(&[result]).inc();
}
