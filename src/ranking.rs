use log::{debug, warn};
use rayon::prelude::*;

use crate::descriptor::{DescriptorSet, Weights};
use crate::similarity::{mismatched_kinds, score};

/// 默认返回的结果数量
pub const DEFAULT_TOP_K: usize = 10;

/// 对整个图库逐一打分，按相似度降序排列后截取前 `top_k` 个
///
/// 这是一次完整的线性扫描，没有任何预筛选。分数相同的图片保持图库中的原有顺序。
pub fn rank<'a, I>(
    query: &DescriptorSet,
    catalog: I,
    weights: &Weights,
    top_k: usize,
) -> Vec<(i64, f32)>
where
    I: IntoIterator<Item = (i64, &'a DescriptorSet)>,
{
    for kind in mismatched_kinds(query, weights) {
        warn!("{kind} 的权重长度与查询描述符不一致，本轮跳过该描述符");
    }

    let candidates = catalog.into_iter().collect::<Vec<_>>();
    let mut results = candidates
        .par_iter()
        .map(|&(id, descriptors)| (id, score(query, descriptors, weights)))
        .collect::<Vec<_>>();
    // 稳定排序，保证同分时的先后顺序
    results.sort_by(|a, b| b.1.total_cmp(&a.1));
    results.truncate(top_k);

    debug!("已对 {} 张图片打分，返回 {} 个结果", candidates.len(), results.len());
    results
}
