//! 多描述符加权相似度
//!
//! 总分是各描述符贡献的直接累加，不做归一化，只用于同一次查询内的相对排序。

use std::slice;

use log::trace;

use crate::descriptor::{Color, DescriptorKind, DescriptorSet, Weights};

type Comparator = fn(&[f32], &[f32]) -> f32;

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// 余弦相似度，任一向量模长为 0 时除数取 1（结果为 0）
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    let norm = l2_norm(a) * l2_norm(b);
    let norm = if norm == 0.0 { 1.0 } else { norm };
    (dot / norm).clamp(-1.0, 1.0)
}

/// 欧氏距离的倒数形式 `1 / (1 + d)`，取值范围 (0, 1]
pub fn inverse_euclidean(a: &[f32], b: &[f32]) -> f32 {
    let distance = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt();
    1.0 / (1.0 + distance)
}

/// 两组主色调两两组合后的平均相似度
///
/// 任一侧为空时返回 0
pub fn compare_dominant_colors(query: &[Color], candidate: &[Color]) -> f32 {
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    let total = query
        .iter()
        .flat_map(|q| candidate.iter().map(move |c| inverse_euclidean(q, c)))
        .sum::<f32>();
    total / (query.len() * candidate.len()) as f32
}

fn comparator(kind: DescriptorKind) -> Comparator {
    match kind {
        DescriptorKind::ColorHistogram => cosine_similarity,
        _ => inverse_euclidean,
    }
}

/// 按分量加权：每个分量单独作为一维向量比较，再乘以对应权重
fn weighted(compare: Comparator, query: &[f32], candidate: &[f32], weights: &[f32]) -> f32 {
    query
        .iter()
        .zip(candidate)
        .zip(weights)
        .map(|((q, c), w)| w * compare(slice::from_ref(q), slice::from_ref(c)))
        .sum()
}

/// 计算查询与候选图片的相似度
///
/// 只有双方都存在的描述符才参与计算。权重长度与查询描述符不一致时跳过该描述符。
pub fn score(query: &DescriptorSet, candidate: &DescriptorSet, weights: &Weights) -> f32 {
    let mut similarity = 0.0;

    if let (Some(q), Some(c)) = (&query.dominant_colors, &candidate.dominant_colors) {
        match &weights.dominant_colors {
            Some(w) if !w.is_empty() && w.len() != q.len() => {
                trace!("dominant_colors 权重数量 {} 与查询颜色数量 {} 不一致", w.len(), q.len());
            }
            // 主色调只做聚合比较，权重不逐分量生效
            _ => similarity += compare_dominant_colors(q, c),
        }
    }

    for kind in DescriptorKind::VECTORS {
        let (Some(q), Some(c)) = (query.vector(kind), candidate.vector(kind)) else {
            continue;
        };
        if q.len() != c.len() {
            trace!("{kind} 长度不一致: {} != {}", q.len(), c.len());
            continue;
        }
        let compare = comparator(kind);
        match weights.vector(kind) {
            Some(w) if w.is_empty() => similarity += compare(q, c),
            Some(w) if w.len() == q.len() => similarity += weighted(compare, q, c, w),
            Some(w) => trace!("{kind} 权重长度 {} 与描述符长度 {} 不一致", w.len(), q.len()),
            None => similarity += compare(q, c),
        }
    }

    similarity
}

/// 返回权重长度与查询描述符不匹配的描述符类型，这些类型在本轮打分中会被跳过
pub fn mismatched_kinds(query: &DescriptorSet, weights: &Weights) -> Vec<DescriptorKind> {
    let mut kinds = vec![];
    if let (Some(q), Some(w)) = (&query.dominant_colors, &weights.dominant_colors) {
        if !w.is_empty() && w.len() != q.len() {
            kinds.push(DescriptorKind::DominantColors);
        }
    }
    for kind in DescriptorKind::VECTORS {
        if let (Some(q), Some(w)) = (query.vector(kind), weights.vector(kind)) {
            if !w.is_empty() && w.len() != q.len() {
                kinds.push(kind);
            }
        }
    }
    kinds
}
