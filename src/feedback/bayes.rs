//! 根据相关反馈计算分量权重
//!
//! 对每种描述符的每个分量（主色调为每个颜色的每个通道），分别累加相关与不相关图片上的取值，
//! 以朴素贝叶斯的形式估计该分量属于相关图片的后验概率，作为下一轮打分的权重。
//! 这里的 "似然" 是原始数值的平均值而非概率密度，结果只是一个启发式的 0~1 分数。
//!
//! 分母中的 `max(.., 1)` 下限会在分母小于 1 时改变结果，必须原样保留。

use std::collections::BTreeMap;

use log::debug;

use crate::descriptor::{Color, DescriptorKind, DescriptorSet, Weights};

struct Posterior {
    relevant: f32,
    irrelevant: f32,
}

impl Posterior {
    fn new(relevant: usize, irrelevant: usize) -> Self {
        Self { relevant: relevant as f32, irrelevant: irrelevant as f32 }
    }

    fn weight(&self, relevant_sum: f32, irrelevant_sum: f32) -> f32 {
        let likelihood_relevant = relevant_sum / self.relevant.max(1.0);
        let likelihood_irrelevant = irrelevant_sum / self.irrelevant.max(1.0);

        let total = (self.relevant + self.irrelevant).max(1.0);
        let prior_relevant = self.relevant / total;
        let prior_irrelevant = self.irrelevant / total;

        let joint_relevant = likelihood_relevant * prior_relevant;
        let joint_irrelevant = likelihood_irrelevant * prior_irrelevant;
        joint_relevant / (joint_relevant + joint_irrelevant).max(1.0)
    }
}

/// 按下标累加，长度取所有向量中的最大值
fn component_sums<'a>(vectors: impl Iterator<Item = &'a [f32]>) -> Vec<f32> {
    let mut sums = vec![];
    for vector in vectors {
        if sums.len() < vector.len() {
            sums.resize(vector.len(), 0.0);
        }
        for (sum, value) in sums.iter_mut().zip(vector) {
            *sum += value;
        }
    }
    sums
}

/// 按 (颜色序号, 通道) 累加
fn color_sums<'a>(colors: impl Iterator<Item = &'a [Color]>) -> Vec<Color> {
    let mut sums: Vec<Color> = vec![];
    for list in colors {
        if sums.len() < list.len() {
            sums.resize(list.len(), [0.0; 3]);
        }
        for (sum, color) in sums.iter_mut().zip(list) {
            for (s, v) in sum.iter_mut().zip(color) {
                *s += v;
            }
        }
    }
    sums
}

/// 根据累积的相关/不相关图片计算新的权重
///
/// 两侧都为空时返回空权重。权重只覆盖相关图片中出现过的分量，
/// 相关图片都没有的描述符不会产生权重。
pub fn update_weights(
    relevant: &BTreeMap<i64, DescriptorSet>,
    irrelevant: &BTreeMap<i64, DescriptorSet>,
) -> Weights {
    let mut weights = Weights::default();
    if relevant.is_empty() && irrelevant.is_empty() {
        return weights;
    }

    let posterior = Posterior::new(relevant.len(), irrelevant.len());

    let relevant_colors = color_sums(relevant.values().filter_map(|d| d.dominant_colors.as_deref()));
    let irrelevant_colors =
        color_sums(irrelevant.values().filter_map(|d| d.dominant_colors.as_deref()));
    if !relevant_colors.is_empty() {
        let colors = relevant_colors
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let n = irrelevant_colors.get(i).copied().unwrap_or_default();
                [
                    posterior.weight(r[0], n[0]),
                    posterior.weight(r[1], n[1]),
                    posterior.weight(r[2], n[2]),
                ]
            })
            .collect();
        weights.dominant_colors = Some(colors);
    }

    for kind in DescriptorKind::VECTORS {
        let relevant_sums = component_sums(relevant.values().filter_map(|d| d.vector(kind)));
        if relevant_sums.is_empty() {
            continue;
        }
        let irrelevant_sums = component_sums(irrelevant.values().filter_map(|d| d.vector(kind)));
        let vector = relevant_sums
            .iter()
            .enumerate()
            .map(|(i, &r)| posterior.weight(r, irrelevant_sums.get(i).copied().unwrap_or(0.0)))
            .collect();
        if let Some(slot) = weights.vector_mut(kind) {
            *slot = Some(vector);
        }
    }

    debug!(
        "根据 {} 张相关图片与 {} 张不相关图片更新权重: {:?}",
        relevant.len(),
        irrelevant.len(),
        weights.kinds()
    );
    weights
}
